pub mod engine;
pub mod env;
pub mod error;
pub mod metrics;
pub mod program;
pub mod rule;
pub mod scheduler;
pub mod stepper;
pub mod term;
pub mod trace;
pub mod unify;

#[cfg(test)]
pub(crate) mod test_utils;
