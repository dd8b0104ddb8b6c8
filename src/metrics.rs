//! Counters collected while stepping a program.
//!
//! The stepper is single-threaded, so these are plain integers updated in
//! place; a snapshot is returned with every run.
//!
//! # Usage
//!
//! ```rust,ignore
//! let outcome = rwvm::engine::run(program, &terms, EngineConfig::default())?;
//! println!("{}", outcome.metrics);
//! ```

use std::fmt;

/// Aggregate metrics for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Stepper invocations that did work
    pub steps: u64,
    /// Candidate rule applications enumerated by the scheduler
    pub candidates_spawned: u64,
    /// Candidates whose obligations all unified
    pub unifications: u64,
    /// Candidates discarded on a unification failure
    pub unification_failures: u64,
    /// Frames pushed onto the backtracking stack
    pub frames_pushed: u64,
    /// Frames popped after exhaustion
    pub frames_popped: u64,
    /// Deepest backtracking stack observed
    pub max_depth: u64,
    /// Normal forms recorded
    pub results_recorded: u64,
}

impl StepMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_step(&mut self) {
        self.steps += 1;
    }

    #[inline]
    pub fn record_spawned(&mut self, count: usize) {
        self.candidates_spawned += count as u64;
    }

    #[inline]
    pub fn record_unification(&mut self) {
        self.unifications += 1;
    }

    #[inline]
    pub fn record_unification_failure(&mut self) {
        self.unification_failures += 1;
    }

    /// Record a frame push, given the stack depth after the push.
    #[inline]
    pub fn record_push(&mut self, depth: usize) {
        self.frames_pushed += 1;
        self.max_depth = self.max_depth.max(depth as u64);
    }

    #[inline]
    pub fn record_pop(&mut self) {
        self.frames_popped += 1;
    }

    #[inline]
    pub fn record_result(&mut self) {
        self.results_recorded += 1;
    }

    /// Fraction of attempted candidates that unified.
    pub fn unification_success_rate(&self) -> f64 {
        let total = self.unifications + self.unification_failures;
        if total == 0 {
            1.0
        } else {
            self.unifications as f64 / total as f64
        }
    }
}

impl fmt::Display for StepMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Run Metrics ===")?;
        writeln!(f, "Steps:              {}", self.steps)?;
        writeln!(f, "Candidates:         {}", self.candidates_spawned)?;
        writeln!(
            f,
            "Unifications:       {} ({} failures, {:.1}% success)",
            self.unifications,
            self.unification_failures,
            self.unification_success_rate() * 100.0
        )?;
        writeln!(
            f,
            "Frames:             {} pushes, {} pops, max depth {}",
            self.frames_pushed, self.frames_popped, self.max_depth
        )?;
        writeln!(f, "Results:            {}", self.results_recorded)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
