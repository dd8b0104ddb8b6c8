//! Engine - Top-level driver for rewriting programs.
//!
//! The Engine runs a program by:
//! 1. Seeding a bottom frame with every candidate for the starting value
//! 2. Invoking the stepper until the frame stack is empty
//! 3. Returning every normal form found, in discovery order
//!
//! An optional step budget bounds the number of stepper invocations. When it
//! runs out the engine stops and reports the partial results instead of
//! looping forever on a non-terminating rule set.

use crate::error::EngineError;
use crate::metrics::StepMetrics;
use crate::program::{Program, ProgramResult};
use crate::scheduler::spawn_pending;
use crate::stepper::{step, CycleState, ProgramState, StepCtx, StepOutcome};
use crate::term::TermStore;
use crate::trace::{info, info_span, warn};
use crate::unify::OccursCheck;

/// Per-run settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of stepper invocations; `None` runs to exhaustion.
    pub step_budget: Option<u64>,
    /// Occurs-check policy used by the unifier.
    pub occurs_check: OccursCheck,
}

impl EngineConfig {
    pub fn with_step_budget(mut self, budget: u64) -> Self {
        self.step_budget = Some(budget);
        self
    }

    pub fn with_occurs_check(mut self, occurs_check: OccursCheck) -> Self {
        self.occurs_check = occurs_check;
        self
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every derivation was explored.
    Completed,
    /// The step budget ran out after `steps` invocations.
    BudgetExhausted { steps: u64 },
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Normal forms in discovery order. Partial if the budget ran out.
    pub results: Vec<ProgramResult>,
    pub status: RunStatus,
    pub metrics: StepMetrics,
}

impl RunOutcome {
    /// True if the step budget cut the run short.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.status, RunStatus::BudgetExhausted { .. })
    }
}

/// Step-wise evaluation engine for one program.
///
/// Callers may drive it themselves with [`Engine::step`] or let
/// [`Engine::run_to_completion`] loop until done or out of budget.
pub struct Engine<'t> {
    state: ProgramState,
    terms: &'t TermStore,
    config: EngineConfig,
    metrics: StepMetrics,
    /// Stepper invocations that did work.
    steps: u64,
}

impl<'t> Engine<'t> {
    /// Create an engine with its bottom frame seeded from `program`.
    pub fn new(
        program: Program,
        terms: &'t TermStore,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let mut metrics = StepMetrics::new();
        let pending = spawn_pending(&program, terms)?;
        metrics.record_spawned(pending.len());
        metrics.record_push(1);

        let root = CycleState::new(ProgramResult::initial(program), pending);
        Ok(Self {
            state: ProgramState::new(root),
            terms,
            config,
            metrics,
            steps: 0,
        })
    }

    /// Take a single step. Does nothing once the engine is done.
    pub fn step(&mut self) -> Result<StepOutcome, EngineError> {
        let mut ctx = StepCtx {
            terms: self.terms,
            occurs_check: self.config.occurs_check,
            metrics: &mut self.metrics,
        };
        let outcome = step(&mut self.state, &mut ctx)?;
        if outcome != StepOutcome::Done {
            self.steps += 1;
        }
        Ok(outcome)
    }

    /// Check if every derivation has been explored.
    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    /// Number of stepper invocations so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// True once the configured budget has been spent.
    pub fn budget_spent(&self) -> bool {
        self.config
            .step_budget
            .is_some_and(|budget| self.steps >= budget)
    }

    /// Results folded out of the frame stack so far.
    pub fn results(&self) -> &[ProgramResult] {
        &self.state.results
    }

    pub fn metrics(&self) -> &StepMetrics {
        &self.metrics
    }

    pub fn terms(&self) -> &'t TermStore {
        self.terms
    }

    /// Step until done or out of budget.
    ///
    /// On budget exhaustion the remaining frames are abandoned: normal forms
    /// they already hold join the results, untried candidates are dropped.
    pub fn run_to_completion(&mut self) -> Result<RunStatus, EngineError> {
        let _span = info_span!("run", budget = ?self.config.step_budget).entered();

        loop {
            if self.is_done() {
                info!(
                    steps = self.steps,
                    results = self.state.results.len(),
                    "run_completed"
                );
                return Ok(RunStatus::Completed);
            }
            if self.budget_spent() {
                self.state.abandon();
                warn!(
                    steps = self.steps,
                    results = self.state.results.len(),
                    "step_budget_exhausted"
                );
                return Ok(RunStatus::BudgetExhausted { steps: self.steps });
            }
            self.step()?;
        }
    }

    /// Consume the engine, packaging its results with `status`.
    pub fn into_outcome(self, status: RunStatus) -> RunOutcome {
        RunOutcome {
            results: self.state.results,
            status,
            metrics: self.metrics,
        }
    }
}

/// Convenience function to run a program and collect every normal form.
pub fn run(
    program: Program,
    terms: &TermStore,
    config: EngineConfig,
) -> Result<RunOutcome, EngineError> {
    let mut engine = Engine::new(program, terms, config)?;
    let status = engine.run_to_completion()?;
    Ok(engine.into_outcome(status))
}
