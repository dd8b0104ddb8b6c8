//! Backtracking stepper.
//!
//! Search state lives in an explicit stack of frames instead of the native
//! call stack. Each frame holds the snapshot it was opened for, the
//! candidates still to try there, and the normal forms found beneath it.
//! One call to [`step`] does one unit of work: try one candidate, or pop
//! one exhausted frame and hand its results to the frame below.

use crate::error::EngineError;
use crate::metrics::StepMetrics;
use crate::program::ProgramResult;
use crate::scheduler::{spawn_pending, RuleState};
use crate::term::TermStore;
use crate::trace::{debug, debug_span, trace};
use crate::unify::{resolve, OccursCheck, UnifyFailure};
use std::collections::VecDeque;

/// One backtracking frame.
#[derive(Debug, Clone)]
pub struct CycleState {
    /// The snapshot whose candidates this frame explores.
    pub current: ProgramResult,
    /// Candidates not yet tried, in search order.
    pub pending: VecDeque<RuleState>,
    /// Normal forms found at or below this frame.
    pub complete: Vec<ProgramResult>,
    /// Candidates at this frame that unified. Zero at exhaustion means
    /// `current` is itself a normal form.
    pub rewrites: usize,
}

impl CycleState {
    pub fn new(current: ProgramResult, pending: Vec<RuleState>) -> Self {
        Self {
            current,
            pending: pending.into(),
            complete: Vec::new(),
            rewrites: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }
}

/// The whole execution: the frame stack plus every result folded out of it.
#[derive(Debug, Clone, Default)]
pub struct ProgramState {
    pub cycles: Vec<CycleState>,
    pub results: Vec<ProgramResult>,
}

impl ProgramState {
    /// Start an execution from its bottom frame.
    pub fn new(root: CycleState) -> Self {
        Self {
            cycles: vec![root],
            results: Vec::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Current depth of the frame stack.
    pub fn depth(&self) -> usize {
        self.cycles.len()
    }

    /// Stop exploring: drop every untried candidate and fold the results
    /// already held by frames down into `results`, top frame first.
    /// Snapshots of frames that were never finished are not results.
    pub fn abandon(&mut self) {
        while let Some(mut frame) = self.cycles.pop() {
            match self.cycles.last_mut() {
                Some(parent) => parent.complete.append(&mut frame.complete),
                None => self.results.append(&mut frame.complete),
            }
        }
    }
}

/// What one stepper invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The stack was already empty.
    Done,
    /// An exhausted frame was popped, handing `results` normal forms to
    /// the frame below (or to the final results).
    Folded { results: usize },
    /// A candidate fired and its rewrite opened a new frame.
    Pushed,
    /// A candidate fired and its rewrite is already a normal form.
    Recorded,
    /// A candidate failed to unify and was dropped.
    Discarded(UnifyFailure),
}

/// Context for stepping: the term store and per-run settings.
pub struct StepCtx<'a> {
    pub terms: &'a TermStore,
    pub occurs_check: OccursCheck,
    pub metrics: &'a mut StepMetrics,
}

/// Execute one unit of work.
pub fn step(state: &mut ProgramState, ctx: &mut StepCtx<'_>) -> Result<StepOutcome, EngineError> {
    if state.is_done() {
        return Ok(StepOutcome::Done);
    }

    ctx.metrics.record_step();
    let _span = debug_span!("step", depth = state.cycles.len()).entered();

    let top = match state.cycles.last_mut() {
        Some(top) => top,
        None => return Ok(StepOutcome::Done),
    };

    let candidate = match top.pending.pop_front() {
        Some(candidate) => candidate,
        None => return Ok(fold(state, ctx)),
    };

    match attempt(candidate, top, ctx)? {
        Attempt::Discarded(failure) => Ok(StepOutcome::Discarded(failure)),
        Attempt::Recorded => Ok(StepOutcome::Recorded),
        Attempt::Spawned(frame) => {
            state.cycles.push(frame);
            ctx.metrics.record_push(state.cycles.len());
            debug!(depth = state.cycles.len(), "frame_pushed");
            Ok(StepOutcome::Pushed)
        }
    }
}

/// Pop the exhausted top frame and propagate its results downward.
fn fold(state: &mut ProgramState, ctx: &mut StepCtx<'_>) -> StepOutcome {
    let CycleState {
        current,
        mut complete,
        rewrites,
        ..
    } = match state.cycles.pop() {
        Some(frame) => frame,
        None => return StepOutcome::Done,
    };
    ctx.metrics.record_pop();

    if rewrites == 0 {
        trace!(path_len = current.path.len(), "normal_form");
        ctx.metrics.record_result();
        complete.push(current);
    }

    let results = complete.len();
    match state.cycles.last_mut() {
        Some(parent) => parent.complete.append(&mut complete),
        None => state.results.append(&mut complete),
    }

    debug!(depth = state.cycles.len(), results, "frame_popped");
    StepOutcome::Folded { results }
}

enum Attempt {
    Discarded(UnifyFailure),
    Recorded,
    Spawned(CycleState),
}

/// Resolve one candidate against the frame it came from.
fn attempt(
    candidate: RuleState,
    frame: &mut CycleState,
    ctx: &mut StepCtx<'_>,
) -> Result<Attempt, EngineError> {
    let RuleState {
        env,
        unifiers,
        rule_index,
        position,
        var_offset,
    } = candidate;

    let rules = &frame.current.program.rules;
    let rule = *rules
        .get(rule_index)
        .ok_or(EngineError::RuleIndexOutOfRange {
            index: rule_index,
            len: rules.len(),
        })?;

    let env = match resolve(unifiers, env, ctx.terms, ctx.occurs_check) {
        Ok(env) => env,
        Err(UnifyFailure::UnknownTerm(id)) => return Err(EngineError::UnknownTerm(id)),
        Err(failure) => {
            trace!(rule = rule_index, reason = %failure, "candidate_discarded");
            ctx.metrics.record_unification_failure();
            return Ok(Attempt::Discarded(failure));
        }
    };
    ctx.metrics.record_unification();

    let bottom = ctx
        .terms
        .shift_vars(rule.bottom, var_offset)
        .ok_or(EngineError::VariableOverflow {
            term: rule.bottom,
            offset: var_offset,
        })?;
    let replacement = env
        .apply(bottom, ctx.terms)
        .ok_or(EngineError::UnknownTerm(bottom))?;
    let root = frame.current.value();
    let rewritten = ctx
        .terms
        .replace_at(root, &position, replacement)
        .ok_or(EngineError::InvalidPosition {
            value: root,
            position,
        })?;
    // Bindings of the value's own variables hold for the rest of the
    // derivation, not just inside the matched sub-term.
    let value = env
        .apply(rewritten, ctx.terms)
        .ok_or(EngineError::UnknownTerm(rewritten))?;

    let next = frame.current.extend(rule_index, value);
    frame.rewrites += 1;

    let pending = spawn_pending(&next.program, ctx.terms)?;
    ctx.metrics.record_spawned(pending.len());

    if pending.is_empty() {
        trace!(path_len = next.path.len(), "normal_form");
        ctx.metrics.record_result();
        frame.complete.push(next);
        Ok(Attempt::Recorded)
    } else {
        Ok(Attempt::Spawned(CycleState::new(next, pending)))
    }
}
