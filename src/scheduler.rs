//! Candidate enumeration.
//!
//! [`spawn_pending`] lists every way a rule could fire somewhere inside a
//! program's value. The order it produces is the engine's search order:
//! sub-terms in pre-order (root first, children left to right), then rules
//! in declaration order, then each rule's pattern alternatives in order.

use crate::env::Env;
use crate::error::EngineError;
use crate::program::Program;
use crate::rule::RuleIndex;
use crate::term::{Position, TermId, TermStore};
use crate::trace::trace;
use crate::unify::UnifyState;
use smallvec::{smallvec, SmallVec};

/// A single in-progress candidate rule application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleState {
    /// Bindings discovered so far; owned by this candidate alone.
    pub env: Env,
    /// Obligations still to discharge, in order.
    pub unifiers: SmallVec<[UnifyState; 2]>,
    pub rule_index: RuleIndex,
    /// Where in the program value the matched sub-term sits.
    pub position: Position,
    /// Amount the rule's variables were shifted by to keep them apart from
    /// the variables of the value. The rule's `bottom` must be shifted by
    /// the same amount before instantiation.
    pub var_offset: u32,
}

/// Enumerate every candidate rule application for `program`.
///
/// The program is not modified; each visited sub-term is matched as an
/// independent child program over the same rules.
pub fn spawn_pending(program: &Program, terms: &TermStore) -> Result<Vec<RuleState>, EngineError> {
    terms
        .resolve(program.value)
        .ok_or(EngineError::UnknownTerm(program.value))?;

    let var_offset = match terms.max_var(program.value) {
        Some(max) => max
            .checked_add(1)
            .ok_or(EngineError::VariableOverflow {
                term: program.value,
                offset: max,
            })?,
        None => 0,
    };

    // Alternatives are the same for every sub-term; rename them once.
    let mut alternatives: Vec<(RuleIndex, TermId)> = Vec::new();
    for (index, rule) in program.rules.iter() {
        let alts = rule
            .alternatives(terms)
            .ok_or(EngineError::UnknownTerm(rule.top))?;
        for alt in alts {
            let renamed = terms
                .shift_vars(alt, var_offset)
                .ok_or(EngineError::VariableOverflow {
                    term: alt,
                    offset: var_offset,
                })?;
            alternatives.push((index, renamed));
        }
    }

    let mut pending = Vec::new();
    if alternatives.is_empty() {
        return Ok(pending);
    }

    let mut stack: Vec<(Program, Position)> = vec![(program.clone(), Position::new())];
    while let Some((child, position)) = stack.pop() {
        for &(rule_index, pattern) in &alternatives {
            pending.push(RuleState {
                env: Env::new(),
                unifiers: smallvec![UnifyState::new(pattern, child.value)],
                rule_index,
                position: position.clone(),
                var_offset,
            });
        }

        if let Some(elements) = terms.children(child.value) {
            // Reverse so the leftmost element is visited next.
            for (i, element) in elements.iter().enumerate().rev() {
                let mut child_position = position.clone();
                child_position.push(i as u32);
                stack.push((child.with_value(*element), child_position));
            }
        } else if terms.resolve(child.value).is_none() {
            return Err(EngineError::UnknownTerm(child.value));
        }
    }

    trace!(candidates = pending.len(), "spawn_pending");
    Ok(pending)
}
