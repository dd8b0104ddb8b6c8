//! Errors that abort a run.
//!
//! Unification failures are ordinary search outcomes and never appear here;
//! everything in [`EngineError`] means the engine was handed inconsistent
//! data (terms from another store, a rule index past the end of the rule
//! set) and continuing could silently produce wrong results.

use crate::rule::RuleIndex;
use crate::term::{Position, TermId};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A candidate refers to a rule the program does not have.
    RuleIndexOutOfRange { index: RuleIndex, len: usize },
    /// A term id the term store does not know.
    UnknownTerm(TermId),
    /// A candidate's position does not address a sub-term of the value.
    InvalidPosition { value: TermId, position: Position },
    /// Renaming rule variables apart would overflow the variable id space.
    VariableOverflow { term: TermId, offset: u32 },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::RuleIndexOutOfRange { index, len } => {
                write!(f, "rule index {} out of range ({} rules)", index, len)
            }
            EngineError::UnknownTerm(id) => write!(f, "unknown term id {}", id.raw()),
            EngineError::InvalidPosition { value, position } => write!(
                f,
                "position {:?} is not inside term {}",
                position.as_slice(),
                value.raw()
            ),
            EngineError::VariableOverflow { term, offset } => write!(
                f,
                "renaming variables of term {} by {} overflows",
                term.raw(),
                offset
            ),
        }
    }
}

impl std::error::Error for EngineError {}
