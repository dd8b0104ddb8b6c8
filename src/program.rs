//! Programs, derivation paths and the results a run produces.

use crate::rule::{RuleIndex, RuleSet};
use crate::term::{format_term, TermId, TermStore};
use smallvec::SmallVec;
use std::sync::Arc;

/// Rule indices applied, in order, along one derivation.
pub type Path = SmallVec<[RuleIndex; 8]>;

/// A rule set plus the term currently being rewritten.
///
/// The rule set is shared by every program derived from this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub rules: Arc<RuleSet>,
    pub value: TermId,
}

impl Program {
    pub fn new(rules: Arc<RuleSet>, value: TermId) -> Self {
        Self { rules, value }
    }

    /// A program over the same rules with a different value.
    pub fn with_value(&self, value: TermId) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            value,
        }
    }
}

/// A program snapshot plus the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramResult {
    pub program: Program,
    pub path: Path,
}

impl ProgramResult {
    /// The starting point of a run: no rules applied yet.
    pub fn initial(program: Program) -> Self {
        Self {
            program,
            path: Path::new(),
        }
    }

    /// The result of applying rule `rule_index` to this snapshot,
    /// yielding `value`.
    pub fn extend(&self, rule_index: RuleIndex, value: TermId) -> Self {
        let mut path = self.path.clone();
        path.push(rule_index);
        Self {
            program: self.program.with_value(value),
            path,
        }
    }

    pub fn value(&self) -> TermId {
        self.program.value
    }

    /// Render as `value via [i, j, ...]`.
    pub fn format(&self, terms: &TermStore) -> Result<String, String> {
        let value = format_term(self.value(), terms)?;
        Ok(format!("{} via {:?}", value, self.path.as_slice()))
    }
}
