use crate::program::Program;
use crate::rule::{Rule, RuleSet};
use crate::term::{TermId, TermStore};
use std::sync::Arc;

pub(crate) fn setup() -> TermStore {
    TermStore::new()
}

/// Rule whose single pattern is the atom `from`, rewriting to the atom `to`.
pub(crate) fn atom_rule(from: u8, to: u8, terms: &TermStore) -> Rule {
    Rule::new(terms.seq([terms.atom(from)]), terms.atom(to))
}

pub(crate) fn program(rules: Vec<Rule>, value: TermId) -> Program {
    Program::new(Arc::new(RuleSet::from_rules(rules)), value)
}
