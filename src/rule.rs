//! Rewrite rules and the rule set they live in.

use crate::term::{Term, TermId, TermStore};
use smallvec::{smallvec, SmallVec};

/// Index of a rule within its [`RuleSet`], in declaration order.
pub type RuleIndex = usize;

/// One rewrite step: a term matching `top` is replaced by `bottom`,
/// instantiated with the bindings found while matching.
///
/// A `top` that is a sequence is a set of alternative patterns, one per
/// element; any other `top` is a single pattern. To match a compound term,
/// wrap the pattern: `top = ((f $0))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rule {
    pub top: TermId,
    pub bottom: TermId,
}

impl Rule {
    pub fn new(top: TermId, bottom: TermId) -> Self {
        Self { top, bottom }
    }

    /// Build a rule from its list of alternative patterns.
    pub fn with_alternatives<I>(patterns: I, bottom: TermId, terms: &TermStore) -> Self
    where
        I: IntoIterator<Item = TermId>,
    {
        Self::new(terms.seq(patterns), bottom)
    }

    /// The patterns tried against a candidate term, in order.
    /// Returns None if `top` is not a known term.
    pub fn alternatives(&self, terms: &TermStore) -> Option<SmallVec<[TermId; 4]>> {
        match terms.resolve(self.top)? {
            Term::Seq(patterns) => Some(patterns),
            Term::Atom(_) | Term::Var(_) => Some(smallvec![self.top]),
        }
    }
}

/// Immutable-after-construction storage for rules (RuleIndex -> Rule).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create a new empty rule set.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Add a rule and return its index.
    pub fn add(&mut self, rule: Rule) -> RuleIndex {
        let index = self.rules.len();
        self.rules.push(rule);
        index
    }

    /// Get a rule by its index.
    pub fn get(&self, index: RuleIndex) -> Option<&Rule> {
        self.rules.get(index)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RuleIndex, &Rule)> + '_ {
        self.rules.iter().enumerate()
    }

    /// Total number of pattern alternatives across all rules.
    pub fn alternative_count(&self, terms: &TermStore) -> Option<usize> {
        self.rules
            .iter()
            .map(|rule| rule.alternatives(terms).map(|alts| alts.len()))
            .sum()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::from_rules(iter.into_iter().collect())
    }
}
