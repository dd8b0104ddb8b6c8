use crate::term::{Term, TermId, TermStore};
use hashbrown::HashMap;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::hash::BuildHasherDefault;

type BindingMap = HashMap<u32, TermId, BuildHasherDefault<FxHasher>>;

/// Variable bindings for one candidate derivation.
///
/// Sparse storage keyed by variable id, so any id in the `u32` range costs
/// one entry. Bindings are single-assignment: once a variable is bound the
/// unifier only ever checks new terms against the existing binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    bindings: BindingMap,
}

impl Env {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self {
            bindings: BindingMap::default(),
        }
    }

    /// Create an environment with room for n bindings.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            bindings: BindingMap::with_capacity_and_hasher(n, Default::default()),
        }
    }

    /// Bind an unbound variable to a term.
    pub fn bind(&mut self, var: u32, term: TermId) {
        let previous = self.bindings.insert(var, term);
        debug_assert!(previous.is_none(), "rebinding ${}", var);
    }

    /// Get the binding for a variable, if any.
    pub fn get(&self, var: u32) -> Option<TermId> {
        self.bindings.get(&var).copied()
    }

    pub fn is_bound(&self, var: u32) -> bool {
        self.bindings.contains_key(&var)
    }

    /// True if no variable is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// (var, term) pairs for bound variables, in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, TermId)> + '_ {
        let mut pairs: Vec<(u32, TermId)> =
            self.bindings.iter().map(|(&var, &tid)| (var, tid)).collect();
        pairs.sort_unstable_by_key(|&(var, _)| var);
        pairs.into_iter()
    }

    /// Follow variable bindings from `term` until reaching an unbound
    /// variable or a non-variable term.
    pub fn deref(&self, term: TermId, terms: &TermStore) -> TermId {
        let mut current = term;
        let mut visited: SmallVec<[u32; 8]> = SmallVec::new();
        while let Some(idx) = terms.is_var(current) {
            if visited.contains(&idx) {
                return current;
            }
            visited.push(idx);
            match self.get(idx) {
                Some(bound) => current = bound,
                None => return current,
            }
        }
        current
    }

    /// Substitute bindings into `term`, returning the instantiated term.
    /// Unbound variables are left in place, as is any variable whose
    /// binding would expand into itself (only possible when unification
    /// skipped the occurs-check). Returns None if `term` mentions an id
    /// the store does not know.
    ///
    /// Uses an explicit stack to avoid recursion.
    pub fn apply(&self, term: TermId, terms: &TermStore) -> Option<TermId> {
        if self.is_empty() {
            terms.resolve(term)?;
            return Some(term);
        }

        let mut work: Vec<Visit> = vec![Visit::Term(term)];
        let mut out: Vec<TermId> = Vec::new();
        // Variables whose bindings are currently being expanded.
        let mut active: SmallVec<[u32; 8]> = SmallVec::new();

        while let Some(item) = work.pop() {
            let tid = match item {
                Visit::Build(arity) => {
                    let kids: SmallVec<[TermId; 4]> = out.drain(out.len() - arity..).collect();
                    out.push(terms.seq(kids));
                    continue;
                }
                Visit::Release(mark) => {
                    active.truncate(mark);
                    continue;
                }
                Visit::Term(tid) => tid,
            };

            let mut chain: SmallVec<[u32; 4]> = SmallVec::new();
            let mut current = tid;
            while let Some(idx) = terms.is_var(current) {
                if chain.contains(&idx) {
                    break;
                }
                chain.push(idx);
                match self.get(idx) {
                    Some(bound) => current = bound,
                    None => break,
                }
            }

            match terms.resolve(current)? {
                Term::Atom(_) | Term::Var(_) => out.push(current),
                Term::Seq(children) if children.is_empty() => out.push(current),
                Term::Seq(_) if chain.iter().any(|v| active.contains(v)) => out.push(tid),
                Term::Seq(children) => {
                    if !chain.is_empty() {
                        work.push(Visit::Release(active.len()));
                        active.extend(chain);
                    }
                    work.push(Visit::Build(children.len()));
                    for child in children.iter().rev() {
                        work.push(Visit::Term(*child));
                    }
                }
            }
        }

        out.pop()
    }
}

enum Visit {
    Term(TermId),
    /// Collect the last `n` outputs into a sequence.
    Build(usize),
    /// Stop treating bindings above this mark as in-progress.
    Release(usize),
}
