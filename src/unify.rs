use crate::env::Env;
use crate::term::{Term, TermId, TermStore};
use crate::trace::{debug_span, trace};
use hashbrown::HashSet;
use smallvec::SmallVec;
use std::fmt;

/// Whether binding a variable to a term that contains it is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OccursCheck {
    /// Reject such bindings; unification only ever builds finite terms.
    #[default]
    Enforce,
    /// Accept such bindings. Substitution leaves the self-referential
    /// variable unexpanded.
    Skip,
}

/// One outstanding unification obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnifyState {
    pub lhs: TermId,
    pub rhs: TermId,
}

impl UnifyState {
    pub fn new(lhs: TermId, rhs: TermId) -> Self {
        Self { lhs, rhs }
    }
}

/// Why two terms failed to unify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnifyFailure {
    /// Two atoms with different bytes.
    AtomMismatch { lhs: u8, rhs: u8 },
    /// Two sequences of different length.
    ArityMismatch { lhs: usize, rhs: usize },
    /// An atom against a sequence.
    ShapeMismatch { lhs: TermId, rhs: TermId },
    /// Binding the variable would create an infinite term.
    OccursCheck { var: u32 },
    /// A term id the store does not know. Not a matching failure: it means
    /// the caller built its terms against a different store.
    UnknownTerm(TermId),
}

impl UnifyFailure {
    /// Ordinary mismatches are recoverable; unknown terms are not.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, UnifyFailure::UnknownTerm(_))
    }
}

impl fmt::Display for UnifyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnifyFailure::AtomMismatch { lhs, rhs } => {
                write!(f, "atom mismatch: {:#04x} vs {:#04x}", lhs, rhs)
            }
            UnifyFailure::ArityMismatch { lhs, rhs } => {
                write!(f, "arity mismatch: {} vs {}", lhs, rhs)
            }
            UnifyFailure::ShapeMismatch { lhs, rhs } => {
                write!(f, "shape mismatch: term {} vs term {}", lhs.raw(), rhs.raw())
            }
            UnifyFailure::OccursCheck { var } => write!(f, "occurs check failed for ${}", var),
            UnifyFailure::UnknownTerm(id) => write!(f, "unknown term id {}", id.raw()),
        }
    }
}

impl std::error::Error for UnifyFailure {}

/// Unify two terms under `env`, returning the extended environment.
///
/// `env` itself is left untouched, so a failed attempt never leaks
/// partial bindings.
pub fn unify(
    lhs: TermId,
    rhs: TermId,
    env: &Env,
    terms: &TermStore,
    occurs_check: OccursCheck,
) -> Result<Env, UnifyFailure> {
    resolve([UnifyState::new(lhs, rhs)], env.clone(), terms, occurs_check)
}

/// Discharge a list of obligations, in order, starting from `env`.
///
/// Uses an explicit worklist to avoid recursion: a pair of sequences
/// pushes its element pairs as new obligations. The first mismatch aborts.
pub fn resolve<I>(
    obligations: I,
    mut env: Env,
    terms: &TermStore,
    occurs_check: OccursCheck,
) -> Result<Env, UnifyFailure>
where
    I: IntoIterator<Item = UnifyState>,
{
    let mut worklist: SmallVec<[UnifyState; 32]> = obligations.into_iter().collect();
    worklist.reverse();

    let _span = debug_span!("unify", obligations = worklist.len()).entered();

    // Without the occurs-check, bindings may be cyclic; a sequence pair that
    // is already being decomposed is assumed to unify.
    let mut decomposed: HashSet<(TermId, TermId)> = HashSet::new();

    while let Some(UnifyState { lhs, rhs }) = worklist.pop() {
        let a = env.deref(lhs, terms);
        let b = env.deref(rhs, terms);

        if a == b {
            continue;
        }

        let a_term = terms.resolve(a).ok_or(UnifyFailure::UnknownTerm(a))?;
        let b_term = terms.resolve(b).ok_or(UnifyFailure::UnknownTerm(b))?;

        match (a_term, b_term) {
            (Term::Var(idx_a), Term::Var(idx_b)) => {
                // Bind the higher-indexed variable to the lower one.
                if idx_a < idx_b {
                    env.bind(idx_b, a);
                } else {
                    env.bind(idx_a, b);
                }
            }
            (Term::Var(idx), _) => bind_checked(idx, b, &mut env, terms, occurs_check)?,
            (_, Term::Var(idx)) => bind_checked(idx, a, &mut env, terms, occurs_check)?,
            (Term::Atom(x), Term::Atom(y)) => {
                // Distinct ids of two atoms always mean distinct bytes.
                trace!(lhs = x, rhs = y, "unify_atom_mismatch");
                return Err(UnifyFailure::AtomMismatch { lhs: x, rhs: y });
            }
            (Term::Seq(xs), Term::Seq(ys)) => {
                if xs.len() != ys.len() {
                    trace!(lhs = xs.len(), rhs = ys.len(), "unify_arity_mismatch");
                    return Err(UnifyFailure::ArityMismatch {
                        lhs: xs.len(),
                        rhs: ys.len(),
                    });
                }
                if occurs_check == OccursCheck::Skip && !decomposed.insert((a, b)) {
                    continue;
                }
                // Reverse so the leftmost pair is popped first.
                for (x, y) in xs.iter().zip(ys.iter()).rev() {
                    worklist.push(UnifyState::new(*x, *y));
                }
            }
            (Term::Atom(_), Term::Seq(_)) | (Term::Seq(_), Term::Atom(_)) => {
                trace!("unify_shape_mismatch");
                return Err(UnifyFailure::ShapeMismatch { lhs: a, rhs: b });
            }
        }
    }

    trace!(bindings = env.len(), "unify_success");
    Ok(env)
}

fn bind_checked(
    var: u32,
    term: TermId,
    env: &mut Env,
    terms: &TermStore,
    occurs_check: OccursCheck,
) -> Result<(), UnifyFailure> {
    if occurs_check == OccursCheck::Enforce && occurs(var, term, env, terms) {
        trace!(var, "unify_occurs_check_failed");
        return Err(UnifyFailure::OccursCheck { var });
    }
    env.bind(var, term);
    Ok(())
}

/// Occurs check: does variable `var` occur in `term` under `env`?
fn occurs(var: u32, term: TermId, env: &Env, terms: &TermStore) -> bool {
    let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
    let mut seen: SmallVec<[u32; 8]> = SmallVec::new();
    stack.push(term);

    while let Some(t) = stack.pop() {
        let t_deref = env.deref(t, terms);
        match terms.resolve(t_deref) {
            Some(Term::Var(idx)) => {
                if idx == var {
                    return true;
                }
            }
            Some(Term::Seq(children)) => {
                // A bound variable may be reached twice; its binding was
                // already searched the first time.
                if let Some(idx) = terms.is_var(t) {
                    if seen.contains(&idx) {
                        continue;
                    }
                    seen.push(idx);
                }
                stack.extend(children);
            }
            Some(Term::Atom(_)) | None => {}
        }
    }

    false
}
