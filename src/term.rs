use hashbrown::HashMap;
use parking_lot::RwLock;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};

/// Unique identifier for a term in the term store.
/// Structurally equal terms always share one TermId.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Child-index path from a root term down to one of its sub-terms.
/// The empty position addresses the root itself.
pub type Position = SmallVec<[u32; 8]>;

/// A term is an atom, a sequence of terms, or a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// An indivisible one-byte leaf.
    Atom(u8),
    /// An ordered compound value.
    Seq(SmallVec<[TermId; 4]>),
    /// A placeholder bound during unification.
    Var(u32),
}

impl Term {
    /// True for compound terms (sequences), false for atoms and variables.
    pub fn is_compound(&self) -> bool {
        matches!(self, Term::Seq(_))
    }
}

/// Number of shards for hashcons maps (power of 2 for fast modulo).
const NUM_SHARDS: usize = 16;

/// Thread-safe term store with hashconsing.
///
/// Guarantees:
/// - Structurally equal terms get the same TermId
/// - TermId can be resolved back to the term
/// - Stored terms are never mutated; rewriting builds new terms
pub struct TermStore {
    /// Central storage of all terms, indexed by TermId.
    nodes: RwLock<Vec<Term>>,
    /// Sharded hashcons maps for reducing contention.
    shards: [RwLock<HashMap<Term, TermId>>; NUM_SHARDS],
}

impl TermStore {
    /// Create a new empty term store.
    pub fn new() -> Self {
        let shards = std::array::from_fn(|_| RwLock::new(HashMap::new()));
        Self {
            nodes: RwLock::new(Vec::new()),
            shards,
        }
    }

    /// Intern a term, returning its TermId.
    /// If the term already exists, returns the existing TermId.
    fn intern(&self, term: Term) -> TermId {
        let shard = &self.shards[Self::shard_index(&term)];

        {
            let map = shard.read();
            if let Some(&id) = map.get(&term) {
                return id;
            }
        }

        let mut map = shard.write();
        // Another writer may have interned it between the two locks.
        if let Some(&id) = map.get(&term) {
            return id;
        }

        let id = {
            let mut nodes = self.nodes.write();
            let id = TermId(nodes.len() as u32);
            nodes.push(term.clone());
            id
        };
        map.insert(term, id);
        id
    }

    /// Create an atom term.
    pub fn atom(&self, byte: u8) -> TermId {
        self.intern(Term::Atom(byte))
    }

    /// Create a variable term.
    pub fn var(&self, index: u32) -> TermId {
        self.intern(Term::Var(index))
    }

    /// Create a sequence term from its elements, in order.
    pub fn seq<I: IntoIterator<Item = TermId>>(&self, children: I) -> TermId {
        self.intern(Term::Seq(children.into_iter().collect()))
    }

    /// Create a sequence of atoms, one per byte.
    pub fn bytes(&self, bytes: &[u8]) -> TermId {
        self.seq(bytes.iter().map(|&b| self.atom(b)))
    }

    /// Resolve a TermId to its term.
    /// Returns None if the TermId is invalid.
    pub fn resolve(&self, id: TermId) -> Option<Term> {
        let nodes = self.nodes.read();
        nodes.get(id.0 as usize).cloned()
    }

    /// Check if a term is a variable, returning its index.
    pub fn is_var(&self, id: TermId) -> Option<u32> {
        match self.resolve(id)? {
            Term::Var(idx) => Some(idx),
            _ => None,
        }
    }

    /// Check if a term is an atom, returning its byte.
    pub fn is_atom(&self, id: TermId) -> Option<u8> {
        match self.resolve(id)? {
            Term::Atom(b) => Some(b),
            _ => None,
        }
    }

    /// True iff the term is a sequence.
    pub fn is_seq(&self, id: TermId) -> bool {
        matches!(self.resolve(id), Some(Term::Seq(_)))
    }

    /// Elements of a sequence, or None for atoms, variables and invalid ids.
    pub fn children(&self, id: TermId) -> Option<SmallVec<[TermId; 4]>> {
        match self.resolve(id)? {
            Term::Seq(children) => Some(children),
            _ => None,
        }
    }

    /// The `index`-th element of a sequence.
    pub fn child(&self, id: TermId, index: usize) -> Option<TermId> {
        let nodes = self.nodes.read();
        match nodes.get(id.0 as usize)? {
            Term::Seq(children) => children.get(index).copied(),
            _ => None,
        }
    }

    /// Number of interned terms.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of sub-terms of `root`, counting the root and every
    /// (possibly repeated) occurrence below it.
    pub fn sub_term_count(&self, root: TermId) -> Option<usize> {
        let mut count = 0;
        let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
        stack.push(root);
        while let Some(t) = stack.pop() {
            count += 1;
            match self.resolve(t)? {
                Term::Seq(children) => stack.extend(children),
                Term::Atom(_) | Term::Var(_) => {}
            }
        }
        Some(count)
    }

    /// Highest variable index occurring in `root`, or None for ground terms.
    /// Invalid ids are skipped.
    pub fn max_var(&self, root: TermId) -> Option<u32> {
        let mut max = None;
        let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
        stack.push(root);
        while let Some(t) = stack.pop() {
            match self.resolve(t) {
                Some(Term::Var(idx)) => max = max.max(Some(idx)),
                Some(Term::Seq(children)) => stack.extend(children),
                Some(Term::Atom(_)) | None => {}
            }
        }
        max
    }

    /// Rename every variable `$n` in `root` to `$(n + offset)`.
    ///
    /// Uses an explicit stack to avoid recursion.
    pub fn shift_vars(&self, root: TermId, offset: u32) -> Option<TermId> {
        if offset == 0 || self.max_var(root).is_none() {
            self.resolve(root)?;
            return Some(root);
        }

        // (term, children_done)
        let mut work: Vec<(TermId, bool)> = vec![(root, false)];
        let mut out: Vec<TermId> = Vec::new();

        while let Some((tid, children_done)) = work.pop() {
            match self.resolve(tid)? {
                Term::Var(idx) => out.push(self.var(idx.checked_add(offset)?)),
                Term::Atom(_) => out.push(tid),
                Term::Seq(children) if children_done => {
                    let kids: SmallVec<[TermId; 4]> =
                        out.drain(out.len() - children.len()..).collect();
                    out.push(self.intern(Term::Seq(kids)));
                }
                Term::Seq(children) => {
                    work.push((tid, true));
                    for child in children.iter().rev() {
                        work.push((*child, false));
                    }
                }
            }
        }

        out.pop()
    }

    /// Sub-term of `root` at `position`.
    pub fn at(&self, root: TermId, position: &[u32]) -> Option<TermId> {
        let mut current = root;
        for &index in position {
            current = self.child(current, index as usize)?;
        }
        Some(current)
    }

    /// Rebuild `root` with the sub-term at `position` replaced by
    /// `replacement`. Returns None if the position does not exist.
    pub fn replace_at(
        &self,
        root: TermId,
        position: &[u32],
        replacement: TermId,
    ) -> Option<TermId> {
        // Ancestors from the root down to the parent of the target.
        let mut spine: SmallVec<[(SmallVec<[TermId; 4]>, usize); 8]> = SmallVec::new();
        let mut current = root;
        for &index in position {
            let children = self.children(current)?;
            let next = *children.get(index as usize)?;
            spine.push((children, index as usize));
            current = next;
        }

        let mut rebuilt = replacement;
        while let Some((mut children, index)) = spine.pop() {
            children[index] = rebuilt;
            rebuilt = self.intern(Term::Seq(children));
        }
        Some(rebuilt)
    }

    /// Get the shard index for a term (for hashconsing distribution).
    fn shard_index(term: &Term) -> usize {
        let mut hasher = FxHasher::default();
        term.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }
}

impl Default for TermStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a term: graphic ASCII atoms print as themselves, other atoms
/// as `#xx`, sequences as `(a b c)` and variables as `$n`.
pub fn format_term(term: TermId, terms: &TermStore) -> Result<String, String> {
    enum Piece {
        Term(TermId),
        Text(&'static str),
    }

    let mut out = String::new();
    let mut work: Vec<Piece> = vec![Piece::Term(term)];

    while let Some(piece) = work.pop() {
        let tid = match piece {
            Piece::Text(text) => {
                out.push_str(text);
                continue;
            }
            Piece::Term(tid) => tid,
        };
        match terms.resolve(tid) {
            Some(Term::Atom(b)) => {
                if b.is_ascii_graphic() && !matches!(b, b'(' | b')' | b'$' | b'#') {
                    out.push(b as char);
                } else {
                    out.push_str(&format!("#{:02x}", b));
                }
            }
            Some(Term::Var(idx)) => {
                out.push('$');
                out.push_str(&idx.to_string());
            }
            Some(Term::Seq(children)) => {
                out.push('(');
                work.push(Piece::Text(")"));
                for (i, child) in children.iter().enumerate().rev() {
                    work.push(Piece::Term(*child));
                    if i > 0 {
                        work.push(Piece::Text(" "));
                    }
                }
            }
            None => return Err(format!("Unknown term id {:?}", tid)),
        }
    }

    Ok(out)
}
