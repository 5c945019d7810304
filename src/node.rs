//! Node representation: the two structural modes (branch / compressed) and
//! the value sentinel that distinguishes "no value" from "value is absent".

use smallvec::SmallVec;

/// Small-size inline capacity for edge labels. Chosen as a size optimization
/// only — edges grow onto the heap past this with no hard cap (see
/// DESIGN.md, "Size budget for node arrays").
const INLINE_EDGES: usize = 8;
/// Small-size inline capacity for child arena indices.
const INLINE_CHILDREN: usize = 4;

/// Arena slot index. `u32` keeps nodes compact; a tree with more than
/// `u32::MAX` live nodes is not a realistic target for an in-memory index.
pub(crate) type ChildIdx = u32;

pub(crate) type EdgeVec = SmallVec<[u8; INLINE_EDGES]>;
pub(crate) type ChildVec = SmallVec<[ChildIdx; INLINE_CHILDREN]>;

/// The caller-facing value of a node is one of three states: never stored,
/// explicitly stored as absent (the "nil-payload" sentinel), or present with
/// a real payload. See spec §9, "Absent-value sentinel".
pub(crate) enum Slot<V> {
    Missing,
    PresentAbsent,
    Present(V),
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Slot::Missing
    }
}

impl<V> Slot<V> {
    pub(crate) fn has_value(&self) -> bool {
        !matches!(self, Slot::Missing)
    }

    /// Borrows the real payload, if any (`None` for both `Missing` and the
    /// absent-value marker).
    pub(crate) fn as_present(&self) -> Option<&V> {
        match self {
            Slot::Present(v) => Some(v),
            _ => None,
        }
    }

    /// Moves the value out, leaving `Missing` behind.
    pub(crate) fn take(&mut self) -> Slot<V> {
        std::mem::replace(self, Slot::Missing)
    }

    /// Consumes the slot into the public `(value, present)` pair.
    pub(crate) fn into_public(self) -> (Option<V>, bool) {
        match self {
            Slot::Missing => (None, false),
            Slot::PresentAbsent => (None, true),
            Slot::Present(v) => (Some(v), true),
        }
    }

    /// Clones the slot into the public `(value, present)` pair.
    pub(crate) fn to_public(&self) -> (Option<V>, bool)
    where
        V: Clone,
    {
        match self {
            Slot::Missing => (None, false),
            Slot::PresentAbsent => (None, true),
            Slot::Present(v) => (Some(v.clone()), true),
        }
    }
}

/// One tree vertex. Whether it's a branch, a compressed run, or a leaf is
/// derived purely from the lengths of `edges` and `children` (spec §3) —
/// there is no separate tag field to keep in sync.
pub(crate) struct Node<V> {
    pub(crate) edges: EdgeVec,
    pub(crate) children: ChildVec,
    pub(crate) value: Slot<V>,
}

impl<V> Default for Node<V> {
    fn default() -> Self {
        Node {
            edges: SmallVec::new(),
            children: SmallVec::new(),
            value: Slot::Missing,
        }
    }
}

impl<V> Node<V> {
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn is_branch(&self) -> bool {
        !self.is_leaf() && self.edges.len() == self.children.len()
    }

    pub(crate) fn is_compressed(&self) -> bool {
        !self.is_leaf() && self.edges.len() != self.children.len()
    }

    pub(crate) fn has_value(&self) -> bool {
        self.value.has_value()
    }

    pub(crate) fn leaf_with_value(value: Slot<V>) -> Self {
        Node {
            edges: SmallVec::new(),
            children: SmallVec::new(),
            value,
        }
    }

    /// Branch-mode (or leaf, trivially) lookup via binary search on `edges`.
    pub(crate) fn find_branch(&self, byte: u8) -> Option<ChildIdx> {
        debug_assert!(!self.is_compressed());
        self.edges.binary_search(&byte).ok().map(|i| self.children[i])
    }

    /// Inserts `(byte, child)` while preserving ascending order (invariant 1).
    /// Only valid on a branch or leaf node; `byte` must not already be present.
    pub(crate) fn add_branch_edge(&mut self, byte: u8, child: ChildIdx) {
        debug_assert!(!self.is_compressed());
        match self.edges.binary_search(&byte) {
            Ok(_) => unreachable!("add_branch_edge: duplicate edge byte"),
            Err(pos) => {
                self.edges.insert(pos, byte);
                self.children.insert(pos, child);
            }
        }
    }

    /// Converts a leaf-like node into a compressed node owning `child` via
    /// the full edge run `bytes`. Only valid on a currently leaf-like node.
    pub(crate) fn add_compressed_child(&mut self, bytes: &[u8], child: ChildIdx) {
        debug_assert!(self.is_leaf());
        debug_assert!(!bytes.is_empty());
        self.edges = SmallVec::from_slice(bytes);
        self.children = SmallVec::from_slice(&[child]);
    }

    /// Removes `child` by arena-index identity (a parent never holds two
    /// references to the same child, so index equality suffices). On a
    /// compressed node this clears both arrays, turning the node into a leaf.
    pub(crate) fn remove_branch_child(&mut self, child: ChildIdx) -> bool {
        if self.is_compressed() {
            if self.children[0] == child {
                self.edges.clear();
                self.children.clear();
                return true;
            }
            return false;
        }
        match self.children.iter().position(|&c| c == child) {
            Some(pos) => {
                self.edges.remove(pos);
                self.children.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Returns the sole child index when this node has exactly one child
    /// (whether reached in branch or compressed mode).
    pub(crate) fn single_child(&self) -> Option<ChildIdx> {
        if self.children.len() == 1 { Some(self.children[0]) } else { None }
    }

    /// The `(edge-label, child-index)` pairs in stored order, each edge label
    /// extended by `prefix` — used to drive DFS traversal (spec §4.5).
    pub(crate) fn edges_of_children(&self, prefix: &[u8]) -> Vec<(Vec<u8>, ChildIdx)> {
        if self.is_compressed() {
            let mut key = Vec::with_capacity(prefix.len() + self.edges.len());
            key.extend_from_slice(prefix);
            key.extend_from_slice(&self.edges);
            vec![(key, self.children[0])]
        } else {
            self.edges
                .iter()
                .zip(self.children.iter())
                .map(|(&b, &c)| {
                    let mut key = Vec::with_capacity(prefix.len() + 1);
                    key.extend_from_slice(prefix);
                    key.push(b);
                    (key, c)
                })
                .collect()
        }
    }
}

/// Longest common prefix length between two byte slices.
pub(crate) fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}
