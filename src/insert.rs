//! The inserter: the single mutation routine driving `insert`. See spec §4.3.
//!
//! Case A (clean terminate), Case B (append past a leaf/branch) and Case C
//! (split a compressed edge) are all handled here. Case C further splits into
//! a head-split (divergence at the very start of the edge, folded directly
//! into the existing node to avoid ever materializing a zero-length edge)
//! and a general mid-edge split (divergence further in, or the key running
//! out inside the edge).

use slab::Slab;
use smallvec::SmallVec;

use crate::find::{NodeIdx, find, no_visitor};
use crate::node::{Node, Slot};

/// Inserts `value` at `key`, descending from `root`. Returns `true` if this
/// created a new entry, `false` if `key` already had a value and either
/// `overwrite` was false (left untouched) or the overwrite happened in place.
///
/// `value` is a [`Slot`] rather than a bare `V` so that the public facade can
/// feed through either a real payload or the absent-value marker uniformly —
/// the split/append logic below never needs to know which it got.
///
/// The empty key is handled here too: Path-finder resolves it to `(root, 0,
/// 0)` unconditionally, which always satisfies Case A below.
pub(crate) fn insert<V>(
    arena: &mut Slab<Node<V>>,
    root: NodeIdx,
    key: &[u8],
    value: Slot<V>,
    overwrite: bool,
) -> bool {
    let found = find(arena, root, key, no_visitor);
    let mut current = found.node;
    let mut i = found.i;
    let j = found.j;

    // Case A: the key already terminates cleanly at `current`.
    if i == key.len() && (!arena[current as usize].is_compressed() || j == 0) {
        let node = &mut arena[current as usize];
        let had_value = node.has_value();
        if had_value && !overwrite {
            return false;
        }
        node.value = value;
        return !had_value;
    }

    if arena[current as usize].is_compressed() {
        if i != key.len() {
            // Case C, divergence branch: the key disagrees with the edge at
            // byte `j` (or disagrees immediately, j == 0).
            let new_child = arena.insert(Node::default()) as NodeIdx;

            if j == 0 {
                fold_head_split(arena, current, key[i], new_child);
            } else {
                split_edge(arena, current, j, key[i], new_child);
            }

            i += 1;
            // The diverging byte consumed above may have been the key's last
            // byte, in which case `new_child` *is* the key's terminus and
            // gets the value directly — `insert_suffix` requires a non-empty
            // remainder and must not be called here.
            if i == key.len() {
                arena[new_child as usize].value = value;
                return true;
            }
            current = new_child;
        } else {
            // Case C, key-ends-inside-edge branch (i == key.len(), j > 0).
            // The new value belongs to the node reached after consuming
            // exactly `j` bytes of the edge, i.e. the node that inherits the
            // edge's tail and the old children — not the truncated `current`
            // itself, which still represents the position *before* any of
            // the edge was consumed (mirrors the original gorax insertion:
            // the split's tail node, not its head, is what `Get` will find).
            split_for_exact_end(arena, current, j, value);
            return true;
        }
    }

    insert_suffix(arena, current, &key[i..], value);
    true
}

/// Folds a branch point directly into `node_idx` when the divergence happens
/// at the very first byte of its edge (`j == 0`). Creating an intermediate
/// node here would leave it with a zero-length edge, which is never valid.
fn fold_head_split<V>(arena: &mut Slab<Node<V>>, node_idx: NodeIdx, diverging_byte: u8, new_child: NodeIdx) {
    let (first_byte, tail_edges, old_children) = {
        let node = &mut arena[node_idx as usize];
        let old_edges = std::mem::take(&mut node.edges);
        let old_children = std::mem::take(&mut node.children);
        let first_byte = old_edges[0];
        let tail_edges = SmallVec::from_slice(&old_edges[1..]);
        (first_byte, tail_edges, old_children)
    };

    let old_idx = arena.insert(Node {
        edges: tail_edges,
        children: old_children,
        value: Slot::Missing,
    }) as NodeIdx;

    let node = &mut arena[node_idx as usize];
    node.edges.push(first_byte);
    node.children.push(old_idx);
    node.add_branch_edge(diverging_byte, new_child);
}

/// General mid-edge split at byte offset `j` (0 < j < edge length): `node_idx`
/// keeps the head `edges[..j]`, a fresh branch node holds the two diverging
/// continuations (the edge's old tail, and `new_child`).
fn split_edge<V>(arena: &mut Slab<Node<V>>, node_idx: NodeIdx, j: usize, diverging_byte: u8, new_child: NodeIdx) {
    let (head, mid_byte, tail_edges, old_children) = {
        let node = &mut arena[node_idx as usize];
        let old_edges = std::mem::take(&mut node.edges);
        let old_children = std::mem::take(&mut node.children);
        let head = SmallVec::from_slice(&old_edges[..j]);
        let mid_byte = old_edges[j];
        let tail_edges = SmallVec::from_slice(&old_edges[j + 1..]);
        (head, mid_byte, tail_edges, old_children)
    };

    let old_idx = if tail_edges.is_empty() {
        old_children[0]
    } else {
        arena.insert(Node {
            edges: tail_edges,
            children: old_children,
            value: Slot::Missing,
        }) as NodeIdx
    };

    let mut split = Node::default();
    split.add_branch_edge(mid_byte, old_idx);
    split.add_branch_edge(diverging_byte, new_child);
    let split_idx = arena.insert(split) as NodeIdx;

    let node = &mut arena[node_idx as usize];
    node.edges = head;
    node.children = SmallVec::from_slice(&[split_idx]);
}

/// Splits `node_idx`'s edge at `j` when the key ends exactly there: the head
/// (`edges[..j]`) stays on `node_idx`, unchanged in identity and still
/// valueless; a fresh node owns the tail (`edges[j..]`) and the old children,
/// and receives `value` — it is the node a later `get` for this key reaches.
fn split_for_exact_end<V>(arena: &mut Slab<Node<V>>, node_idx: NodeIdx, j: usize, value: Slot<V>) {
    let (head, tail_edges, old_children) = {
        let node = &mut arena[node_idx as usize];
        let old_edges = std::mem::take(&mut node.edges);
        let old_children = std::mem::take(&mut node.children);
        let head = SmallVec::from_slice(&old_edges[..j]);
        let tail_edges = SmallVec::from_slice(&old_edges[j..]);
        (head, tail_edges, old_children)
    };
    debug_assert!(!tail_edges.is_empty());

    let tail_idx = arena.insert(Node {
        edges: tail_edges,
        children: old_children,
        value,
    }) as NodeIdx;

    let node = &mut arena[node_idx as usize];
    node.edges = head;
    node.children = SmallVec::from_slice(&[tail_idx]);
}

/// Appends `rest` (non-empty) onto `parent`, which is either a leaf or an
/// existing branch. A leaf swallowing more than one remaining byte gets a
/// single compressed child for the whole run; otherwise one branch byte is
/// added and, if more than one byte remains, the fresh child (guaranteed a
/// leaf) repeats the same rule — at most one extra level deep.
fn insert_suffix<V>(arena: &mut Slab<Node<V>>, parent: NodeIdx, rest: &[u8], value: Slot<V>) {
    debug_assert!(!rest.is_empty());

    if arena[parent as usize].is_leaf() && rest.len() > 1 {
        let leaf = arena.insert(Node::leaf_with_value(value)) as NodeIdx;
        arena[parent as usize].add_compressed_child(rest, leaf);
        return;
    }

    let leaf = arena.insert(Node::default()) as NodeIdx;
    arena[parent as usize].add_branch_edge(rest[0], leaf);
    if rest.len() > 1 {
        insert_suffix(arena, leaf, &rest[1..], value);
    } else {
        arena[leaf as usize].value = value;
    }
}
