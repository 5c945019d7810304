//! Traversal: a single DFS routine backing `walk`/`walk_prefix`, plus the
//! Minimum/Maximum/LongestPrefix specializations that don't go through it.
//! See spec §4.5.
//!
//! Every specialization fires/returns on `has_value`, not just a concrete
//! payload — a key stored with the absent-value marker is still a live key
//! (spec §9), so callbacks and results carry `Option<&V>`/`Option<V>` rather
//! than a bare `V`, mirroring `get`'s own `(Option<V>, bool)` shape.

use std::ops::ControlFlow;

use slab::Slab;

use crate::find::{NodeIdx, find};
use crate::node::Node;

/// Depth-first walk starting at `start`, reached so far via `prefix`. Fires
/// `visit(key, value)` for every node with a value. Two parallel stacks
/// (nodes, prefixes) are pushed in stored (ascending-edge) order and popped
/// LIFO, so sibling order at each level comes out reverse-lexicographic —
/// nothing here promises forward order; `minimum`/`maximum` below do that.
pub(crate) fn walk<V>(
    arena: &Slab<Node<V>>,
    start: NodeIdx,
    prefix: &[u8],
    mut visit: impl FnMut(&[u8], Option<&V>) -> ControlFlow<()>,
) {
    let mut nodes = vec![start];
    let mut prefixes = vec![prefix.to_vec()];

    while let Some(idx) = nodes.pop() {
        let key = prefixes.pop().expect("parallel stacks");
        let node = &arena[idx as usize];

        if node.has_value() && visit(&key, node.value.as_present()).is_break() {
            return;
        }

        for (child_key, child_idx) in node.edges_of_children(&key) {
            nodes.push(child_idx);
            prefixes.push(child_key);
        }
    }
}

/// Resolves `prefix` via Path-finder and, if it names a live position (the
/// prefix is fully consumed exactly at or inside `node`'s edge), walks the
/// subtree rooted there with `prefix` as the starting key accumulator.
pub(crate) fn walk_prefix<V>(
    arena: &Slab<Node<V>>,
    root: NodeIdx,
    prefix: &[u8],
    visit: impl FnMut(&[u8], Option<&V>) -> ControlFlow<()>,
) {
    let found = find(arena, root, prefix, crate::find::no_visitor);
    if found.i == prefix.len() {
        walk(arena, found.node, prefix, visit);
    }
}

/// Walks along the path to `key` without ever branching: hands the user
/// callback to Path-finder as its ancestor visitor, firing only on nodes
/// that carry a value, so the caller sees every stored key that is itself a
/// prefix of `key`.
pub(crate) fn walk_path<V>(
    arena: &Slab<Node<V>>,
    root: NodeIdx,
    key: &[u8],
    mut visit: impl FnMut(&[u8], Option<&V>) -> ControlFlow<()>,
) {
    find(arena, root, key, |prefix, idx| {
        let node = &arena[idx as usize];
        if node.has_value() {
            visit(prefix, node.value.as_present())
        } else {
            ControlFlow::Continue(())
        }
    });
}

/// Reconstructed `(key, value)` of a live entry, as produced by `minimum`,
/// `maximum` and `longest_prefix`. `value` is `None` when the entry was
/// stored with the absent-value marker, matching `get`'s return shape.
pub(crate) struct Found<V> {
    pub(crate) key: Vec<u8>,
    pub(crate) value: Option<V>,
}

/// Smallest live key under `start`: descend via child index 0 at each
/// branch, appending the whole edge run at each compressed node, stopping at
/// the first value-carrying node.
pub(crate) fn minimum<V: Clone>(arena: &Slab<Node<V>>, start: NodeIdx) -> Option<Found<V>> {
    let mut idx = start;
    let mut key = Vec::new();
    loop {
        let node = &arena[idx as usize];
        if node.has_value() {
            return Some(Found {
                key,
                value: node.value.as_present().cloned(),
            });
        }
        if node.is_leaf() {
            return None;
        }
        if node.is_compressed() {
            key.extend_from_slice(&node.edges);
        } else {
            key.push(node.edges[0]);
        }
        idx = node.children[0];
    }
}

/// Largest live key under `start`: same descent, always taking the last
/// child; stops at a leaf (which, by invariant, always carries a value
/// unless it is the empty root).
pub(crate) fn maximum<V: Clone>(arena: &Slab<Node<V>>, start: NodeIdx) -> Option<Found<V>> {
    let mut idx = start;
    let mut key = Vec::new();
    loop {
        let node = &arena[idx as usize];
        if node.is_leaf() {
            return if node.has_value() {
                Some(Found {
                    key,
                    value: node.value.as_present().cloned(),
                })
            } else {
                None
            };
        }
        if node.is_compressed() {
            key.extend_from_slice(&node.edges);
        } else {
            key.push(*node.edges.last().expect("non-leaf has an edge"));
        }
        idx = *node.children.last().expect("non-leaf has a child");
    }
}

/// Longest stored key that is a prefix of `key`: Path-finder with a visitor
/// tracking the deepest ancestor (by bytes consumed) that carries a value.
pub(crate) fn longest_prefix<V: Clone>(arena: &Slab<Node<V>>, root: NodeIdx, key: &[u8]) -> Option<Found<V>> {
    let mut best: Option<Found<V>> = None;
    find(arena, root, key, |prefix, idx| {
        let node = &arena[idx as usize];
        if node.has_value() {
            best = Some(Found {
                key: prefix.to_vec(),
                value: node.value.as_present().cloned(),
            });
        }
        ControlFlow::Continue(())
    });
    best
}

/// Counts value-carrying nodes in the subtree rooted at `start`, used by
/// `delete_prefix` to report how many entries a prefix-clear dropped.
pub(crate) fn count_values<V>(arena: &Slab<Node<V>>, start: NodeIdx) -> usize {
    let mut count = 0;
    let mut stack = vec![start];
    while let Some(idx) = stack.pop() {
        let node = &arena[idx as usize];
        if node.has_value() {
            count += 1;
        }
        stack.extend(node.children.iter().copied());
    }
    count
}
