//! The deleter: `delete` and `delete_prefix`, with pruning of dead chains and
//! re-compression of the single-child runs pruning leaves behind. See spec
//! §4.4.

use slab::Slab;

use crate::find::{NodeIdx, find};
use crate::node::{Node, Slot};
use crate::walk::count_values;

/// Removes the value at `key`. Returns the removed `Slot` (`Slot::Missing` on
/// a miss) and whether anything was actually removed.
pub(crate) fn delete<V>(arena: &mut Slab<Node<V>>, root: NodeIdx, key: &[u8]) -> (Slot<V>, bool) {
    let mut trail = Vec::new();
    let found = find(arena, root, key, |_, node| {
        trail.push(node);
        std::ops::ControlFlow::Continue(())
    });
    trail.pop(); // the terminal node itself is always pushed last; drop it.

    if !found.is_exact(key.len()) {
        return (Slot::Missing, false);
    }

    let node = &mut arena[found.node as usize];
    if !node.has_value() {
        return (Slot::Missing, false);
    }
    let removed = node.value.take();

    prune(arena, root, found.node, trail);
    (removed, true)
}

/// Clears the entire subtree reachable under `prefix` and returns the number
/// of value-carrying nodes it contained. Returns 0 if `prefix` does not name
/// a live position in the tree.
pub(crate) fn delete_prefix<V>(arena: &mut Slab<Node<V>>, root: NodeIdx, prefix: &[u8]) -> usize {
    let mut trail = Vec::new();
    let found = find(arena, root, prefix, |_, node| {
        trail.push(node);
        std::ops::ControlFlow::Continue(())
    });
    trail.pop();

    if found.i != prefix.len() {
        return 0;
    }

    let removed = count_values(arena, found.node);
    if removed == 0 {
        return 0;
    }

    let node = &mut arena[found.node as usize];
    node.edges.clear();
    node.children.clear();
    node.value = Slot::Missing;

    prune(arena, root, found.node, trail);
    removed
}

/// Walks upward from `terminal` removing now-dead (childless, valueless,
/// non-root) nodes, then re-compresses the chain above the first ancestor
/// left with exactly one child and no value of its own.
fn prune<V>(arena: &mut Slab<Node<V>>, root: NodeIdx, terminal: NodeIdx, mut trail: Vec<NodeIdx>) {
    if !arena[terminal as usize].is_leaf() {
        // Terminal kept its children; the value it just lost didn't change
        // anything below it, but it may have just made its own parent a
        // recompression candidate (a value-less node whose only child,
        // terminal, is itself now value-less too). At the root there is no
        // parent to check — the root itself plays that role instead.
        let candidate = trail.last().copied().unwrap_or(terminal);
        let candidate_node = &arena[candidate as usize];
        if candidate_node.children.len() == 1 && !candidate_node.has_value() {
            recompress(arena, candidate);
        }
        return;
    }

    let mut n = terminal;
    loop {
        let node = &arena[n as usize];
        if n == root || !node.is_leaf() || node.has_value() {
            return;
        }

        let parent = trail.pop().expect("trail must reach the root");
        arena[parent as usize].remove_branch_child(n);
        arena.remove(n as usize);

        let parent_node = &arena[parent as usize];
        if parent_node.children.len() == 1 && !parent_node.has_value() {
            recompress(arena, parent);
            return;
        }
        n = parent;
    }
}

/// Collapses the chain of value-less single-child nodes starting at `a` (a
/// confirmed re-compression candidate) into one compressed node occupying
/// `a`'s own arena slot, concatenating edge labels down to the first
/// descendant that is value-carrying or genuinely branching.
fn recompress<V>(arena: &mut Slab<Node<V>>, a: NodeIdx) {
    let mut edges = crate::node::EdgeVec::new();
    let mut to_remove = Vec::new();
    let mut cursor = a;

    let stop_child = loop {
        edges.extend_from_slice(&arena[cursor as usize].edges);
        let child = arena[cursor as usize].children[0];
        let child_node = &arena[child as usize];
        if child_node.has_value() || child_node.children.len() != 1 {
            break child;
        }
        if cursor != a {
            to_remove.push(cursor);
        }
        cursor = child;
    };
    if cursor != a {
        to_remove.push(cursor);
    }

    let node = &mut arena[a as usize];
    node.edges = edges;
    node.children = crate::node::ChildVec::from_slice(&[stop_child]);

    for idx in to_remove {
        arena.remove(idx as usize);
    }
}
