//! # radart
//!
//! A compact adaptive radix tree with path compression for byte-string keys.
//!
//! ## Features
//!
//! - **O(k) operations**: get/insert/delete run in O(k) time where k is the
//!   key length, independent of how many entries the tree holds.
//! - **Path compression**: runs of single-child nodes collapse into one
//!   compressed edge, keeping memory proportional to the distinct bytes that
//!   actually branch.
//! - **Prefix operations**: `walk_prefix`/`delete_prefix` operate on whole
//!   subtrees without touching anything outside the prefix.
//! - **Absent-value marker**: a key can be stored with no payload at all
//!   (`insert(key, None)`), distinguishable from the key being missing.
//!
//! ## Example
//!
//! ```rust
//! use radart::RadArt;
//!
//! let mut tree = RadArt::new();
//! tree.insert(b"hello", Some("world"));
//! tree.insert(b"hello:foo", Some("bar"));
//!
//! assert_eq!(tree.get(b"hello"), (Some(&"world"), true));
//! assert_eq!(tree.get(b"missing"), (None, false));
//!
//! let (removed, existed) = tree.delete(b"hello");
//! assert_eq!(removed, Some("world"));
//! assert!(existed);
//! ```

mod delete;
mod find;
mod insert;
mod node;
#[cfg(test)]
mod test;
mod walk;

use std::ops::ControlFlow;

use bytes::Bytes;
use slab::Slab;

use find::NodeIdx;
use node::{Node, Slot};

/// A compressed adaptive radix tree mapping byte-string keys to values of
/// type `V`.
///
/// Not thread-safe: the tree is `Send` when `V: Send` and is never `Sync` on
/// its own — wrap it (e.g. in a `Mutex`) for cross-thread sharing.
pub struct RadArt<V> {
    arena: Slab<Node<V>>,
    root: NodeIdx,
    len: usize,
}

impl<V> Default for RadArt<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RadArt<V> {
    /// Creates a new, empty tree.
    ///
    /// # Example
    ///
    /// ```rust
    /// use radart::RadArt;
    ///
    /// let tree: RadArt<u32> = RadArt::new();
    /// assert!(tree.is_empty());
    /// ```
    pub fn new() -> Self {
        let mut arena = Slab::with_capacity(1024);
        let root = arena.insert(Node::default()) as NodeIdx;
        Self { arena, root, len: 0 }
    }

    /// Builds a tree from an iterator of `(key, value)` pairs. Later entries
    /// for a duplicate key overwrite earlier ones, same as repeated
    /// [`RadArt::insert_or_replace`].
    pub fn from_mapping<K>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<[u8]>,
    {
        let mut tree = Self::new();
        for (key, value) in entries {
            tree.insert_or_replace(key.as_ref(), Some(value));
        }
        tree
    }

    /// Number of live keys in the tree (the absent-value marker still counts
    /// as a live key).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `value` at `key`, returning `true` if this created a new
    /// entry and `false` if `key` already had a value (left untouched; see
    /// [`RadArt::insert_or_replace`] to overwrite instead).
    ///
    /// `value: None` stores the absent-value marker: `key` becomes a live
    /// entry with no payload, distinguishable from a missing key via `get`'s
    /// presence flag.
    pub fn insert(&mut self, key: impl AsRef<[u8]>, value: Option<V>) -> bool {
        self.insert_impl(key.as_ref(), to_slot(value), false)
    }

    /// Like [`RadArt::insert`], but overwrites the value of an existing key
    /// instead of leaving it untouched.
    pub fn insert_or_replace(&mut self, key: impl AsRef<[u8]>, value: Option<V>) -> bool {
        self.insert_impl(key.as_ref(), to_slot(value), true)
    }

    fn insert_impl(&mut self, key: &[u8], value: Slot<V>, overwrite: bool) -> bool {
        let created = insert::insert(&mut self.arena, self.root, key, value, overwrite);
        if created {
            self.len += 1;
        }
        created
    }

    /// Looks up `key`. The first component is the stored payload (`None` for
    /// a key stored with the absent-value marker); the second is whether
    /// `key` is present at all.
    pub fn get(&self, key: impl AsRef<[u8]>) -> (Option<&V>, bool) {
        let key = key.as_ref();
        let found = find::find(&self.arena, self.root, key, find::no_visitor);
        if !found.is_exact(key.len()) {
            return (None, false);
        }
        let node = &self.arena[found.node as usize];
        if !node.has_value() {
            return (None, false);
        }
        (node.value.as_present(), true)
    }

    /// Removes `key`, returning the previously stored value (or `None` for
    /// the absent-value marker) and whether anything was removed.
    pub fn delete(&mut self, key: impl AsRef<[u8]>) -> (Option<V>, bool) {
        let (slot, removed) = delete::delete(&mut self.arena, self.root, key.as_ref());
        if removed {
            self.len -= 1;
        }
        (slot.into_public().0, removed)
    }

    /// Removes every key under `prefix` (including a key equal to `prefix`
    /// itself). Returns the number of entries removed.
    pub fn delete_prefix(&mut self, prefix: impl AsRef<[u8]>) -> usize {
        let removed = delete::delete_prefix(&mut self.arena, self.root, prefix.as_ref());
        self.len -= removed;
        removed
    }

    /// The longest stored key that is a prefix of `key`, if any.
    pub fn longest_prefix(&self, key: impl AsRef<[u8]>) -> Option<(Bytes, Option<V>)>
    where
        V: Clone,
    {
        walk::longest_prefix(&self.arena, self.root, key.as_ref())
            .map(|found| (Bytes::from(found.key), found.value))
    }

    /// The lexicographically smallest live key, if the tree is non-empty.
    pub fn minimum(&self) -> Option<(Bytes, Option<V>)>
    where
        V: Clone,
    {
        walk::minimum(&self.arena, self.root).map(|found| (Bytes::from(found.key), found.value))
    }

    /// The lexicographically largest live key, if the tree is non-empty.
    pub fn maximum(&self) -> Option<(Bytes, Option<V>)>
    where
        V: Clone,
    {
        walk::maximum(&self.arena, self.root).map(|found| (Bytes::from(found.key), found.value))
    }

    /// Visits every `(key, value)` pair in the tree. `visit` returning
    /// [`ControlFlow::Break`] stops the walk early.
    pub fn walk(&self, mut visit: impl FnMut(&[u8], Option<&V>) -> ControlFlow<()>) {
        walk::walk(&self.arena, self.root, &[], &mut visit);
    }

    /// Visits every `(key, value)` pair whose key starts with `prefix`.
    pub fn walk_prefix(&self, prefix: impl AsRef<[u8]>, mut visit: impl FnMut(&[u8], Option<&V>) -> ControlFlow<()>) {
        walk::walk_prefix(&self.arena, self.root, prefix.as_ref(), &mut visit);
    }

    /// Visits every live key that is itself a prefix of `key`, in ascending
    /// length order.
    pub fn walk_path(&self, key: impl AsRef<[u8]>, mut visit: impl FnMut(&[u8], Option<&V>) -> ControlFlow<()>) {
        walk::walk_path(&self.arena, self.root, key.as_ref(), &mut visit);
    }

    /// Collects every entry into a `Vec<(Bytes, Option<V>)>`, the inverse of
    /// [`RadArt::from_mapping`].
    pub fn to_mapping(&self) -> Vec<(Bytes, Option<V>)>
    where
        V: Clone,
    {
        let mut out = Vec::with_capacity(self.len);
        self.walk(|key, value| {
            out.push((Bytes::copy_from_slice(key), value.cloned()));
            ControlFlow::Continue(())
        });
        out
    }
}

fn to_slot<V>(value: Option<V>) -> Slot<V> {
    match value {
        Some(v) => Slot::Present(v),
        None => Slot::PresentAbsent,
    }
}
