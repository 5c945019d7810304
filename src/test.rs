use std::collections::HashMap;
use std::ops::ControlFlow;

use bytes::Bytes;
use proptest::prelude::*;

use crate::RadArt;
use crate::find::NodeIdx;
use crate::node::Node;

/// Walks the whole tree checking the structural invariants that aren't
/// already enforced by construction: sorted branch edges, and no value-less
/// node with exactly one child whose own single child is *also* value-less
/// with exactly one child (a two-node dead chain that should have been one
/// compressed edge all along). A value-less node with a single child is, on
/// its own, perfectly ordinary path compression — it only becomes a
/// violation once its child is in the same state, since `is_branch()` and
/// `is_compressed()` can't even be told apart for a single-byte edge. The
/// root isn't exempt from this: it follows the same rule as every other
/// node, only invariant 4 (value-less leaf) singles it out.
fn audit<V>(tree: &RadArt<V>) {
    audit_node(&tree.arena, tree.root);
}

fn audit_node<V>(arena: &slab::Slab<Node<V>>, idx: NodeIdx) {
    let node = &arena[idx as usize];

    if node.is_branch() {
        assert!(
            node.edges.windows(2).all(|w| w[0] < w[1]),
            "branch edges not strictly ascending: {:?}",
            node.edges
        );
    }

    if node.children.len() == 1 && !node.has_value() {
        let child = &arena[node.children[0] as usize];
        assert!(
            !(child.children.len() == 1 && !child.has_value()),
            "value-less node at arena slot {idx} has a value-less single \
             child that should have been merged into one compressed edge"
        );
    }

    for &child in node.children.iter() {
        audit_node(arena, child);
    }
}

#[test]
fn test_get_set_basic() {
    let mut tree = RadArt::new();
    assert!(tree.insert(b"Joshua", Some("BOUCHAT")));
    assert_eq!(tree.get(b"Joshua"), (Some(&"BOUCHAT"), true));
}

#[test]
fn test_empty_key_stores_on_root() {
    let mut tree = RadArt::new();
    assert!(tree.insert(b"", Some("root_value")));
    assert_eq!(tree.get(b""), (Some(&"root_value"), true));
    assert!(!tree.is_empty());
}

#[test]
fn test_get_nonexistent() {
    let tree: RadArt<&str> = RadArt::new();
    assert_eq!(tree.get(b"missing"), (None, false));
}

#[test]
fn test_insert_does_not_overwrite() {
    let mut tree = RadArt::new();
    assert!(tree.insert(b"foo", Some(1)));
    assert!(!tree.insert(b"foo", Some(2)));
    assert_eq!(tree.get(b"foo"), (Some(&1), true));
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_insert_or_replace_overwrites() {
    let mut tree = RadArt::new();
    assert!(tree.insert_or_replace(b"foo", Some(1)));
    assert!(!tree.insert_or_replace(b"foo", Some(2)));
    assert_eq!(tree.get(b"foo"), (Some(&2), true));
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_absent_value_marker_is_distinguishable_from_missing() {
    let mut tree: RadArt<&str> = RadArt::new();
    assert!(tree.insert(b"foo", None));
    assert_eq!(tree.get(b"foo"), (None, true));
    assert_eq!(tree.get(b"bar"), (None, false));
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_common_prefix_split() {
    let mut tree = RadArt::new();
    tree.insert(b"user", Some("val_user"));
    tree.insert(b"uso", Some("val_uso"));

    assert_eq!(tree.get(b"user"), (Some(&"val_user"), true));
    assert_eq!(tree.get(b"uso"), (Some(&"val_uso"), true));
    assert_eq!(tree.get(b"us"), (None, false));
    audit(&tree);
}

#[test]
fn test_prefix_is_also_key() {
    let mut tree = RadArt::new();
    tree.insert(b"user", Some("val_user"));
    tree.insert(b"us", Some("val_us"));

    assert_eq!(tree.get(b"user"), (Some(&"val_user"), true));
    assert_eq!(tree.get(b"us"), (Some(&"val_us"), true));
    audit(&tree);
}

#[test]
fn test_large_alphabetical_scenario() {
    let keys = [
        "alligator",
        "alien",
        "baloon",
        "chromodynamic",
        "romane",
        "romanus",
        "romulus",
        "rubens",
        "ruber",
        "rubicon",
        "rubicundus",
        "all",
        "rub",
        "ba",
    ];
    let mut tree = RadArt::new();
    for k in keys {
        assert!(tree.insert(k.as_bytes(), Some(k)));
    }
    assert_eq!(tree.len(), keys.len());

    for k in keys {
        assert_eq!(tree.get(k.as_bytes()), (Some(&k), true));
    }

    let (min_key, _) = tree.minimum().unwrap();
    assert!(min_key.starts_with(b"all"));
    let (max_key, _) = tree.maximum().unwrap();
    assert!(max_key.starts_with(b"rubicundus"));

    let mut under_rub = Vec::new();
    tree.walk_prefix(b"rub", |key, _| {
        under_rub.push(Bytes::copy_from_slice(key));
        ControlFlow::Continue(())
    });
    under_rub.sort();
    let mut expected: Vec<Bytes> = ["rub", "rubens", "ruber", "rubicon", "rubicundus"]
        .iter()
        .map(|s| Bytes::copy_from_slice(s.as_bytes()))
        .collect();
    expected.sort();
    assert_eq!(under_rub, expected);

    audit(&tree);
}

#[test]
fn test_walk_prefix_early_stop() {
    let mut tree = RadArt::new();
    for (k, v) in [("foo", 1), ("foof", 2), ("foobar", 3), ("foofoo", 4), ("foojin", 6), ("bar", 7), ("jin", 8)] {
        tree.insert(k.as_bytes(), Some(v));
    }

    let mut seen = Vec::new();
    tree.walk_prefix(b"foo", |key, value| {
        seen.push((Bytes::copy_from_slice(key), *value.unwrap()));
        ControlFlow::Continue(())
    });
    seen.sort();
    let mut expected: Vec<(Bytes, i32)> = [("foo", 1), ("foof", 2), ("foobar", 3), ("foofoo", 4), ("foojin", 6)]
        .iter()
        .map(|(k, v)| (Bytes::copy_from_slice(k.as_bytes()), *v))
        .collect();
    expected.sort();
    assert_eq!(seen, expected);

    let mut stopped_early = Vec::new();
    tree.walk_prefix(b"foo", |key, value| {
        stopped_early.push((Bytes::copy_from_slice(key), *value.unwrap()));
        ControlFlow::Break(())
    });
    assert_eq!(stopped_early.len(), 1);
}

#[test]
fn test_walk_path_visits_ascending_prefix_chain() {
    let mut tree = RadArt::new();
    for k in [
        "foo",
        "foo/bar",
        "foo/bar/jin",
        "foo/bar/jin/foofoo",
        "foo/bar/jin/foofoo/barbar",
        "foo/bar/jin/foofoo/barbar/jinjin",
    ] {
        tree.insert(k.as_bytes(), Some(9u32));
    }
    tree.insert(b"foo/bar/bar", Some(7));
    tree.insert(b"foo/jin/foofoo", Some(8));
    tree.insert(b"f/j/b", Some(9));

    let mut visited = Vec::new();
    tree.walk_path(b"foo/bar/jin/foofoo/barbar/jinjin", |key, _| {
        visited.push(Bytes::copy_from_slice(key));
        ControlFlow::Continue(())
    });

    let expected: Vec<Bytes> = [
        "foo",
        "foo/bar",
        "foo/bar/jin",
        "foo/bar/jin/foofoo",
        "foo/bar/jin/foofoo/barbar",
        "foo/bar/jin/foofoo/barbar/jinjin",
    ]
    .iter()
    .map(|s| Bytes::copy_from_slice(s.as_bytes()))
    .collect();
    assert_eq!(visited, expected);
}

#[test]
fn test_longest_prefix() {
    let mut tree = RadArt::new();
    tree.insert(b"foo", Some("1"));
    tree.insert(b"foobar", Some("2"));
    tree.insert(b"foofoo", Some("3"));
    tree.insert(b"barbar", None);
    tree.insert(b"barfoo", Some("foo"));
    tree.insert(b"barbarbar", Some("bar"));
    tree.insert(b"foobarfoo", Some("foo"));

    assert_eq!(
        tree.longest_prefix(b"barbarbarbarbar"),
        Some((Bytes::copy_from_slice(b"barbarbar"), Some("bar")))
    );
    assert_eq!(
        tree.longest_prefix(b"foobarfoofoo"),
        Some((Bytes::copy_from_slice(b"foobarfoo"), Some("foo")))
    );
    assert_eq!(tree.longest_prefix(b"nope"), None);
}

#[test]
fn test_delete_basic() {
    let mut tree = RadArt::new();
    tree.insert(b"key", Some("value"));
    assert_eq!(tree.delete(b"key"), (Some("value"), true));
    assert_eq!(tree.get(b"key"), (None, false));
    assert!(tree.is_empty());
}

#[test]
fn test_delete_nonexistent() {
    let mut tree: RadArt<&str> = RadArt::new();
    assert_eq!(tree.delete(b"missing"), (None, false));
}

#[test]
fn test_delete_empty_key() {
    let mut tree = RadArt::new();
    tree.insert(b"", Some("root"));
    assert_eq!(tree.delete(b""), (Some("root"), true));
    assert_eq!(tree.get(b""), (None, false));
}

#[test]
fn test_delete_with_recompression() {
    let mut tree = RadArt::new();
    tree.insert(b"romane", Some(1));
    tree.insert(b"romanus", Some(2));
    tree.insert(b"romulus", Some(3));
    audit(&tree);

    assert_eq!(tree.delete(b"romanus"), (Some(2), true));
    assert_eq!(tree.get(b"romane"), (Some(&1), true));
    assert_eq!(tree.get(b"romulus"), (Some(&3), true));
    assert_eq!(tree.get(b"romanus"), (None, false));
    audit(&tree);
}

#[test]
fn test_delete_intermediate_node_with_children() {
    let mut tree = RadArt::new();
    tree.insert(b"us", Some("val_us"));
    tree.insert(b"user", Some("val_user"));
    tree.insert(b"uso", Some("val_uso"));

    assert_eq!(tree.delete(b"us"), (Some("val_us"), true));
    assert_eq!(tree.get(b"user"), (Some(&"val_user"), true));
    assert_eq!(tree.get(b"uso"), (Some(&"val_uso"), true));
    assert_eq!(tree.get(b"us"), (None, false));
    audit(&tree);
}

#[test]
fn test_delete_then_reinsert() {
    let mut tree = RadArt::new();
    tree.insert(b"key", Some(1));
    tree.delete(b"key");
    assert!(tree.insert(b"key", Some(2)));
    assert_eq!(tree.get(b"key"), (Some(&2), true));
}

#[test]
fn test_delete_all_keys_leaves_empty_tree() {
    let keys = ["romane", "romanus", "romulus", "rubens", "ruber"];
    let mut tree = RadArt::new();
    for k in keys {
        tree.insert(k.as_bytes(), Some(()));
    }
    for k in keys {
        assert_eq!(tree.delete(k.as_bytes()), (Some(()), true));
    }
    assert!(tree.is_empty());
    assert_eq!(tree.minimum(), None);
    audit(&tree);
}

#[test]
fn test_delete_prefix() {
    let mut tree = RadArt::new();
    for (k, v) in [("foo", 1), ("foobar", 2), ("foofoo", 3), ("bar", 4), ("baz", 5)] {
        tree.insert(k.as_bytes(), Some(v));
    }

    let removed = tree.delete_prefix(b"foo");
    assert_eq!(removed, 3);
    assert_eq!(tree.get(b"foo"), (None, false));
    assert_eq!(tree.get(b"foobar"), (None, false));
    assert_eq!(tree.get(b"foofoo"), (None, false));
    assert_eq!(tree.get(b"bar"), (Some(&4), true));
    assert_eq!(tree.get(b"baz"), (Some(&5), true));
    assert_eq!(tree.len(), 2);
    audit(&tree);
}

#[test]
fn test_delete_prefix_no_match() {
    let mut tree = RadArt::new();
    tree.insert(b"foo", Some(1));
    assert_eq!(tree.delete_prefix(b"nope"), 0);
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_mapping_roundtrip() {
    let entries = vec![
        (Bytes::copy_from_slice(b"foo"), 1),
        (Bytes::copy_from_slice(b"foobar"), 2),
        (Bytes::copy_from_slice(b"bar"), 3),
    ];
    let tree = RadArt::from_mapping(entries.clone());
    assert_eq!(tree.len(), 3);

    let mut mapping = tree.to_mapping();
    mapping.sort_by(|a, b| a.0.cmp(&b.0));
    let mut expected: Vec<(Bytes, Option<i32>)> = entries.into_iter().map(|(k, v)| (k, Some(v))).collect();
    expected.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(mapping, expected);
}

#[derive(Debug, Clone)]
enum Op {
    Insert(Vec<u8>, i32),
    Delete(Vec<u8>),
    Get(Vec<u8>),
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    // A tight 3-letter alphabet forces shared prefixes and frequent splits.
    prop::collection::vec(0u8..3, 0..16)
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (key_strategy(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        key_strategy().prop_map(Op::Delete),
        key_strategy().prop_map(Op::Get),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn stress_random_ops_preserve_invariants(ops in prop::collection::vec(op_strategy(), 1..300)) {
        let mut tree = RadArt::new();
        let mut model: HashMap<Vec<u8>, i32> = HashMap::new();

        for op in ops {
            match op {
                Op::Insert(key, val) => {
                    let created = tree.insert(key.clone(), Some(val));
                    let existed = model.contains_key(&key);
                    prop_assert_eq!(created, !existed);
                    model.entry(key).or_insert(val);
                }
                Op::Delete(key) => {
                    let (removed, existed) = tree.delete(key.clone());
                    let expected = model.remove(&key);
                    prop_assert_eq!(existed, expected.is_some());
                    if let Some(expected_val) = expected {
                        prop_assert_eq!(removed, Some(expected_val));
                    }
                }
                Op::Get(key) => {
                    let (val, present) = tree.get(&key);
                    match model.get(&key) {
                        Some(v) => {
                            prop_assert!(present);
                            prop_assert_eq!(val, Some(v));
                        }
                        None => prop_assert!(!present),
                    }
                }
            }
            prop_assert_eq!(tree.len(), model.len());
            audit(&tree);
        }

        for (key, val) in &model {
            prop_assert_eq!(tree.get(key), (Some(val), true));
        }

        let mut mapping = tree.to_mapping();
        mapping.sort_by(|a, b| a.0.cmp(&b.0));
        let mut expected: Vec<(Bytes, Option<i32>)> =
            model.iter().map(|(k, v)| (Bytes::copy_from_slice(k), Some(*v))).collect();
        expected.sort_by(|a, b| a.0.cmp(&b.0));
        prop_assert_eq!(mapping, expected);
    }
}
