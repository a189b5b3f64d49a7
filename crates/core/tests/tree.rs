//! # Tree Tests
//!
//! Tests for the tree layer:
//! - Custom branch kinds registered through `TreeNode`
//! - Path access and lenses across built-in and custom nodes
//! - Flatten/unflatten and merge laws (property-based)

use dimflow_core::{
    flatten, flatten_values, merge, merge_by, path, treedef, Key, Tree, TreeError, TreeNode,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ============================================================================
// A user-defined branch kind
// ============================================================================

/// A fixed-field record: `{re, im}`.
#[derive(Debug)]
struct Complex<T> {
    re: Tree<T>,
    im: Tree<T>,
}

impl<T: Clone + std::fmt::Debug + Send + Sync + 'static> TreeNode<T> for Complex<T> {
    fn type_name(&self) -> &str {
        "Complex"
    }

    fn keys(&self) -> Vec<Key> {
        vec![Key::from("re"), Key::from("im")]
    }

    fn child(&self, key: &Key) -> Option<&Tree<T>> {
        match key.as_name()? {
            "re" => Some(&self.re),
            "im" => Some(&self.im),
            _ => None,
        }
    }

    fn rebuild(&self, keys: Vec<Key>, children: Vec<Tree<T>>) -> Result<Tree<T>, TreeError> {
        let mut re = None;
        let mut im = None;
        for (key, child) in keys.into_iter().zip(children) {
            match key.as_name() {
                Some("re") => re = Some(child),
                Some("im") => im = Some(child),
                _ => {
                    return Err(TreeError::Rebuild {
                        node: "Complex".to_string(),
                        reason: format!("unknown field `{}`", key),
                    })
                }
            }
        }
        match (re, im) {
            (Some(re), Some(im)) => Ok(Tree::node(Complex { re, im })),
            _ => Err(TreeError::Rebuild {
                node: "Complex".to_string(),
                reason: "both `re` and `im` are required".to_string(),
            }),
        }
    }
}

fn complex(re: i32, im: i32) -> Tree<i32> {
    Tree::node(Complex {
        re: Tree::leaf(re),
        im: Tree::leaf(im),
    })
}

// ============================================================================
// Custom Node Tests
// ============================================================================

#[test]
fn test_custom_node_dispatch_and_access() {
    let tree = Tree::map([("z", complex(1, 2)), ("w", Tree::leaf(3))]);
    assert_eq!(treedef(tree.get(&path!["z"]).unwrap()).unwrap().kind(), "Complex");
    assert_eq!(tree.get(&path!["z", "im"]).unwrap(), &Tree::leaf(2));
}

#[test]
fn test_custom_node_set_rebuilds_same_kind() {
    let tree = Tree::map([("z", complex(1, 2))]);
    let updated = tree.set(&path!["z", "re"], Tree::leaf(10)).unwrap();
    assert_eq!(updated.get(&path!["z"]).unwrap(), &complex(10, 2));
    assert_eq!(tree.get(&path!["z"]).unwrap(), &complex(1, 2));
}

#[test]
fn test_custom_node_refuses_unknown_field() {
    let tree = complex(1, 2);
    let err = tree.set(&path!["phase"], Tree::leaf(0)).unwrap_err();
    assert!(matches!(err, TreeError::Rebuild { .. }));
}

#[test]
fn test_custom_node_flatten_round_trip() {
    let tree = Tree::seq([complex(1, 2), complex(3, 4)]);
    let (values, unflatten) = flatten_values(&tree);
    assert_eq!(values, vec![1, 2, 3, 4]);
    let doubled = unflatten.unflatten_values(values.iter().map(|v| v * 2).collect()).unwrap();
    assert_eq!(doubled, Tree::seq([complex(2, 4), complex(6, 8)]));
}

#[test]
fn test_type_changing_map_mirrors_custom_node() {
    let tree = complex(1, 2);
    let labels = tree.map_leaves(|v| format!("#{}", v));
    assert_eq!(
        labels,
        Tree::map([("re", Tree::leaf("#1".to_string())), ("im", Tree::leaf("#2".to_string()))])
    );
}

#[test]
fn test_merge_by_keeps_custom_nodes() {
    let trees = vec![complex(1, 2), complex(10, 20)];
    let summed: Result<_, TreeError> = merge_by(&trees, |xs| Ok(xs.into_iter().sum()));
    assert_eq!(summed.unwrap(), complex(11, 22));
    let collected = merge(&trees).unwrap();
    assert_eq!(collected.get(&path!["im"]).unwrap(), &Tree::leaf(vec![2, 20]));
}

// ============================================================================
// Property Tests
// ============================================================================

fn arb_tree() -> impl Strategy<Value = Tree<i32>> {
    let leaf = any::<i32>().prop_map(Tree::leaf);
    leaf.prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Tree::Seq),
            prop::collection::vec(("[a-e]", inner), 0..4).prop_map(|entries| Tree::map(entries)),
        ]
    })
}

proptest! {
    #[test]
    fn prop_flatten_round_trip(tree in arb_tree()) {
        let (leaves, unflatten) = flatten_values(&tree);
        prop_assert_eq!(unflatten.unflatten_values(leaves).unwrap(), tree);
    }

    #[test]
    fn prop_flatten_with_predicate_round_trip(tree in arb_tree()) {
        let (leaves, unflatten) = flatten(&tree, |node| matches!(node, Tree::Seq(_)));
        prop_assert_eq!(unflatten.unflatten(leaves).unwrap(), tree);
    }

    #[test]
    fn prop_identity_traverse(tree in arb_tree()) {
        let same: Result<_, TreeError> = tree.traverse(|_| false, Ok);
        prop_assert_eq!(same.unwrap(), tree);
    }

    #[test]
    fn prop_leaves_match_flatten_order(tree in arb_tree()) {
        let from_iter: Vec<i32> = tree.leaf_values().copied().collect();
        let (flat, _) = flatten_values(&tree);
        prop_assert_eq!(from_iter, flat);
    }
}
