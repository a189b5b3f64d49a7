//! # Trees
//!
//! A [`Tree`] is nested data: leaves hold values, branches hold children
//! addressed by [`Key`]s. Two branch kinds are built in (ordered sequences
//! and insertion-ordered maps); anything else can join by implementing
//! [`TreeNode`].
//!
//! ## Decomposition
//!
//! [`treedef`] resolves how a node splits into keys and children. Resolution
//! order is fixed:
//!
//! 1. a [`Tree::Node`] carries its own strategy (the [`TreeNode`] impl),
//! 2. [`Tree::Map`] and [`Tree::Seq`] use the built-in strategies,
//! 3. a [`Tree::Leaf`] is not decomposable.
//!
//! New kinds of branch are added by implementing [`TreeNode`] on a new type.
//! The dispatch above never changes.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::TreeError;
use crate::key::Key;

/// A user-defined branch node.
///
/// Implementors expose their children by key and know how to rebuild an
/// instance of themselves from a (possibly different) set of keys and
/// children. `rebuild` may refuse key sets it cannot represent.
pub trait TreeNode<T>: fmt::Debug + Send + Sync {
    /// Name used in errors and rendering.
    fn type_name(&self) -> &str;

    /// Child keys, in iteration order.
    fn keys(&self) -> Vec<Key>;

    fn child(&self, key: &Key) -> Option<&Tree<T>>;

    /// Build a new node of the same kind.
    fn rebuild(&self, keys: Vec<Key>, children: Vec<Tree<T>>) -> Result<Tree<T>, TreeError>;
}

/// Nested data with leaves of type `T`.
#[derive(Debug, Clone)]
pub enum Tree<T> {
    Leaf(T),
    /// Ordered children keyed by `Key::Index`.
    Seq(Vec<Tree<T>>),
    /// Children keyed by name (or index), in insertion order.
    Map(IndexMap<Key, Tree<T>>),
    /// A branch with its own decomposition strategy.
    Node(Arc<dyn TreeNode<T>>),
}

impl<T> Tree<T> {
    pub fn leaf(value: T) -> Self {
        Tree::Leaf(value)
    }

    pub fn seq(children: impl IntoIterator<Item = Tree<T>>) -> Self {
        Tree::Seq(children.into_iter().collect())
    }

    pub fn map<K: Into<Key>>(entries: impl IntoIterator<Item = (K, Tree<T>)>) -> Self {
        Tree::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn empty_map() -> Self {
        Tree::Map(IndexMap::new())
    }

    pub fn node(node: impl TreeNode<T> + 'static) -> Self {
        Tree::Node(Arc::new(node))
    }

    /// True when no decomposition strategy applies.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&T> {
        match self {
            Tree::Leaf(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_leaf(self) -> Option<T> {
        match self {
            Tree::Leaf(value) => Some(value),
            _ => None,
        }
    }

    /// A branch with no children.
    pub fn is_empty_branch(&self) -> bool {
        match treedef(self) {
            Ok(def) => def.keys().is_empty(),
            Err(_) => false,
        }
    }

    /// Human-readable kind: `leaf`, `sequence`, `map`, or the node's type name.
    pub fn kind(&self) -> &str {
        match self {
            Tree::Leaf(_) => "leaf",
            Tree::Seq(_) => "sequence",
            Tree::Map(_) => "map",
            Tree::Node(node) => node.type_name(),
        }
    }

    /// Direct child under `key`, if this is a branch that has it.
    pub fn child(&self, key: &Key) -> Option<&Tree<T>> {
        treedef(self).ok()?.get(key)
    }

    /// Render with a custom leaf formatter.
    pub fn render(&self, leaf: &dyn Fn(&T) -> String) -> String {
        match self {
            Tree::Leaf(value) => leaf(value),
            Tree::Seq(items) => {
                let inner: Vec<String> = items.iter().map(|c| c.render(leaf)).collect();
                format!("[{}]", inner.join(", "))
            }
            Tree::Map(entries) => {
                let inner: Vec<String> = entries
                    .iter()
                    .map(|(k, c)| format!("{}: {}", k, c.render(leaf)))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Tree::Node(node) => {
                let inner: Vec<String> = node
                    .keys()
                    .iter()
                    .filter_map(|k| node.child(k).map(|c| format!("{}: {}", k, c.render(leaf))))
                    .collect();
                format!("{}{{{}}}", node.type_name(), inner.join(", "))
            }
        }
    }
}

impl<T: Clone> Tree<T> {
    /// Replace (or add) the child under `key`.
    ///
    /// Sequences accept an index equal to their length and grow by one.
    /// Maps and custom nodes append unknown keys.
    pub fn with_child(&self, key: Key, child: Tree<T>) -> Result<Tree<T>, TreeError> {
        let def = treedef(self)?;
        let mut keys = def.keys();
        let mut children: Vec<Tree<T>> = def.children().into_iter().map(|(_, c)| c.clone()).collect();
        match keys.iter().position(|k| *k == key) {
            Some(pos) => children[pos] = child,
            None => {
                if let TreeDef::Seq(items) = def {
                    if key.as_index() != Some(items.len()) {
                        return Err(TreeError::InvalidKey {
                            key,
                            node: def.kind().to_string(),
                        });
                    }
                }
                keys.push(key);
                children.push(child);
            }
        }
        def.create(keys, children)
    }

    /// Drop the child under `key`. Later sequence items shift down.
    pub fn without_child(&self, key: &Key) -> Result<Tree<T>, TreeError> {
        let def = treedef(self)?;
        let (keys, children): (Vec<Key>, Vec<Tree<T>>) = def
            .children()
            .into_iter()
            .filter(|(k, _)| k != key)
            .map(|(k, c)| (k, c.clone()))
            .unzip();
        if keys.len() == def.keys().len() {
            return Err(TreeError::KeyNotFound {
                key: key.clone(),
                path: def.kind().to_string(),
            });
        }
        def.create(keys, children)
    }
}

/// Resolved decomposition of one branch node.
pub enum TreeDef<'a, T> {
    Seq(&'a [Tree<T>]),
    Map(&'a IndexMap<Key, Tree<T>>),
    Node(&'a Arc<dyn TreeNode<T>>),
}

impl<'a, T> Clone for TreeDef<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for TreeDef<'a, T> {}

impl<'a, T> TreeDef<'a, T> {
    pub fn kind(&self) -> &'a str {
        match self {
            TreeDef::Seq(_) => "sequence",
            TreeDef::Map(_) => "map",
            TreeDef::Node(node) => node.type_name(),
        }
    }

    pub fn keys(&self) -> Vec<Key> {
        match self {
            TreeDef::Seq(items) => (0..items.len()).map(Key::Index).collect(),
            TreeDef::Map(entries) => entries.keys().cloned().collect(),
            TreeDef::Node(node) => node.keys(),
        }
    }

    pub fn get(&self, key: &Key) -> Option<&'a Tree<T>> {
        match self {
            TreeDef::Seq(items) => key.as_index().and_then(|i| items.get(i)),
            TreeDef::Map(entries) => entries.get(key),
            TreeDef::Node(node) => node.child(key),
        }
    }

    /// Keys paired with children, in iteration order.
    pub fn children(&self) -> Vec<(Key, &'a Tree<T>)> {
        match self {
            TreeDef::Seq(items) => items.iter().enumerate().map(|(i, c)| (Key::Index(i), c)).collect(),
            TreeDef::Map(entries) => entries.iter().map(|(k, c)| (k.clone(), c)).collect(),
            TreeDef::Node(node) => node
                .keys()
                .into_iter()
                .filter_map(|k| node.child(&k).map(|c| (k, c)))
                .collect(),
        }
    }

    /// Build a node of this kind. Sequences ignore `keys` and take the
    /// children in order.
    pub fn create(&self, keys: Vec<Key>, children: Vec<Tree<T>>) -> Result<Tree<T>, TreeError> {
        match self {
            TreeDef::Seq(_) => Ok(Tree::Seq(children)),
            TreeDef::Map(_) => {
                if keys.len() != children.len() {
                    return Err(TreeError::LeafCount {
                        expected: keys.len(),
                        got: children.len(),
                    });
                }
                Ok(Tree::Map(keys.into_iter().zip(children).collect()))
            }
            TreeDef::Node(node) => node.rebuild(keys, children),
        }
    }
}

/// Resolve the decomposition strategy for `tree`.
pub fn treedef<T>(tree: &Tree<T>) -> Result<TreeDef<'_, T>, TreeError> {
    match tree {
        Tree::Node(node) => Ok(TreeDef::Node(node)),
        Tree::Map(entries) => Ok(TreeDef::Map(entries)),
        Tree::Seq(items) => Ok(TreeDef::Seq(items)),
        Tree::Leaf(_) => Err(TreeError::NotDecomposable {
            kind: std::any::type_name::<T>().to_string(),
        }),
    }
}

/// True if `tree` has a decomposition strategy.
pub fn is_tree_like<T>(tree: &Tree<T>) -> bool {
    treedef(tree).is_ok()
}

impl<T: PartialEq> PartialEq for Tree<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Tree::Leaf(a), Tree::Leaf(b)) => a == b,
            (Tree::Seq(a), Tree::Seq(b)) => a == b,
            // IndexMap equality ignores insertion order.
            (Tree::Map(a), Tree::Map(b)) => a == b,
            (Tree::Node(a), Tree::Node(b)) => {
                let keys = a.keys();
                a.type_name() == b.type_name()
                    && keys.len() == b.keys().len()
                    && keys.iter().all(|k| match (a.child(k), b.child(k)) {
                        (Some(x), Some(y)) => x == y,
                        _ => false,
                    })
            }
            _ => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Display for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(&|leaf| format!("{:?}", leaf)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Pair {
        left: Tree<i32>,
        right: Tree<i32>,
    }

    impl TreeNode<i32> for Pair {
        fn type_name(&self) -> &str {
            "Pair"
        }

        fn keys(&self) -> Vec<Key> {
            vec![Key::from("left"), Key::from("right")]
        }

        fn child(&self, key: &Key) -> Option<&Tree<i32>> {
            match key.as_name()? {
                "left" => Some(&self.left),
                "right" => Some(&self.right),
                _ => None,
            }
        }

        fn rebuild(&self, keys: Vec<Key>, children: Vec<Tree<i32>>) -> Result<Tree<i32>, TreeError> {
            let mut it = keys.into_iter().zip(children);
            match (it.next(), it.next(), it.next()) {
                (Some((_, left)), Some((_, right)), None) => Ok(Tree::node(Pair { left, right })),
                _ => Err(TreeError::Rebuild {
                    node: "Pair".to_string(),
                    reason: "needs exactly two children".to_string(),
                }),
            }
        }
    }

    #[test]
    fn test_treedef_dispatch() {
        assert!(treedef(&Tree::leaf(1)).is_err());
        assert_eq!(treedef(&Tree::seq([Tree::leaf(1)])).unwrap().kind(), "sequence");
        assert_eq!(treedef(&Tree::<i32>::empty_map()).unwrap().kind(), "map");
        let pair = Tree::node(Pair {
            left: Tree::leaf(1),
            right: Tree::leaf(2),
        });
        assert_eq!(treedef(&pair).unwrap().kind(), "Pair");
        assert!(is_tree_like(&pair));
    }

    #[test]
    fn test_not_decomposable_names_leaf_type() {
        let err = treedef(&Tree::leaf(1u8)).err().unwrap();
        assert_eq!(
            err,
            TreeError::NotDecomposable {
                kind: "u8".to_string()
            }
        );
    }

    #[test]
    fn test_seq_create_ignores_keys() {
        let seq = Tree::seq([Tree::leaf(1), Tree::leaf(2)]);
        let def = treedef(&seq).unwrap();
        let rebuilt = def
            .create(vec![Key::from("whatever")], vec![Tree::leaf(3), Tree::leaf(4)])
            .unwrap();
        assert_eq!(rebuilt, Tree::seq([Tree::leaf(3), Tree::leaf(4)]));
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let a = Tree::map([("x", Tree::leaf(1)), ("y", Tree::leaf(2))]);
        let b = Tree::map([("y", Tree::leaf(2)), ("x", Tree::leaf(1))]);
        assert_eq!(a, b);
        assert_ne!(a, Tree::map([("x", Tree::leaf(1))]));
    }

    #[test]
    fn test_with_child_extends_seq_by_one() {
        let seq = Tree::seq([Tree::leaf(1)]);
        let grown = seq.with_child(Key::Index(1), Tree::leaf(2)).unwrap();
        assert_eq!(grown, Tree::seq([Tree::leaf(1), Tree::leaf(2)]));
        assert!(seq.with_child(Key::Index(5), Tree::leaf(2)).is_err());
        assert!(seq.with_child(Key::from("x"), Tree::leaf(2)).is_err());
    }

    #[test]
    fn test_custom_node_rebuild_rejects_bad_keys() {
        let pair = Tree::node(Pair {
            left: Tree::leaf(1),
            right: Tree::leaf(2),
        });
        let swapped = pair.with_child(Key::from("left"), Tree::leaf(10)).unwrap();
        assert_eq!(swapped.child(&Key::from("left")), Some(&Tree::leaf(10)));
        assert!(matches!(
            pair.without_child(&Key::from("left")),
            Err(TreeError::Rebuild { .. })
        ));
    }

    #[test]
    fn test_display() {
        let tree = Tree::map([("x", Tree::seq([Tree::leaf(1), Tree::leaf(2)]))]);
        assert_eq!(tree.to_string(), "{x: [1, 2]}");
    }
}
