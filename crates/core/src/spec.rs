//! # Specs
//!
//! A [`Spec`] is a tree that mirrors some data tree, with a [`Dims`] list
//! at each leaf naming the axes of the array found there. An absent leaf
//! means "nothing is said about this part of the data".
//!
//! ```text
//! data: {"signals": f32[64, 128], "positions": f32[128, 3]}
//! spec: {"signals": [time, receiver], "positions": [receiver, xyz]}
//! ```
//!
//! Specs are immutable values. Every operation returns a new spec.
//!
//! ## Pruning
//!
//! Removing dimensions can leave a whole branch describing nothing. Such a
//! branch is pruned, but only if the removal actually touched it: a branch
//! that already held only empty lists is left alone. Inside a mapping the
//! pruned entry disappears; inside a sequence or custom node it becomes an
//! absent leaf so later positions keep their meaning. The root is never
//! pruned.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;

use crate::dims::Dims;
use crate::error::{SpecError, TreeError};
use crate::key::{display_path, Key, Path};
use crate::lens::TreeLens;
use crate::tree::{treedef, Tree, TreeDef};

/// Leaf of a spec tree. `None` is absent.
pub type SpecLeaf = Option<Dims>;

#[derive(Debug, Clone, PartialEq)]
pub struct Spec {
    tree: Tree<SpecLeaf>,
}

impl Spec {
    pub fn new(tree: Tree<SpecLeaf>) -> Self {
        Self { tree }
    }

    /// A single dimension list.
    pub fn dims<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::new(Tree::Leaf(Some(Dims::new(names))))
    }

    /// An empty dimension list: an unnamed value with no tracked axes.
    pub fn scalar() -> Self {
        Self::new(Tree::Leaf(Some(Dims::empty())))
    }

    pub fn absent() -> Self {
        Self::new(Tree::Leaf(None))
    }

    pub fn map<K: Into<Key>>(entries: impl IntoIterator<Item = (K, Spec)>) -> Self {
        Self::new(Tree::map(entries.into_iter().map(|(k, s)| (k, s.tree))))
    }

    pub fn seq(items: impl IntoIterator<Item = Spec>) -> Self {
        Self::new(Tree::seq(items.into_iter().map(|s| s.tree)))
    }

    pub fn tree(&self) -> &Tree<SpecLeaf> {
        &self.tree
    }

    pub fn into_tree(self) -> Tree<SpecLeaf> {
        self.tree
    }

    /// True when the whole spec is a single dimension list (or absent).
    pub fn is_leaf(&self) -> bool {
        self.tree.is_leaf()
    }

    pub fn is_absent(&self) -> bool {
        matches!(self.tree, Tree::Leaf(None))
    }

    /// The dimension list, if this spec is one.
    pub fn as_dims(&self) -> Option<&Dims> {
        self.tree.as_leaf().and_then(Option::as_ref)
    }

    /// Sub-spec at `path`.
    pub fn get(&self, path: &[Key]) -> Result<Spec, SpecError> {
        Ok(Spec::new(self.tree.get(path)?.clone()))
    }

    /// Path-addressed view over the underlying tree.
    pub fn lens(&self) -> TreeLens<'_, SpecLeaf> {
        self.tree.lens()
    }

    /// Every dimension named anywhere, sorted.
    pub fn dimensions(&self) -> BTreeSet<String> {
        self.tree
            .leaf_values()
            .flatten()
            .flat_map(|dims| dims.iter().map(str::to_string))
            .collect()
    }

    pub fn has_dimension(&self, dim: &str) -> bool {
        self.tree.leaf_values().flatten().any(|dims| dims.contains(dim))
    }

    /// True if every one of `dims` is present.
    pub fn has_dimensions(&self, dims: &[&str]) -> bool {
        let present = self.dimensions();
        dims.iter().all(|d| present.contains(*d))
    }

    /// Tree mirroring this spec whose leaves hold the axis of `dim` in each
    /// dimension list (`None` where it does not occur or the leaf is absent).
    pub fn index_for(&self, dim: &str) -> Tree<Option<usize>> {
        self.tree
            .map_leaves(|leaf| leaf.as_ref().and_then(|dims| dims.position(dim)))
    }

    pub fn indices_for(&self, dims: &[&str]) -> Vec<Tree<Option<usize>>> {
        dims.iter().map(|d| self.index_for(d)).collect()
    }

    pub fn remove_dimension(&self, dim: &str) -> Spec {
        self.remove_dimensions(&[dim])
    }

    /// Remove every occurrence of each of `dims`, pruning branches the
    /// removal emptied.
    pub fn remove_dimensions(&self, dims: &[&str]) -> Spec {
        let (tree, _) = remove_inner(&self.tree, dims);
        Spec::new(tree)
    }

    /// Insert `dim` at `index` of the dimension list at `path`.
    ///
    /// A missing or absent location is treated as an empty list, so this
    /// can extend the spec. A branch at `path` is an error.
    pub fn add_dimension(&self, dim: &str, path: &[Key], index: usize) -> Result<Spec, SpecError> {
        let lens = self.tree.lens().at_path(path);
        let current = match lens.get() {
            None | Some(Tree::Leaf(None)) => Dims::empty(),
            Some(Tree::Leaf(Some(dims))) => dims.clone(),
            Some(_) => {
                return Err(SpecError::NotADimsLeaf {
                    path: display_path(path),
                    spec: self.to_string(),
                })
            }
        };
        let tree = lens.set(Tree::Leaf(Some(current.inserted(dim, index))))?;
        Ok(Spec::new(tree))
    }

    /// Rewrite every dimension list. Absent leaves stay absent.
    pub fn update_leaves(&self, f: impl Fn(&Dims) -> Dims) -> Spec {
        Spec::new(self.tree.map_leaves(|leaf| leaf.as_ref().map(&f)))
    }

    /// Overlay `replacements` onto this spec.
    ///
    /// - an absent leaf removes that location (pruning branches it empties),
    /// - a dimension list overwrites whatever is there,
    /// - a branch merges key by key, adding keys this spec lacks; over a
    ///   leaf or a missing location it is inserted whole.
    pub fn replace(&self, replacements: &Spec) -> Result<Spec, SpecError> {
        let replaced = replace_node(Some(&self.tree), &replacements.tree)?;
        Ok(Spec::new(replaced.unwrap_or_else(Tree::empty_map)))
    }

    /// A spec shaped exactly like `data`.
    ///
    /// A dimension list standing where the data has a whole subtree is
    /// broadcast to every leaf of that subtree; data the spec does not
    /// mention gets absent leaves. A spec branch standing where the data has
    /// a leaf is an error.
    pub fn conform<U>(&self, data: &Tree<U>) -> Result<Spec, SpecError> {
        let mut path = Vec::new();
        Ok(Spec::new(conform_node(&self.tree, data, &mut path)?))
    }
}

// Returns the rewritten node and whether any dimension list changed.
fn remove_inner(tree: &Tree<SpecLeaf>, dims: &[&str]) -> (Tree<SpecLeaf>, bool) {
    match tree {
        Tree::Leaf(None) => (Tree::Leaf(None), false),
        Tree::Leaf(Some(current)) => {
            let kept = dims.iter().fold(current.clone(), |acc, d| acc.without(d));
            let changed = kept.len() != current.len();
            (Tree::Leaf(Some(kept)), changed)
        }
        Tree::Map(entries) => {
            let mut out = IndexMap::new();
            let mut changed = false;
            for (key, child) in entries {
                let (child, child_changed) = remove_inner(child, dims);
                changed |= child_changed;
                if !(child_changed && describes_nothing(&child)) {
                    out.insert(key.clone(), child);
                }
            }
            (Tree::Map(out), changed)
        }
        Tree::Seq(_) | Tree::Node(_) => {
            let positional = match treedef(tree) {
                Ok(def) => def.children(),
                Err(_) => Vec::new(),
            };
            let mut out = Vec::new();
            let mut changed = false;
            for (key, child) in positional {
                let (child, child_changed) = remove_inner(child, dims);
                changed |= child_changed;
                if child_changed && describes_nothing(&child) {
                    out.push((key, Tree::Leaf(None)));
                } else {
                    out.push((key, child));
                }
            }
            let rebuilt = match tree {
                Tree::Seq(_) => Tree::Seq(out.into_iter().map(|(_, c)| c).collect()),
                _ => Tree::Map(out.into_iter().collect()),
            };
            (rebuilt, changed)
        }
    }
}

// A branch whose every leaf is empty or absent.
fn describes_nothing(tree: &Tree<SpecLeaf>) -> bool {
    !tree.is_leaf() && tree.leaf_values().all(|leaf| leaf.as_ref().map_or(true, Dims::is_empty))
}

fn replace_node(
    current: Option<&Tree<SpecLeaf>>,
    replacement: &Tree<SpecLeaf>,
) -> Result<Option<Tree<SpecLeaf>>, TreeError> {
    let Ok(repl_def) = treedef(replacement) else {
        return Ok(match replacement {
            Tree::Leaf(None) => None,
            other => Some(other.clone()),
        });
    };
    let base = current.and_then(|c| treedef(c).ok());
    let def = base.unwrap_or(repl_def);

    let mut keys = Vec::new();
    let mut children = Vec::new();
    let mut had_children = false;
    let mut place = |key: Key, child: Option<Tree<SpecLeaf>>| match (child, def) {
        (Some(child), _) => {
            keys.push(key);
            children.push(child);
        }
        (None, TreeDef::Map(_)) => {}
        (None, _) => {
            keys.push(key);
            children.push(Tree::Leaf(None));
        }
    };

    if let Some(base) = base {
        for (key, child) in base.children() {
            had_children = true;
            let next = match repl_def.get(&key) {
                Some(repl) => replace_node(Some(child), repl)?,
                None => Some(child.clone()),
            };
            place(key, next);
        }
    }
    for (key, repl) in repl_def.children() {
        if base.and_then(|b| b.get(&key)).is_some() {
            continue;
        }
        had_children = true;
        place(key, replace_node(None, repl)?);
    }

    if had_children && keys.is_empty() {
        return Ok(None);
    }
    Ok(Some(def.create(keys, children)?))
}

fn conform_node<U>(spec: &Tree<SpecLeaf>, data: &Tree<U>, path: &mut Path) -> Result<Tree<SpecLeaf>, SpecError> {
    if let Tree::Leaf(leaf) = spec {
        return Ok(data.map_leaves(|_| leaf.clone()));
    }
    let Ok(data_def) = treedef(data) else {
        if spec.leaf_values().next().is_none() {
            return Ok(Tree::Leaf(None));
        }
        return Err(SpecError::Conform {
            path: display_path(path),
            reason: format!("spec has a {} where the data has a leaf", spec.kind()),
        });
    };
    let spec_def = treedef(spec)?;
    let mut entries = Vec::new();
    for (key, child) in data_def.children() {
        path.push(key.clone());
        let conformed = match spec_def.get(&key) {
            Some(sub) => conform_node(sub, child, path)?,
            None => child.map_leaves(|_| None),
        };
        path.pop();
        entries.push((key, conformed));
    }
    Ok(match data_def {
        TreeDef::Seq(_) => Tree::Seq(entries.into_iter().map(|(_, c)| c).collect()),
        _ => Tree::Map(entries.into_iter().collect()),
    })
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.tree.render(&|leaf| match leaf {
            Some(dims) => dims.to_string(),
            None => "absent".to_string(),
        });
        write!(f, "Spec({})", rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    fn nested() -> Spec {
        Spec::map([
            ("foo", Spec::dims(["a", "b"])),
            ("bar", Spec::map([("baz", Spec::dims(["b"])), ("qux", Spec::dims(["c"]))])),
        ])
    }

    #[test]
    fn test_dimensions_and_membership() {
        let spec = nested();
        let dims: Vec<_> = spec.dimensions().into_iter().collect();
        assert_eq!(dims, vec!["a", "b", "c"]);
        assert!(spec.has_dimension("c"));
        assert!(!spec.has_dimension("z"));
        assert!(spec.has_dimensions(&["a", "c"]));
        assert!(!spec.has_dimensions(&["a", "z"]));
    }

    #[test]
    fn test_index_for() {
        let index = nested().index_for("b");
        assert_eq!(
            index,
            Tree::map([
                ("foo", Tree::leaf(Some(1))),
                ("bar", Tree::map([("baz", Tree::leaf(Some(0))), ("qux", Tree::leaf(None))])),
            ])
        );
    }

    #[test]
    fn test_remove_dimension_keeps_empty_leaves() {
        let spec = Spec::map([("foo", Spec::dims(["a", "b"])), ("bar", Spec::dims(["b"]))]);
        assert_eq!(
            spec.remove_dimension("b"),
            Spec::map([("foo", Spec::dims(["a"])), ("bar", Spec::scalar())])
        );
    }

    #[test]
    fn test_remove_dimension_prunes_emptied_branch() {
        let spec = Spec::map([
            ("foo", Spec::dims(["a"])),
            ("bar", Spec::map([("baz", Spec::dims(["b"])), ("qux", Spec::scalar())])),
        ]);
        assert_eq!(spec.remove_dimension("b"), Spec::map([("foo", Spec::dims(["a"]))]));
    }

    #[test]
    fn test_remove_dimension_leaves_untouched_empty_branch() {
        let spec = Spec::map([
            ("foo", Spec::dims(["a"])),
            ("bar", Spec::map([("baz", Spec::scalar())])),
        ]);
        assert!(spec.remove_dimension("a").tree().has_path(&path!["bar"]));
    }

    #[test]
    fn test_remove_dimension_in_sequence_keeps_positions() {
        let spec = Spec::seq([Spec::map([("x", Spec::dims(["a"]))]), Spec::dims(["b"])]);
        assert_eq!(
            spec.remove_dimension("a"),
            Spec::seq([Spec::absent(), Spec::dims(["b"])])
        );
    }

    #[test]
    fn test_add_dimension() {
        let spec = nested();
        let added = spec.add_dimension("z", &path!["bar", "baz"], 0).unwrap();
        assert_eq!(added.get(&path!["bar", "baz"]).unwrap(), Spec::dims(["z", "b"]));

        let extended = spec.add_dimension("z", &path!["new"], 3).unwrap();
        assert_eq!(extended.get(&path!["new"]).unwrap(), Spec::dims(["z"]));

        let err = spec.add_dimension("z", &path!["bar"], 0).unwrap_err();
        assert!(matches!(err, SpecError::NotADimsLeaf { .. }));
    }

    #[test]
    fn test_update_leaves_skips_absent() {
        let spec = Spec::map([("x", Spec::dims(["a"])), ("y", Spec::absent())]);
        let prefixed = spec.update_leaves(|dims| dims.inserted("n", 0));
        assert_eq!(
            prefixed,
            Spec::map([("x", Spec::dims(["n", "a"])), ("y", Spec::absent())])
        );
    }

    #[test]
    fn test_replace_removes_and_prunes() {
        let spec = Spec::map([
            ("foo", Spec::map([("baz", Spec::dims(["a"])), ("quaz", Spec::dims(["c"]))])),
            ("bar", Spec::dims(["b"])),
        ]);
        let one = spec
            .replace(&Spec::map([("foo", Spec::map([("baz", Spec::absent())]))]))
            .unwrap();
        assert_eq!(
            one,
            Spec::map([
                ("foo", Spec::map([("quaz", Spec::dims(["c"]))])),
                ("bar", Spec::dims(["b"])),
            ])
        );
        let both = spec
            .replace(&Spec::map([(
                "foo",
                Spec::map([("baz", Spec::absent()), ("quaz", Spec::absent())]),
            )]))
            .unwrap();
        assert_eq!(both, Spec::map([("bar", Spec::dims(["b"]))]));
    }

    #[test]
    fn test_replace_leaf_with_subtree_and_root() {
        let spec = Spec::map([("foo", Spec::dims(["a", "b"])), ("bar", Spec::dims(["b"]))]);
        let replaced = spec
            .replace(&Spec::map([("foo", Spec::map([("baz", Spec::scalar())]))]))
            .unwrap();
        assert_eq!(
            replaced,
            Spec::map([
                ("foo", Spec::map([("baz", Spec::scalar())])),
                ("bar", Spec::dims(["b"])),
            ])
        );
        let added = spec.replace(&Spec::map([("new", Spec::dims(["n"]))])).unwrap();
        assert_eq!(added.get(&path!["new"]).unwrap(), Spec::dims(["n"]));

        let seq = Spec::seq([Spec::dims(["a", "b"]), Spec::dims(["b"])]);
        assert_eq!(seq.replace(&Spec::dims(["a", "b"])).unwrap(), Spec::dims(["a", "b"]));
        assert_eq!(
            seq.replace(&Spec::seq([Spec::map([("foo", Spec::dims(["a"]))])])).unwrap(),
            Spec::seq([Spec::map([("foo", Spec::dims(["a"]))]), Spec::dims(["b"])])
        );
    }

    #[test]
    fn test_conform_broadcasts_and_fills_absent() {
        let spec = Spec::map([("x", Spec::dims(["a"]))]);
        let data = Tree::map([
            ("x", Tree::map([("re", Tree::leaf(0)), ("im", Tree::leaf(0))])),
            ("y", Tree::leaf(0)),
        ]);
        assert_eq!(
            spec.conform(&data).unwrap(),
            Spec::map([
                ("x", Spec::map([("re", Spec::dims(["a"])), ("im", Spec::dims(["a"]))])),
                ("y", Spec::absent()),
            ])
        );
    }

    #[test]
    fn test_conform_rejects_deeper_spec() {
        let spec = Spec::map([("x", Spec::map([("re", Spec::dims(["a"]))]))]);
        let data = Tree::map([("x", Tree::leaf(0))]);
        assert!(matches!(spec.conform(&data), Err(SpecError::Conform { .. })));
    }

    #[test]
    fn test_display() {
        let spec = Spec::map([("x", Spec::dims(["a", "b"])), ("y", Spec::absent())]);
        assert_eq!(spec.to_string(), "Spec({x: [a, b], y: absent})");
    }
}
