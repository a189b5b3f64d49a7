//! # Core Tree Operations
//!
//! Path access (`get`, `set`, `update`, `remove`), structural rewrites
//! (`traverse`, `traverse_zip`) and leaf maps. All operations return new
//! trees; inputs are never mutated.
//!
//! ## Traversal order
//!
//! Traversal is post-order and left-to-right: children are rewritten first,
//! the branch is rebuilt from the rewritten children, then the callback sees
//! the rebuilt branch. Leaves are therefore visited in the same order as
//! [`flatten`](crate::flatten::flatten) returns them.

use std::convert::Infallible;

use indexmap::IndexMap;

use crate::error::TreeError;
use crate::key::{display_path, Key, Path};
use crate::tree::{treedef, Tree};

impl<T: Clone> Tree<T> {
    /// Node at `path`, or `KeyNotFound` naming the first missing key.
    pub fn get(&self, path: &[Key]) -> Result<&Tree<T>, TreeError> {
        self.lens().at_path(path).try_get()
    }

    /// Node at `path`, or `default` if any key along the way is missing.
    pub fn get_or<'a>(&'a self, path: &[Key], default: &'a Tree<T>) -> &'a Tree<T> {
        self.lens().at_path(path).get().unwrap_or(default)
    }

    pub fn has_path(&self, path: &[Key]) -> bool {
        self.lens().at_path(path).exists()
    }

    /// Replace the node at `path`. Missing keys are created as maps.
    pub fn set(&self, path: &[Key], value: Tree<T>) -> Result<Tree<T>, TreeError> {
        self.lens().at_path(path).set(value)
    }

    /// Apply `f` to the node at `path`. A missing node is passed as an
    /// empty map.
    pub fn update<E>(
        &self,
        path: &[Key],
        f: impl FnOnce(Tree<T>) -> Result<Tree<T>, E>,
    ) -> Result<Tree<T>, E>
    where
        E: From<TreeError>,
    {
        self.lens().at_path(path).update(f)
    }

    pub fn remove(&self, path: &[Key]) -> Result<Tree<T>, TreeError> {
        self.lens().at_path(path).remove()
    }

    /// Rewrite every node, post-order.
    ///
    /// Recursion stops at leaves and at nodes for which `should_stop` holds;
    /// those are handed to `f` whole.
    pub fn traverse<E, S, F>(&self, should_stop: S, mut f: F) -> Result<Tree<T>, E>
    where
        E: From<TreeError>,
        S: Fn(&Tree<T>) -> bool,
        F: FnMut(Tree<T>) -> Result<Tree<T>, E>,
    {
        self.traverse_inner(&should_stop, &mut f)
    }

    fn traverse_inner<E, S, F>(&self, should_stop: &S, f: &mut F) -> Result<Tree<T>, E>
    where
        E: From<TreeError>,
        S: Fn(&Tree<T>) -> bool,
        F: FnMut(Tree<T>) -> Result<Tree<T>, E>,
    {
        if should_stop(self) {
            return f(self.clone());
        }
        let Ok(def) = treedef(self) else {
            return f(self.clone());
        };
        let mut keys = Vec::new();
        let mut children = Vec::new();
        for (key, child) in def.children() {
            children.push(child.traverse_inner(should_stop, f)?);
            keys.push(key);
        }
        let rebuilt = def.create(keys, children)?;
        f(rebuilt)
    }

    /// Rewrite this tree while walking `others` alongside it.
    ///
    /// The other trees must branch exactly like `self` down to wherever
    /// recursion stops; `f` receives each node of `self` together with the
    /// matching nodes of `others`.
    pub fn traverse_zip<U, E, S, F>(&self, others: &[&Tree<U>], should_stop: S, mut f: F) -> Result<Tree<T>, E>
    where
        E: From<TreeError>,
        S: Fn(&Tree<T>, &[&Tree<U>]) -> bool,
        F: FnMut(Tree<T>, &[&Tree<U>]) -> Result<Tree<T>, E>,
    {
        let mut path = Vec::new();
        self.traverse_zip_inner(others, &should_stop, &mut f, &mut path)
    }

    fn traverse_zip_inner<U, E, S, F>(
        &self,
        others: &[&Tree<U>],
        should_stop: &S,
        f: &mut F,
        path: &mut Path,
    ) -> Result<Tree<T>, E>
    where
        E: From<TreeError>,
        S: Fn(&Tree<T>, &[&Tree<U>]) -> bool,
        F: FnMut(Tree<T>, &[&Tree<U>]) -> Result<Tree<T>, E>,
    {
        if should_stop(self, others) {
            return f(self.clone(), others);
        }
        let Ok(def) = treedef(self) else {
            return f(self.clone(), others);
        };
        let count = def.keys().len();
        let mut other_defs = Vec::with_capacity(others.len());
        for other in others {
            let other_def = treedef(*other).map_err(|_| TreeError::Incongruent {
                path: display_path(path),
                reason: format!("expected a {} with {} children, found a leaf", def.kind(), count),
            })?;
            if other_def.keys().len() != count {
                return Err(TreeError::Incongruent {
                    path: display_path(path),
                    reason: format!("{} children vs {}", count, other_def.keys().len()),
                }
                .into());
            }
            other_defs.push(other_def);
        }

        let mut keys = Vec::with_capacity(count);
        let mut children = Vec::with_capacity(count);
        for (key, child) in def.children() {
            let mut matched = Vec::with_capacity(other_defs.len());
            for other_def in &other_defs {
                let other_child = other_def.get(&key).ok_or_else(|| TreeError::Incongruent {
                    path: display_path(path),
                    reason: format!("key `{}` missing from one of the trees", key),
                })?;
                matched.push(other_child);
            }
            path.push(key.clone());
            let rewritten = child.traverse_zip_inner(&matched, should_stop, f, path)?;
            path.pop();
            children.push(rewritten);
            keys.push(key);
        }
        let rebuilt = def.create(keys, children)?;
        f(rebuilt, others)
    }

    /// Drop branches left without any children. The root is kept.
    pub fn prune_empty(&self) -> Result<Tree<T>, TreeError> {
        let Ok(def) = treedef(self) else {
            return Ok(self.clone());
        };
        let mut keys = Vec::new();
        let mut children = Vec::new();
        for (key, child) in def.children() {
            let pruned = child.prune_empty()?;
            if !pruned.is_empty_branch() {
                keys.push(key);
                children.push(pruned);
            }
        }
        def.create(keys, children)
    }

    /// Keep only the leaves for which `keep` holds.
    pub fn filter_leaves(&self, keep: impl Fn(&T) -> bool) -> Result<Tree<T>, TreeError> {
        self.filter_inner(&keep)
    }

    fn filter_inner(&self, keep: &impl Fn(&T) -> bool) -> Result<Tree<T>, TreeError> {
        let Ok(def) = treedef(self) else {
            return Ok(self.clone());
        };
        let mut keys = Vec::new();
        let mut children = Vec::new();
        for (key, child) in def.children() {
            if let Some(value) = child.as_leaf() {
                if !keep(value) {
                    continue;
                }
            }
            keys.push(key);
            children.push(child.filter_inner(keep)?);
        }
        def.create(keys, children)
    }
}

impl<T> Tree<T> {
    /// Map every leaf to a new type. Custom nodes are mirrored as maps with
    /// the same keys in the same order.
    pub fn map_leaves<U>(&self, mut f: impl FnMut(&T) -> U) -> Tree<U> {
        let result: Result<Tree<U>, Infallible> = self.try_map_leaves(|_, leaf| Ok(f(leaf)));
        match result {
            Ok(tree) => tree,
            Err(never) => match never {},
        }
    }

    /// Fallible leaf map; `f` also receives the leaf's path.
    pub fn try_map_leaves<U, E>(&self, mut f: impl FnMut(&Path, &T) -> Result<U, E>) -> Result<Tree<U>, E> {
        let mut path = Vec::new();
        self.try_map_inner(&mut f, &mut path)
    }

    fn try_map_inner<U, E, F>(&self, f: &mut F, path: &mut Path) -> Result<Tree<U>, E>
    where
        F: FnMut(&Path, &T) -> Result<U, E>,
    {
        match self {
            Tree::Leaf(value) => Ok(Tree::Leaf(f(path, value)?)),
            Tree::Seq(items) => {
                let children = items.iter().enumerate().map(|(i, c)| (Key::Index(i), c)).collect();
                let mapped = Self::try_map_children(children, f, path)?;
                Ok(Tree::Seq(mapped.into_iter().map(|(_, c)| c).collect()))
            }
            Tree::Map(entries) => {
                let children = entries.iter().map(|(k, c)| (k.clone(), c)).collect();
                let mapped = Self::try_map_children(children, f, path)?;
                Ok(Tree::Map(mapped.into_iter().collect::<IndexMap<_, _>>()))
            }
            Tree::Node(node) => {
                let children = node
                    .keys()
                    .into_iter()
                    .filter_map(|k| node.child(&k).map(|c| (k, c)))
                    .collect();
                let mapped = Self::try_map_children(children, f, path)?;
                Ok(Tree::Map(mapped.into_iter().collect::<IndexMap<_, _>>()))
            }
        }
    }

    fn try_map_children<U, E, F>(
        children: Vec<(Key, &Tree<T>)>,
        f: &mut F,
        path: &mut Path,
    ) -> Result<Vec<(Key, Tree<U>)>, E>
    where
        F: FnMut(&Path, &T) -> Result<U, E>,
    {
        let mut out = Vec::with_capacity(children.len());
        for (key, child) in children {
            path.push(key.clone());
            let mapped = child.try_map_inner(f, path)?;
            path.pop();
            out.push((key, mapped));
        }
        Ok(out)
    }
}
