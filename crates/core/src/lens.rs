//! # TreeLens
//!
//! A functional, path-addressed view into a tree. Focusing never copies:
//! the lens keeps the root plus the list of `(container, key)` steps taken
//! to reach the focus. Writing (`set`, `update`, `remove`) rebuilds the
//! ancestors bottom-up, so the original tree is left untouched.
//!
//! Focusing through a missing key is allowed. The missing containers are
//! treated as empty maps, so `set` on a fresh path extends the structure.

use crate::error::TreeError;
use crate::key::{display_path, Key, Path};
use crate::tree::Tree;

pub struct TreeLens<'a, T> {
    root: &'a Tree<T>,
    ancestors: Vec<(Option<&'a Tree<T>>, Key)>,
    focus: Option<&'a Tree<T>>,
}

impl<'a, T: Clone> TreeLens<'a, T> {
    pub fn new(root: &'a Tree<T>) -> Self {
        Self {
            root,
            ancestors: Vec::new(),
            focus: Some(root),
        }
    }

    /// Focus one level deeper.
    pub fn at(mut self, key: impl Into<Key>) -> Self {
        let key = key.into();
        let next = self.focus.and_then(|node| node.child(&key));
        self.ancestors.push((self.focus, key));
        self.focus = next;
        self
    }

    pub fn at_path(self, path: &[Key]) -> Self {
        path.iter().fold(self, |lens, key| lens.at(key))
    }

    pub fn root(&self) -> &'a Tree<T> {
        self.root
    }

    pub fn path(&self) -> Path {
        self.ancestors.iter().map(|(_, k)| k.clone()).collect()
    }

    pub fn exists(&self) -> bool {
        self.focus.is_some()
    }

    pub fn get(&self) -> Option<&'a Tree<T>> {
        self.focus
    }

    /// Like [`get`](Self::get), but names the first missing key.
    pub fn try_get(&self) -> Result<&'a Tree<T>, TreeError> {
        if let Some(focus) = self.focus {
            return Ok(focus);
        }
        let mut walked = Vec::new();
        for (container, key) in &self.ancestors {
            let present = container.and_then(|c| c.child(key)).is_some();
            if !present {
                return Err(TreeError::KeyNotFound {
                    key: key.clone(),
                    path: display_path(&walked),
                });
            }
            walked.push(key.clone());
        }
        Err(TreeError::KeyNotFound {
            key: Key::from(""),
            path: display_path(&walked),
        })
    }

    /// Return a new root with `value` at the focus.
    pub fn set(&self, value: Tree<T>) -> Result<Tree<T>, TreeError> {
        self.rebuild_from(self.ancestors.len(), value)
    }

    /// Return a new root with `f` applied to the focus. A missing focus is
    /// presented to `f` as an empty map.
    pub fn update<E>(&self, f: impl FnOnce(Tree<T>) -> Result<Tree<T>, E>) -> Result<Tree<T>, E>
    where
        E: From<TreeError>,
    {
        let current = self.focus.cloned().unwrap_or_else(Tree::empty_map);
        let value = f(current)?;
        Ok(self.set(value)?)
    }

    /// Return a new root without the focused child.
    pub fn remove(&self) -> Result<Tree<T>, TreeError> {
        let Some((container, key)) = self.ancestors.last() else {
            return Err(TreeError::EmptyPath);
        };
        if self.focus.is_none() {
            return Err(self.try_get().err().unwrap_or(TreeError::EmptyPath));
        }
        let parent = match container {
            Some(parent) => parent.without_child(key)?,
            None => return Err(TreeError::EmptyPath),
        };
        self.rebuild_from(self.ancestors.len() - 1, parent)
    }

    // Fold `value` into the first `depth` ancestors, innermost first.
    fn rebuild_from(&self, depth: usize, value: Tree<T>) -> Result<Tree<T>, TreeError> {
        let mut value = value;
        for (container, key) in self.ancestors[..depth].iter().rev() {
            value = match container {
                Some(node) => node.with_child(key.clone(), value)?,
                None => Tree::empty_map().with_child(key.clone(), value)?,
            };
        }
        Ok(value)
    }
}

impl<T> Tree<T> {
    pub fn lens(&self) -> TreeLens<'_, T>
    where
        T: Clone,
    {
        TreeLens::new(self)
    }
}
