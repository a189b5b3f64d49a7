//! # Traversal Iterator
//!
//! Lazy, read-only counterpart of [`Tree::traverse`]: yields every node in
//! the same post-order, with its path, without rebuilding anything. Each
//! call to [`Tree::traverse_iter`] starts a fresh walk.

use crate::key::{Key, Path};
use crate::tree::{treedef, Tree};

/// One node reached during a walk.
#[derive(Debug, Clone)]
pub struct Visit<'a, T> {
    pub path: Path,
    pub node: &'a Tree<T>,
    /// The walk did not descend into this node.
    pub is_leaf: bool,
}

struct Frame<'a, T> {
    path: Path,
    node: &'a Tree<T>,
    children: Option<Vec<(Key, &'a Tree<T>)>>,
    next: usize,
}

pub struct TraverseIter<'a, T, S> {
    stack: Vec<Frame<'a, T>>,
    should_stop: S,
}

impl<'a, T, S> Iterator for TraverseIter<'a, T, S>
where
    S: Fn(&Tree<T>) -> bool,
{
    type Item = Visit<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            if frame.children.is_none() {
                let def = if (self.should_stop)(frame.node) {
                    None
                } else {
                    treedef(frame.node).ok()
                };
                match def {
                    Some(def) => frame.children = Some(def.children()),
                    None => {
                        let done = self.stack.pop()?;
                        return Some(Visit {
                            path: done.path,
                            node: done.node,
                            is_leaf: true,
                        });
                    }
                }
            }

            let pending = frame
                .children
                .as_ref()
                .and_then(|children| children.get(frame.next))
                .cloned();
            match pending {
                Some((key, child)) => {
                    frame.next += 1;
                    let mut path = frame.path.clone();
                    path.push(key);
                    self.stack.push(Frame {
                        path,
                        node: child,
                        children: None,
                        next: 0,
                    });
                }
                None => {
                    let done = self.stack.pop()?;
                    return Some(Visit {
                        path: done.path,
                        node: done.node,
                        is_leaf: false,
                    });
                }
            }
        }
    }
}

impl<T> Tree<T> {
    /// Walk every node post-order, not descending where `should_stop` holds.
    pub fn traverse_iter<S>(&self, should_stop: S) -> TraverseIter<'_, T, S>
    where
        S: Fn(&Tree<T>) -> bool,
    {
        TraverseIter {
            stack: vec![Frame {
                path: Vec::new(),
                node: self,
                children: None,
                next: 0,
            }],
            should_stop,
        }
    }

    /// Every leaf with its path, left to right.
    pub fn leaves(&self) -> impl Iterator<Item = Visit<'_, T>> + '_ {
        self.traverse_iter(|_: &Tree<T>| false).filter(|visit| visit.is_leaf)
    }

    /// Every leaf value, left to right.
    pub fn leaf_values(&self) -> impl Iterator<Item = &T> + '_ {
        self.leaves().filter_map(|visit| visit.node.as_leaf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::display_path;

    #[test]
    fn test_iter_matches_traverse_order() {
        let tree = Tree::map([
            ("a", Tree::leaf(1)),
            ("b", Tree::seq([Tree::leaf(2), Tree::leaf(3)])),
        ]);
        let kinds: Vec<_> = tree.traverse_iter(|_| false).map(|v| v.node.kind().to_string()).collect();
        assert_eq!(kinds, vec!["leaf", "leaf", "leaf", "sequence", "map"]);
        let paths: Vec<_> = tree.leaves().map(|v| display_path(&v.path)).collect();
        assert_eq!(paths, vec!["/a", "/b/0", "/b/1"]);
    }

    #[test]
    fn test_iter_is_restartable() {
        let tree = Tree::seq([Tree::leaf(1), Tree::leaf(2)]);
        let first: Vec<_> = tree.leaf_values().copied().collect();
        let second: Vec<_> = tree.leaf_values().copied().collect();
        assert_eq!(first, vec![1, 2]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_should_stop_yields_subtree_as_leaf() {
        let tree = Tree::map([("a", Tree::seq([Tree::leaf(1)])), ("b", Tree::leaf(2))]);
        let stopped: Vec<_> = tree
            .traverse_iter(|node| matches!(node, Tree::Seq(_)))
            .filter(|v| v.is_leaf)
            .map(|v| v.node.kind().to_string())
            .collect();
        assert_eq!(stopped, vec!["sequence", "leaf"]);
    }

    #[test]
    fn test_empty_branch_is_not_a_leaf() {
        let tree: Tree<i32> = Tree::map([("a", Tree::empty_map())]);
        assert_eq!(tree.leaves().count(), 0);
    }
}
