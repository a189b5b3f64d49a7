//! # Keys and Paths
//!
//! A [`Key`] addresses one child of a branch node: a name for mapping-like
//! nodes, a position for sequence-like nodes. A [`Path`] is the list of keys
//! from the root down to some node.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of a single child inside a branch node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Position inside a sequence.
    Index(usize),
    /// Name inside a mapping or record.
    Name(String),
}

impl Key {
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Index(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Name(name.clone())
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

/// Keys from the root of a tree down to one of its nodes.
pub type Path = Vec<Key>;

/// Render a path as `/a/0/b`. The root is `/`.
pub fn display_path(path: &[Key]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.iter().map(|k| format!("/{}", k)).collect()
}

/// Build a [`Path`] from names and indices.
///
/// ```
/// use dimflow_core::{path, Key};
///
/// let p = path!["signals", 0, "re"];
/// assert_eq!(p, vec![Key::from("signals"), Key::Index(0), Key::from("re")]);
/// ```
#[macro_export]
macro_rules! path {
    () => {
        ::std::vec::Vec::<$crate::Key>::new()
    };
    ($($key:expr),+ $(,)?) => {
        vec![$($crate::Key::from($key)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_path() {
        assert_eq!(display_path(&[]), "/");
        assert_eq!(display_path(&path!["a", 0, "b"]), "/a/0/b");
    }

    #[test]
    fn test_keys_order_indices_first() {
        let mut keys = vec![Key::from("b"), Key::Index(1), Key::from("a"), Key::Index(0)];
        keys.sort();
        assert_eq!(
            keys,
            vec![Key::Index(0), Key::Index(1), Key::from("a"), Key::from("b")]
        );
    }

    #[test]
    fn test_key_serializes_untagged() {
        let json = serde_json::to_string(&path!["x", 2]).unwrap();
        assert_eq!(json, r#"["x",2]"#);
    }
}
