//! # Dimension Lists
//!
//! [`Dims`] names the axes of one array, in axis order: `["batch", "time"]`
//! says axis 0 is `batch` and axis 1 is `time`.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dims(Vec<String>);

impl Dims {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Dims(names.into_iter().map(Into::into).collect())
    }

    pub fn empty() -> Self {
        Dims(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, dim: &str) -> bool {
        self.0.iter().any(|d| d == dim)
    }

    /// Axis index of `dim`.
    pub fn position(&self, dim: &str) -> Option<usize> {
        self.0.iter().position(|d| d == dim)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Copy without any occurrence of `dim`.
    pub fn without(&self, dim: &str) -> Dims {
        Dims(self.0.iter().filter(|d| *d != dim).cloned().collect())
    }

    /// Copy with `dim` inserted at `index` (clamped to the end).
    pub fn inserted(&self, dim: &str, index: usize) -> Dims {
        let mut names = self.0.clone();
        names.insert(index.min(names.len()), dim.to_string());
        Dims(names)
    }

    /// Copy with every occurrence of `dim` replaced by `names`, in order.
    pub fn spliced(&self, dim: &str, names: &[String]) -> Dims {
        Dims(
            self.0
                .iter()
                .flat_map(|d| if d == dim { names.to_vec() } else { vec![d.clone()] })
                .collect(),
        )
    }
}

impl<S: Into<String>> FromIterator<S> for Dims {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Dims::new(iter)
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edits_are_copies() {
        let dims = Dims::new(["a", "b", "c"]);
        assert_eq!(dims.without("b"), Dims::new(["a", "c"]));
        assert_eq!(dims.inserted("x", 1), Dims::new(["a", "x", "b", "c"]));
        assert_eq!(dims.inserted("x", 99), Dims::new(["a", "b", "c", "x"]));
        assert_eq!(dims.spliced("b", &["y".to_string()]), Dims::new(["a", "y", "c"]));
        assert_eq!(
            dims.spliced("b", &["x".to_string(), "y".to_string()]),
            Dims::new(["a", "x", "y", "c"])
        );
        assert_eq!(dims.spliced("z", &["x".to_string()]), dims);
        assert_eq!(dims, Dims::new(["a", "b", "c"]));
    }

    #[test]
    fn test_position_and_display() {
        let dims: Dims = ["t", "r"].into_iter().collect();
        assert_eq!(dims.position("r"), Some(1));
        assert_eq!(dims.position("z"), None);
        assert_eq!(dims.to_string(), "[t, r]");
    }
}
