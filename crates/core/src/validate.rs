//! # Validation
//!
//! Check that a data tree actually has the shape its spec claims: every
//! location the spec names exists, every leaf has at least as many axes as
//! it has named dimensions, and a dimension has one size everywhere.

use std::collections::BTreeMap;

use tracing::debug;

use crate::array::Array;
use crate::error::ValidationError;
use crate::key::display_path;
use crate::spec::Spec;
use crate::tree::Tree;

/// Validate `data` against `spec`, returning the size of every dimension.
pub fn validate<A: Array>(spec: &Spec, data: &Tree<A>) -> Result<BTreeMap<String, usize>, ValidationError> {
    for visit in spec.tree().leaves() {
        let names_something = matches!(visit.node.as_leaf(), Some(Some(dims)) if !dims.is_empty());
        if names_something && !data.has_path(&visit.path) {
            return Err(ValidationError::MissingPath {
                path: display_path(&visit.path),
            });
        }
    }

    let conformed = spec.conform(data)?;
    let mut sizes: BTreeMap<String, (usize, String)> = BTreeMap::new();
    for (visit, dims) in data.leaves().zip(conformed.tree().leaf_values()) {
        let (Some(value), Some(dims)) = (visit.node.as_leaf(), dims) else {
            continue;
        };
        let shape = value.shape();
        let path = display_path(&visit.path);
        if shape.len() < dims.len() {
            return Err(ValidationError::TooFewAxes {
                path,
                rank: shape.len(),
                dims: dims.as_slice().to_vec(),
            });
        }
        for (dim, &size) in dims.iter().zip(&shape) {
            match sizes.get(dim) {
                Some((first, first_path)) if *first != size => {
                    return Err(ValidationError::InconsistentSize {
                        dimension: dim.to_string(),
                        first: *first,
                        first_path: first_path.clone(),
                        other: size,
                        other_path: path,
                    });
                }
                Some(_) => {}
                None => {
                    sizes.insert(dim.to_string(), (size, path.clone()));
                }
            }
        }
    }

    let sizes: BTreeMap<String, usize> = sizes.into_iter().map(|(dim, (size, _))| (dim, size)).collect();
    debug!(?sizes, "validated data against spec");
    Ok(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Tensor;

    fn spec() -> Spec {
        Spec::map([
            ("signals", Spec::dims(["time", "receiver"])),
            ("positions", Spec::dims(["receiver"])),
        ])
    }

    #[test]
    fn test_valid_data_reports_sizes() {
        let data = Tree::map([
            ("signals", Tree::leaf(Tensor::zeros(vec![5, 2]))),
            ("positions", Tree::leaf(Tensor::zeros(vec![2, 3]))),
        ]);
        let sizes = validate(&spec(), &data).unwrap();
        assert_eq!(sizes.get("time"), Some(&5));
        assert_eq!(sizes.get("receiver"), Some(&2));
    }

    #[test]
    fn test_missing_path() {
        let data = Tree::map([("signals", Tree::leaf(Tensor::zeros(vec![5, 2])))]);
        assert_eq!(
            validate(&spec(), &data).unwrap_err(),
            ValidationError::MissingPath {
                path: "/positions".to_string()
            }
        );
    }

    #[test]
    fn test_too_few_axes() {
        let data = Tree::map([
            ("signals", Tree::leaf(Tensor::zeros(vec![5]))),
            ("positions", Tree::leaf(Tensor::zeros(vec![2]))),
        ]);
        assert!(matches!(
            validate(&spec(), &data),
            Err(ValidationError::TooFewAxes { rank: 1, .. })
        ));
    }

    #[test]
    fn test_inconsistent_size() {
        let data = Tree::map([
            ("signals", Tree::leaf(Tensor::zeros(vec![5, 2]))),
            ("positions", Tree::leaf(Tensor::zeros(vec![4]))),
        ]);
        let err = validate(&spec(), &data).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InconsistentSize { first: 2, other: 4, .. }
        ));
    }
}
