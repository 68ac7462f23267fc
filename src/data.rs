//! Labeled example sources for training and evaluation.
//!
//! The training loop only needs random access to `(input, desired_output)`
//! pairs. `Examples` abstracts over the on-disk digit corpus
//! ([`crate::digits::DigitSet`]) and small in-memory sets ([`Dataset`]).

use crate::{Error, Result, Vector};

/// Random-access source of labeled examples.
pub trait Examples {
    /// Number of examples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-example input length.
    fn input_dim(&self) -> usize;

    /// Per-example desired output length.
    fn target_dim(&self) -> usize;

    /// Input vector of example `idx` (raw intensities in `[0, 255]`).
    ///
    /// Panics if `idx >= len`.
    fn input(&self, idx: usize) -> Vector;

    /// Desired output vector of example `idx`.
    ///
    /// Panics if `idx >= len`.
    fn desired_output(&self, idx: usize) -> Vector;
}

/// An in-memory supervised dataset.
///
/// Stored as contiguous row-major buffers:
/// - `inputs.len() == len * input_dim`
/// - `targets.len() == len * target_dim`
#[derive(Debug, Clone)]
pub struct Dataset {
    inputs: Vec<f64>,
    targets: Vec<f64>,
    len: usize,
    input_dim: usize,
    target_dim: usize,
}

impl Dataset {
    /// Build a dataset from flat buffers with shapes `(len, input_dim)` and
    /// `(len, target_dim)`.
    pub fn from_flat(
        inputs: Vec<f64>,
        targets: Vec<f64>,
        input_dim: usize,
        target_dim: usize,
    ) -> Result<Self> {
        if input_dim == 0 || target_dim == 0 {
            return Err(Error::InvalidData(format!(
                "dims must be > 0, got input_dim={input_dim} target_dim={target_dim}"
            )));
        }
        if !inputs.len().is_multiple_of(input_dim) {
            return Err(Error::InvalidData(format!(
                "inputs length {} is not divisible by input_dim {input_dim}",
                inputs.len()
            )));
        }

        let len = inputs.len() / input_dim;
        if targets.len() != len * target_dim {
            return Err(Error::InvalidData(format!(
                "targets length {} does not match len * target_dim ({len} * {target_dim})",
                targets.len()
            )));
        }

        Ok(Self {
            inputs,
            targets,
            len,
            input_dim,
            target_dim,
        })
    }

    /// Build a dataset from per-example vectors.
    ///
    /// This copies into contiguous storage.
    pub fn from_pairs(pairs: &[(Vector, Vector)]) -> Result<Self> {
        let (first_x, first_y) = pairs
            .first()
            .ok_or_else(|| Error::InvalidData("dataset must not be empty".to_owned()))?;
        let input_dim = first_x.len();
        let target_dim = first_y.len();

        let mut inputs = Vec::with_capacity(pairs.len() * input_dim);
        let mut targets = Vec::with_capacity(pairs.len() * target_dim);
        for (i, (x, y)) in pairs.iter().enumerate() {
            if x.len() != input_dim || y.len() != target_dim {
                return Err(Error::InvalidData(format!(
                    "example {i} has shape ({}, {}), expected ({input_dim}, {target_dim})",
                    x.len(),
                    y.len()
                )));
            }
            inputs.extend_from_slice(x.as_slice());
            targets.extend_from_slice(y.as_slice());
        }

        Self::from_flat(inputs, targets, input_dim, target_dim)
    }
}

impl Examples for Dataset {
    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    fn target_dim(&self) -> usize {
        self.target_dim
    }

    fn input(&self, idx: usize) -> Vector {
        let start = idx * self.input_dim;
        Vector::from(&self.inputs[start..start + self.input_dim])
    }

    fn desired_output(&self, idx: usize) -> Vector {
        let start = idx * self.target_dim;
        Vector::from(&self.targets[start..start + self.target_dim])
    }
}

/// One-hot vector of length `len` with a `1` at `class`.
///
/// Panics if `class >= len`.
pub fn one_hot(class: usize, len: usize) -> Vector {
    let mut v = Vector::zeros(len);
    v.set(class, 1.0);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_flat_validates_shapes() {
        let ok = Dataset::from_flat(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0], 2, 1).unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok.input(1).as_slice(), &[2.0, 3.0]);
        assert_eq!(ok.desired_output(1).as_slice(), &[1.0]);

        assert!(Dataset::from_flat(vec![0.0, 1.0, 2.0], vec![0.0], 2, 1).is_err());
        assert!(Dataset::from_flat(vec![0.0, 1.0], vec![0.0, 1.0], 2, 1).is_err());
    }

    #[test]
    fn from_pairs_rejects_mixed_shapes() {
        let pairs = vec![
            (Vector::zeros(2), one_hot(0, 2)),
            (Vector::zeros(3), one_hot(1, 2)),
        ];
        assert!(Dataset::from_pairs(&pairs).is_err());
        assert!(Dataset::from_pairs(&[]).is_err());
    }

    #[test]
    fn one_hot_sets_single_entry() {
        assert_eq!(one_hot(2, 4).as_slice(), &[0.0, 0.0, 1.0, 0.0]);
    }
}
