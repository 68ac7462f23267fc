//! Dense `f64` vectors.
//!
//! `Vector` is a plain value type: every transforming operation (`add`, `scale`,
//! `apply`) returns a new vector and leaves `self` untouched. Only `set` mutates
//! in place, for owners filling a vector during initialization.

use std::fmt;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vector {
    data: Vec<f64>,
}

impl Vector {
    /// A vector of `len` zeros.
    #[inline]
    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    #[inline]
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self { data }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Panics if `idx >= len`.
    #[inline]
    pub fn get(&self, idx: usize) -> f64 {
        self.data[idx]
    }

    /// Panics if `idx >= len`.
    #[inline]
    pub fn set(&mut self, idx: usize, value: f64) {
        self.data[idx] = value;
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.data.iter()
    }

    #[inline]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Elementwise sum.
    pub fn add(&self, other: &Vector) -> Result<Vector> {
        self.check_same_len(other, "add")?;
        Ok(self.zip_with(other, |a, b| a + b))
    }

    /// Every entry multiplied by `factor`.
    pub fn scale(&self, factor: f64) -> Vector {
        self.apply(|x| factor * x)
    }

    /// Elementwise (Hadamard) product.
    pub fn hadamard(&self, other: &Vector) -> Result<Vector> {
        self.check_same_len(other, "hadamard")?;
        Ok(self.zip_with(other, |a, b| a * b))
    }

    pub fn dot(&self, other: &Vector) -> Result<f64> {
        self.check_same_len(other, "dot")?;
        Ok(dot_slices(&self.data, &other.data))
    }

    /// Euclidean norm.
    pub fn magnitude(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Index of the largest entry; ties resolve to the lowest index.
    ///
    /// Returns `None` for an empty vector.
    pub fn index_of_max(&self) -> Option<usize> {
        let mut iter = self.data.iter().enumerate();
        let (mut best_idx, mut best) = iter.next().map(|(i, &v)| (i, v))?;
        for (i, &v) in iter {
            if v > best {
                best = v;
                best_idx = i;
            }
        }
        Some(best_idx)
    }

    /// A new vector with `f` applied to every entry.
    pub fn apply<F: Fn(f64) -> f64>(&self, f: F) -> Vector {
        Vector {
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &Vector, f: F) -> Vector {
        Vector {
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    fn check_same_len(&self, other: &Vector, op: &str) -> Result<()> {
        if self.len() != other.len() {
            return Err(Error::ShapeMismatch(format!(
                "cannot {op} vectors of length {} and {}",
                self.len(),
                other.len()
            )));
        }
        Ok(())
    }
}

#[inline]
pub(crate) fn dot_slices(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut sum = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        sum += x * y;
    }
    sum
}

impl From<Vec<f64>> for Vector {
    fn from(data: Vec<f64>) -> Self {
        Self::from_vec(data)
    }
}

impl From<&[f64]> for Vector {
    fn from(data: &[f64]) -> Self {
        Self::from_vec(data.to_vec())
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_elementwise() {
        let a = Vector::from_vec(vec![1.0, -2.0, 3.5]);
        let b = Vector::from_vec(vec![0.5, 2.0, -1.0]);
        let sum = a.add(&b).unwrap();
        for i in 0..a.len() {
            assert_eq!(sum.get(i), a.get(i) + b.get(i));
        }
        // Operands are untouched.
        assert_eq!(a.as_slice(), &[1.0, -2.0, 3.5]);
    }

    #[test]
    fn dot_and_add_reject_length_mismatch() {
        let a = Vector::zeros(3);
        let b = Vector::zeros(4);
        assert!(matches!(a.dot(&b), Err(Error::ShapeMismatch(_))));
        assert!(matches!(a.add(&b), Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn dot_magnitude_and_scale() {
        let a = Vector::from_vec(vec![3.0, 4.0]);
        assert_eq!(a.dot(&a).unwrap(), 25.0);
        assert_eq!(a.magnitude(), 5.0);
        assert_eq!(a.scale(-2.0).as_slice(), &[-6.0, -8.0]);
    }

    #[test]
    fn index_of_max_prefers_first_on_ties() {
        let v = Vector::from_vec(vec![0.1, 0.9, 0.05]);
        assert_eq!(v.index_of_max(), Some(1));

        let flat = Vector::from_vec(vec![1.0, 1.0, 1.0]);
        assert_eq!(flat.index_of_max(), Some(0));

        assert_eq!(Vector::zeros(0).index_of_max(), None);
    }

    #[test]
    fn apply_returns_new_vector() {
        let v = Vector::from_vec(vec![0.0, 255.0]);
        let scaled = v.apply(|x| x / 255.0);
        assert_eq!(scaled.as_slice(), &[0.0, 1.0]);
        assert_eq!(v.as_slice(), &[0.0, 255.0]);
    }

    #[test]
    fn display_lists_entries() {
        let v = Vector::from_vec(vec![1.0, 0.5]);
        assert_eq!(v.to_string(), "[1, 0.5]");
    }
}
