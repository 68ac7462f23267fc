//! Dense `f64` matrices.
//!
//! A `Matrix` is one contiguous row-major buffer with shape `(rows, cols)`.
//! Network weights use shape `(out_dim, in_dim)`, so `W * a` maps a layer's
//! activations to the next layer's raw activations.

use std::fmt;

use crate::matmul::gemm_f64;
use crate::vector::dot_slices;
use crate::{Error, Result, Vector};

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    /// Row-major, `data.len() == rows * cols`.
    data: Vec<f64>,
}

impl Matrix {
    /// A `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from a flat row-major buffer.
    pub fn from_flat(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        let expected = rows
            .checked_mul(cols)
            .ok_or_else(|| Error::Construction("matrix shape overflow".to_owned()))?;
        if data.len() != expected {
            return Err(Error::Construction(format!(
                "buffer length {} does not match rows * cols ({rows} * {cols})",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from nested rows. Every row must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows.first().ok_or_else(|| {
            Error::Construction("matrix must have at least one row".to_owned())
        })?;
        let cols = first.len();

        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::Construction(format!(
                    "ragged rows: row {i} has len {}, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Outer product `u v^T`, shape `(u.len(), v.len())`.
    pub fn outer(u: &Vector, v: &Vector) -> Self {
        let cols = v.len();
        let mut data = Vec::with_capacity(u.len() * cols);
        for &x in u.iter() {
            data.extend(v.iter().map(|&y| x * y));
        }
        Self {
            rows: u.len(),
            cols,
            data,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Panics if `row >= rows` or `col >= cols`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(col < self.cols, "col {col} out of bounds ({})", self.cols);
        self.data[row * self.cols + col]
    }

    /// Panics if `row >= rows` or `col >= cols`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(col < self.cols, "col {col} out of bounds ({})", self.cols);
        self.data[row * self.cols + col] = value;
    }

    /// Row `idx` as a slice.
    #[inline]
    pub fn row(&self, idx: usize) -> &[f64] {
        let start = idx * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Row-major view of every entry.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Matrix product `self * other`.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(Error::ShapeMismatch(format!(
                "cannot multiply ({}, {}) by ({}, {})",
                self.rows, self.cols, other.rows, other.cols
            )));
        }

        let mut product = Matrix::zeros(self.rows, other.cols);
        gemm_f64(
            self.rows,
            other.cols,
            self.cols,
            1.0,
            &self.data,
            self.cols,
            1,
            &other.data,
            other.cols,
            1,
            0.0,
            &mut product.data,
            other.cols,
            1,
        );
        Ok(product)
    }

    /// Matrix-vector product `self * v`.
    pub fn multiply_vector(&self, v: &Vector) -> Result<Vector> {
        if self.cols != v.len() {
            return Err(Error::ShapeMismatch(format!(
                "cannot multiply ({}, {}) matrix by vector of length {}",
                self.rows,
                self.cols,
                v.len()
            )));
        }

        let out = (0..self.rows)
            .map(|r| dot_slices(self.row(r), v.as_slice()))
            .collect();
        Ok(Vector::from_vec(out))
    }

    /// Transposed matrix-vector product `self^T * v`.
    ///
    /// This is how backprop pulls an error signal back through a weight matrix.
    pub fn transpose_multiply_vector(&self, v: &Vector) -> Result<Vector> {
        if self.rows != v.len() {
            return Err(Error::ShapeMismatch(format!(
                "cannot multiply transposed ({}, {}) matrix by vector of length {}",
                self.rows,
                self.cols,
                v.len()
            )));
        }

        let mut out = vec![0.0_f64; self.cols];
        for (r, &x) in v.iter().enumerate() {
            for (acc, &w) in out.iter_mut().zip(self.row(r)) {
                *acc += w * x;
            }
        }
        Ok(Vector::from_vec(out))
    }

    /// Elementwise sum.
    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        self.check_same_shape(other, "add")?;
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| a + b)
            .collect();
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// Every entry multiplied by `factor`.
    pub fn scale(&self, factor: f64) -> Matrix {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| factor * x).collect(),
        }
    }

    /// `self += factor * other`, in place.
    pub(crate) fn add_scaled_in_place(&mut self, other: &Matrix, factor: f64) {
        debug_assert_eq!(self.shape(), other.shape());
        for (w, &g) in self.data.iter_mut().zip(&other.data) {
            *w += factor * g;
        }
    }

    fn check_same_shape(&self, other: &Matrix, op: &str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch(format!(
                "cannot {op} matrices of shape ({}, {}) and ({}, {})",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            if r > 0 {
                writeln!(f)?;
            }
            write!(f, "[")?;
            for (c, v) in self.row(r).iter().enumerate() {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{v}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
