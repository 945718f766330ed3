//! Sparse and bounded-dense complex matrices for the correlation engine.
//!
//! Only three shapes of storage are needed:
//!
//! - [`DiagonalMatrix`]: one diagonal, logical shape `rows × cols`.
//! - [`BandedMatrix`]: every row holds a single contiguous run of non-zero
//!   entries starting at its own column offset. A delay-shifted copy of a
//!   pulse is exactly one such run, so the `(N+1) × (m+Tm)` shift structure
//!   costs `(N+1)·m` cells instead of `(N+1)·(m+Tm)`.
//! - [`DenseMatrix`]: row-major storage, used only for the Doppler kernel and
//!   the final quadrant, both bounded by [`crate::config::ResourceLimits`].

use crate::types::{AmbResult, AmbiguityError, Complex};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Build `n` rows with `f`, one rayon task per row when `parallel` is enabled.
pub(crate) fn map_rows<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        (0..n).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..n).map(f).collect()
    }
}

/// Try to build `n` rows with `f`, stopping at the first error.
pub(crate) fn try_map_rows<T, F>(n: usize, f: F) -> AmbResult<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> AmbResult<T> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        (0..n).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..n).map(f).collect()
    }
}

// ---------------------------------------------------------------------------
// DiagonalMatrix
// ---------------------------------------------------------------------------

/// A `rows × cols` matrix whose only non-zeros sit on the main diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalMatrix {
    rows: usize,
    cols: usize,
    diag: Vec<Complex>,
}

impl DiagonalMatrix {
    /// `diag` fills the leading diagonal; it may not be longer than
    /// `min(rows, cols)`.
    pub fn new(rows: usize, cols: usize, diag: Vec<Complex>) -> AmbResult<Self> {
        let capacity = rows.min(cols);
        if diag.len() > capacity {
            return Err(AmbiguityError::ShapeMismatch {
                what: "diagonal",
                expected: capacity,
                actual: diag.len(),
            });
        }
        Ok(Self { rows, cols, diag })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn diagonal(&self) -> &[Complex] {
        &self.diag
    }

    pub fn get(&self, row: usize, col: usize) -> Complex {
        if row == col && row < self.diag.len() {
            self.diag[row]
        } else {
            Complex::new(0.0, 0.0)
        }
    }
}

// ---------------------------------------------------------------------------
// BandedMatrix
// ---------------------------------------------------------------------------

/// One contiguous run of entries starting at column `offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct BandRow {
    pub offset: usize,
    pub values: Vec<Complex>,
}

impl BandRow {
    pub fn new(offset: usize, values: Vec<Complex>) -> Self {
        Self { offset, values }
    }

    /// One past the last stored column
    pub fn end(&self) -> usize {
        self.offset + self.values.len()
    }

    pub fn get(&self, col: usize) -> Complex {
        if col >= self.offset && col < self.end() {
            self.values[col - self.offset]
        } else {
            Complex::new(0.0, 0.0)
        }
    }
}

/// Row-banded sparse matrix with a fixed column count.
#[derive(Debug, Clone, PartialEq)]
pub struct BandedMatrix {
    cols: usize,
    rows: Vec<BandRow>,
}

impl BandedMatrix {
    /// Assemble from prebuilt rows. Every band must fit inside `cols`.
    pub fn from_rows(cols: usize, rows: Vec<BandRow>) -> AmbResult<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.end() > cols {
                return Err(AmbiguityError::IndexOutOfRange {
                    row: i,
                    end: row.end(),
                    len: cols,
                });
            }
        }
        Ok(Self { cols, rows })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols)
    }

    pub fn row(&self, i: usize) -> &BandRow {
        &self.rows[i]
    }

    pub fn rows(&self) -> &[BandRow] {
        &self.rows
    }

    /// Stored entries across all rows
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.values.len()).sum()
    }

    pub fn get(&self, row: usize, col: usize) -> Complex {
        self.rows
            .get(row)
            .map(|r| r.get(col))
            .unwrap_or_else(|| Complex::new(0.0, 0.0))
    }

    /// Elementwise complex conjugate
    pub fn conj(&self) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|r| BandRow::new(r.offset, r.values.iter().map(|v| v.conj()).collect()))
            .collect();
        Self {
            cols: self.cols,
            rows,
        }
    }

    /// `self · diag`. Each band is clipped to the diagonal's extent, so the
    /// product stays banded with at most as many entries per row.
    pub fn mul_diagonal(&self, diag: &DiagonalMatrix) -> AmbResult<Self> {
        let (inner, out_cols) = diag.shape();
        if self.cols != inner {
            return Err(AmbiguityError::ShapeMismatch {
                what: "banded x diagonal inner dimension",
                expected: self.cols,
                actual: inner,
            });
        }
        let d = diag.diagonal();
        let limit = d.len().min(out_cols);

        let rows = map_rows(self.rows.len(), |i| {
            let row = &self.rows[i];
            let end = row.end().min(limit);
            if row.offset >= end {
                return BandRow::new(row.offset.min(out_cols), Vec::new());
            }
            let values = (row.offset..end)
                .map(|j| row.values[j - row.offset] * d[j])
                .collect();
            BandRow::new(row.offset, values)
        });

        Ok(Self {
            cols: out_cols,
            rows,
        })
    }

    /// `self · denseᵀ`, touching only the stored band of each row.
    pub fn mul_dense_transposed(&self, dense: &DenseMatrix<Complex>) -> AmbResult<DenseMatrix<Complex>> {
        if dense.cols() != self.cols {
            return Err(AmbiguityError::ShapeMismatch {
                what: "banded x dense-transpose inner dimension",
                expected: self.cols,
                actual: dense.cols(),
            });
        }
        let out_cols = dense.rows();

        let rows: Vec<Vec<Complex>> = map_rows(self.rows.len(), |i| {
            let band = &self.rows[i];
            (0..out_cols)
                .map(|k| {
                    let kernel = &dense.row(k)[band.offset..band.end()];
                    band.values
                        .iter()
                        .zip(kernel)
                        .map(|(&a, &b)| a * b)
                        .sum::<Complex>()
                })
                .collect()
        });

        Ok(DenseMatrix {
            rows: self.rows.len(),
            cols: out_cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    /// Expand to dense storage. Only meant for small matrices.
    pub fn to_dense(&self) -> DenseMatrix<Complex> {
        DenseMatrix::from_fn(self.rows.len(), self.cols, |i, j| self.get(i, j))
    }
}

// ---------------------------------------------------------------------------
// DenseMatrix
// ---------------------------------------------------------------------------

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy> DenseMatrix<T> {
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> AmbResult<Self> {
        if data.len() != rows * cols {
            return Err(AmbiguityError::ShapeMismatch {
                what: "dense matrix data",
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn from_fn(rows: usize, cols: usize, f: impl Fn(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Stack equally sized rows.
    pub(crate) fn from_row_vecs(cols: usize, rows: Vec<Vec<T>>) -> Self {
        let n = rows.len();
        let data: Vec<T> = rows.into_iter().flatten().collect();
        debug_assert_eq!(data.len(), n * cols);
        Self {
            rows: n,
            cols,
            data,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn transpose(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |i, j| self.get(j, i))
    }

    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> DenseMatrix<U> {
        DenseMatrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }
}

impl DenseMatrix<f64> {
    /// Largest entry, 0.0 for an empty matrix
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(0.0_f64, f64::max)
    }

    /// Divide every entry by `divisor`; an entry equal to it becomes exactly 1.0
    pub fn divide(&mut self, divisor: f64) {
        for v in &mut self.data {
            *v /= divisor;
        }
    }
}
