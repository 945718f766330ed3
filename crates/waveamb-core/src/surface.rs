//! Surface Assembler: Folding the Quadrant into the Delay–Doppler Plane
//!
//! The correlation engine produces magnitudes for Doppler `±f_0..±f_K` and
//! non-negative delays only. Because `|χ(τ, ν)| = |χ(−τ, −ν)|`, the rows for
//! negative Doppler are exactly the negative-delay half of the rows for
//! positive Doppler:
//!
//! ```text
//!  quadrant rows 0..K   (−f_K..−f_0) ──flip rows──►  left half,  delays −τ_N..−τ_0
//!  quadrant rows K+1..  (+f_0..+f_K) ──flip cols──►  right half, delays  τ_0.. τ_N
//! ```
//!
//! The assembled surface has one row per non-negative Doppler `ν_0..ν_K`
//! and `2N+1` delay columns centred on zero delay. Negative Doppler is read
//! back through [`AmbiguitySurface::value_at`] or expanded with
//! [`AmbiguitySurface::full_plane`].

use serde::{Deserialize, Serialize};

use crate::correlation::Quadrant;
use crate::grid::{mirror_axis, DelayGrid, DopplerGrid};
use crate::sparse::DenseMatrix;
use crate::types::{AmbResult, AmbiguityError};

/// Mirror the quadrant into `(K+1) × (2N+2)` rows of non-negative Doppler.
///
/// Rows `0..K` are conjugated and flipped vertically to form the left
/// (negative delay) half; rows `K+1..2K+1` are flipped horizontally to form
/// the right half. Magnitudes are real, so the conjugation leaves them as is.
pub fn fold_quadrant(quadrant: &DenseMatrix<f64>) -> AmbResult<DenseMatrix<f64>> {
    let (rows, cols) = quadrant.shape();
    if rows < 2 || rows % 2 != 0 {
        return Err(AmbiguityError::ShapeMismatch {
            what: "quadrant rows (2K+2)",
            expected: rows.max(2) + rows % 2,
            actual: rows,
        });
    }
    let half = rows / 2;
    let last = half - 1;

    Ok(DenseMatrix::from_fn(half, 2 * cols, |i, j| {
        if j < cols {
            quadrant.get(last - i, j)
        } else {
            quadrant.get(half + i, 2 * cols - 1 - j)
        }
    }))
}

/// `[−τ_N, .., −τ_0, τ_0, .., τ_N]`
pub fn mirror_delay_axis(delays: &[f64]) -> Vec<f64> {
    mirror_axis(delays)
}

/// Non-negative half of the `2K+2` Doppler axis scaled by `ceil(max t)`.
pub fn physical_doppler_axis(doppler_axis: &[f64], time_scale: f64) -> AmbResult<Vec<f64>> {
    let len = doppler_axis.len();
    if len < 2 || len % 2 != 0 {
        return Err(AmbiguityError::ShapeMismatch {
            what: "doppler axis (2K+2)",
            expected: len.max(2) + len % 2,
            actual: len,
        });
    }
    Ok(doppler_axis[len / 2..].iter().map(|f| f * time_scale).collect())
}

/// Drop the `−τ_0` column that closes the left half, so zero delay appears
/// once. A `2N+2` axis becomes `2N+1` entries, symmetric about index N.
pub fn trim_duplicate_zero(
    delay_axis: &[f64],
    folded: &DenseMatrix<f64>,
) -> AmbResult<(Vec<f64>, DenseMatrix<f64>)> {
    let width = delay_axis.len();
    if width < 2 || width % 2 != 0 || folded.cols() != width {
        return Err(AmbiguityError::ShapeMismatch {
            what: "folded surface columns",
            expected: width,
            actual: folded.cols(),
        });
    }
    let dup = width / 2 - 1;

    let axis = delay_axis
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != dup)
        .map(|(_, &t)| t)
        .collect();
    let surface = DenseMatrix::from_fn(folded.rows(), width - 1, |i, j| {
        let src = if j < dup { j } else { j + 1 };
        folded.get(i, src)
    });
    Ok((axis, surface))
}

/// Fold, mirror, scale and trim a quadrant into the assembled surface.
pub fn assemble(
    quadrant: &Quadrant,
    delays: &DelayGrid,
    doppler: &DopplerGrid,
    time_scale: f64,
) -> AmbResult<AmbiguitySurface> {
    let expected = (doppler.len(), delays.len());
    if quadrant.magnitude.shape() != expected {
        return Err(AmbiguityError::ShapeMismatch {
            what: "quadrant cells",
            expected: expected.0 * expected.1,
            actual: quadrant.magnitude.as_slice().len(),
        });
    }

    let folded = fold_quadrant(&quadrant.magnitude)?;
    let full_delay = mirror_delay_axis(delays.delays());
    let (delay, magnitude) = trim_duplicate_zero(&full_delay, &folded)?;
    let doppler = physical_doppler_axis(doppler.axis(), time_scale)?;

    tracing::debug!(
        rows = magnitude.rows(),
        cols = magnitude.cols(),
        "assembled ambiguity surface"
    );

    Ok(AmbiguitySurface {
        delay,
        doppler,
        magnitude,
    })
}

/// Normalized |χ(τ, ν)| over non-negative Doppler and the full delay axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbiguitySurface {
    delay: Vec<f64>,
    doppler: Vec<f64>,
    magnitude: DenseMatrix<f64>,
}

/// Serializable view of a surface, rows indexed by Doppler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceData {
    /// Delay axis in units of t_b
    pub delay: Vec<f64>,
    /// Doppler axis in units of 1/(M t_b)
    pub doppler: Vec<f64>,
    /// `magnitude[doppler][delay]`
    pub magnitude: Vec<Vec<f64>>,
}

impl AmbiguitySurface {
    /// `(Doppler rows, delay columns)` = `(K+1, 2N+1)`
    pub fn shape(&self) -> (usize, usize) {
        self.magnitude.shape()
    }

    /// Delay axis τ/t_b, strictly increasing, centred on zero
    pub fn delay_axis(&self) -> &[f64] {
        &self.delay
    }

    /// Doppler axis ν·M·t_b, from zero upward
    pub fn doppler_axis(&self) -> &[f64] {
        &self.doppler
    }

    pub fn magnitude(&self) -> &DenseMatrix<f64> {
        &self.magnitude
    }

    /// Column of zero delay (N)
    pub fn center_column(&self) -> usize {
        self.delay.len() / 2
    }

    /// Magnitude at a Doppler row and delay column of the stored half.
    pub fn get(&self, doppler_row: usize, delay_col: usize) -> f64 {
        self.magnitude.get(doppler_row, delay_col)
    }

    /// Lookup by signed offsets from the origin: `delay` in −N..=N,
    /// `doppler` in −K..=K. Negative Doppler reflects through the origin.
    pub fn value_at(&self, delay: isize, doppler: isize) -> Option<f64> {
        let (rows, _) = self.shape();
        let n = self.center_column() as isize;
        let (row, col) = if doppler >= 0 {
            (doppler, n + delay)
        } else {
            (-doppler, n - delay)
        };
        if row as usize >= rows || col < 0 || col > 2 * n {
            return None;
        }
        Some(self.magnitude.get(row as usize, col as usize))
    }

    /// Both Doppler signs, `(2K+1) × (2N+1)`, row K is zero Doppler.
    pub fn full_plane(&self) -> DenseMatrix<f64> {
        let (rows, cols) = self.shape();
        let k = rows as isize - 1;
        let n = self.center_column() as isize;
        DenseMatrix::from_fn(2 * rows - 1, cols, |i, j| {
            self.value_at(j as isize - n, i as isize - k).unwrap_or(0.0)
        })
    }

    /// Doppler axis matching [`Self::full_plane`] rows
    pub fn full_doppler_axis(&self) -> Vec<f64> {
        let mut axis = mirror_axis(&self.doppler);
        axis.remove(self.doppler.len() - 1);
        axis
    }

    /// Zero-Doppler row (range cut)
    pub fn range_cut(&self) -> Vec<f64> {
        self.magnitude.row(0).to_vec()
    }

    /// Zero-delay column (Doppler cut), from zero Doppler upward
    pub fn doppler_cut(&self) -> Vec<f64> {
        let col = self.center_column();
        (0..self.shape().0).map(|i| self.magnitude.get(i, col)).collect()
    }

    /// Location and value of the largest entry, `(doppler_row, delay_col, value)`.
    ///
    /// Ties resolve to the first entry in row-major order.
    pub fn find_peak(&self) -> (usize, usize, f64) {
        let mut best = (0, 0, f64::NEG_INFINITY);
        for i in 0..self.shape().0 {
            for (j, &v) in self.magnitude.row(i).iter().enumerate() {
                if v > best.2 {
                    best = (i, j, v);
                }
            }
        }
        best
    }

    /// Surface with a zero row under zero Doppler, as used for 3D meshes.
    ///
    /// Returns `(doppler_axis, magnitude)` with one more row than the surface;
    /// the new first row sits at Doppler 0 with all magnitudes 0.
    pub fn with_floor(&self) -> (Vec<f64>, DenseMatrix<f64>) {
        let mut doppler = Vec::with_capacity(self.doppler.len() + 1);
        doppler.push(0.0);
        doppler.extend_from_slice(&self.doppler);

        let (rows, cols) = self.shape();
        let magnitude = DenseMatrix::from_fn(rows + 1, cols, |i, j| {
            if i == 0 {
                0.0
            } else {
                self.magnitude.get(i - 1, j)
            }
        });
        (doppler, magnitude)
    }

    /// Copy into nested vectors for serialization.
    pub fn to_data(&self) -> SurfaceData {
        SurfaceData {
            delay: self.delay.clone(),
            doppler: self.doppler.clone(),
            magnitude: (0..self.shape().0)
                .map(|i| self.magnitude.row(i).to_vec())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 4 × 3 quadrant (K = 1, N = 2) holding 0..12 row-major.
    fn counting_quadrant() -> DenseMatrix<f64> {
        DenseMatrix::new(4, 3, (0..12).map(|v| v as f64).collect()).unwrap()
    }

    #[test]
    fn test_fold_by_hand() {
        let folded = fold_quadrant(&counting_quadrant()).unwrap();
        assert_eq!(folded.shape(), (2, 6));
        assert_eq!(folded.row(0), &[3.0, 4.0, 5.0, 8.0, 7.0, 6.0]);
        assert_eq!(folded.row(1), &[0.0, 1.0, 2.0, 11.0, 10.0, 9.0]);
    }

    #[test]
    fn test_fold_rejects_odd_rows() {
        let odd = DenseMatrix::new(3, 2, vec![0.0; 6]).unwrap();
        assert!(matches!(
            fold_quadrant(&odd),
            Err(AmbiguityError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_mirror_delay_axis() {
        assert_eq!(mirror_delay_axis(&[0.0, 0.5, 1.0]), vec![-1.0, -0.5, -0.0, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_physical_doppler_axis() {
        let axis = [-0.2, -0.1, -0.0, 0.0, 0.1, 0.2];
        let physical = physical_doppler_axis(&axis, 10.0).unwrap();
        assert_eq!(physical.len(), 3);
        assert_eq!(physical[0], 0.0);
        assert_relative_eq!(physical[2], 2.0);
        assert!(physical_doppler_axis(&axis[..5], 1.0).is_err());
    }

    #[test]
    fn test_trim_by_hand() {
        let folded = fold_quadrant(&counting_quadrant()).unwrap();
        let axis = mirror_delay_axis(&[0.0, 1.0, 2.0]);
        let (axis, surface) = trim_duplicate_zero(&axis, &folded).unwrap();
        assert_eq!(axis, vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_eq!(surface.shape(), (2, 5));
        assert_eq!(surface.row(0), &[3.0, 4.0, 8.0, 7.0, 6.0]);
        assert_eq!(surface.row(1), &[0.0, 1.0, 11.0, 10.0, 9.0]);
    }

    #[test]
    fn test_trim_rejects_mismatched_axis() {
        let folded = fold_quadrant(&counting_quadrant()).unwrap();
        assert!(trim_duplicate_zero(&[0.0, 1.0, 2.0, 3.0], &folded).is_err());
    }

    fn sample_surface() -> AmbiguitySurface {
        let folded = fold_quadrant(&counting_quadrant()).unwrap();
        let (delay, magnitude) =
            trim_duplicate_zero(&mirror_delay_axis(&[0.0, 1.0, 2.0]), &folded).unwrap();
        AmbiguitySurface {
            delay,
            doppler: vec![0.0, 1.0],
            magnitude,
        }
    }

    #[test]
    fn test_signed_lookup() {
        let s = sample_surface();
        assert_eq!(s.center_column(), 2);
        assert_eq!(s.value_at(0, 0), Some(8.0));
        assert_eq!(s.value_at(2, 1), Some(9.0));
        // Reflection through the origin
        assert_eq!(s.value_at(-2, -1), Some(9.0));
        assert_eq!(s.value_at(1, -1), s.value_at(-1, 1));
        assert_eq!(s.value_at(3, 0), None);
        assert_eq!(s.value_at(0, 2), None);
        assert_eq!(s.value_at(0, -2), None);
    }

    #[test]
    fn test_full_plane() {
        let s = sample_surface();
        let plane = s.full_plane();
        assert_eq!(plane.shape(), (3, 5));
        // Middle row is zero Doppler
        assert_eq!(plane.row(1), s.magnitude().row(0));
        // Bottom row is the point reflection of the top row
        let top: Vec<f64> = plane.row(0).iter().rev().copied().collect();
        assert_eq!(top, plane.row(2));
        assert_eq!(s.full_doppler_axis(), vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_cuts_and_peak() {
        let s = sample_surface();
        assert_eq!(s.range_cut(), vec![3.0, 4.0, 8.0, 7.0, 6.0]);
        assert_eq!(s.doppler_cut(), vec![8.0, 11.0]);
        assert_eq!(s.find_peak(), (1, 2, 11.0));
    }

    #[test]
    fn test_with_floor() {
        let s = sample_surface();
        let (doppler, mesh) = s.with_floor();
        assert_eq!(doppler, vec![0.0, 0.0, 1.0]);
        assert_eq!(mesh.shape(), (3, 5));
        assert!(mesh.row(0).iter().all(|&v| v == 0.0));
        assert_eq!(mesh.row(1), s.magnitude().row(0));
    }

    #[test]
    fn test_to_data() {
        let data = sample_surface().to_data();
        assert_eq!(data.magnitude.len(), 2);
        assert_eq!(data.magnitude[1][2], 11.0);
        assert_eq!(data.delay.len(), 5);
    }
}
