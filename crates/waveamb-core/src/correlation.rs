//! Correlation Engine: One Quadrant of the Ambiguity Magnitude
//!
//! Evaluates
//!
//! ```text
//! A[d, n] = | Σ_j u[j] · conj(u[j − D_n]) · exp(−2πi · f_d · j/r) |
//! ```
//!
//! for every Doppler offset `f_d` of the full `2K+2` axis and every delay
//! hypothesis `n = 0..N`, where `D_n = s_{N−n}` and `s_n` is the quantized
//! sample shift of delay `n`. The window of column `n` starts at
//! `Tm − s_{N−n}` in the padded waveform ([`DelayGrid::windows`]). Column
//! `n = N` is zero delay; column `n = 0` is the largest delay `Tm`.
//!
//! The computation never forms the `(2K+2) × (N+1) × m` correlation cube:
//!
//! 1. The zero-padded waveform windows, one per delay, are stored as a
//!    [`BandedMatrix`] of logical shape `(N+1) × (m+Tm)`.
//! 2. A [`DiagonalMatrix`] of `conj(u)` with logical shape `(m+Tm) × m`
//!    weights each window; the product is again banded, `(N+1) × m`.
//! 3. The Doppler kernel `(2K+2) × m` is the only large dense operand; the
//!    projection `(conj(C) · Kᵀ)ᵀ` walks the band of each correlation row
//!    against it, leaving the dense `(2K+2) × (N+1)` quadrant.

use std::f64::consts::PI;

use crate::config::ResourceLimits;
use crate::grid::{DelayGrid, DopplerGrid};
use crate::sparse::{map_rows, try_map_rows, BandRow, BandedMatrix, DenseMatrix, DiagonalMatrix};
use crate::types::{complex_ops, AmbResult, AmbiguityError, Complex, IQSample};
use crate::waveform::Waveform;

/// Normalized magnitude over Doppler rows `0..2K+1` and delay columns `0..N`.
#[derive(Debug, Clone, PartialEq)]
pub struct Quadrant {
    /// `(2K+2) × (N+1)` magnitudes in [0, 1]
    pub magnitude: DenseMatrix<f64>,
    /// Largest magnitude before normalization (the pulse energy)
    pub peak: f64,
}

impl Quadrant {
    /// Number of Doppler steps K
    pub fn doppler_points(&self) -> usize {
        self.magnitude.rows() / 2 - 1
    }

    /// Number of delay steps N
    pub fn delay_points(&self) -> usize {
        self.magnitude.cols() - 1
    }
}

/// Fail early when any structure would exceed `limits`.
pub fn check_resources(
    waveform_len: usize,
    pad: usize,
    delay_rows: usize,
    doppler_rows: usize,
    limits: &ResourceLimits,
) -> AmbResult<()> {
    let padded = pad
        .checked_mul(2)
        .and_then(|p| p.checked_add(waveform_len))
        .unwrap_or(usize::MAX);
    ResourceLimits::check("padded waveform", 1, padded, limits.max_padded_samples)?;
    ResourceLimits::check("shifted correlation band", delay_rows, waveform_len, limits.max_band_cells)?;
    ResourceLimits::check("doppler kernel", doppler_rows, waveform_len, limits.max_kernel_cells)?;
    ResourceLimits::check("ambiguity quadrant", doppler_rows, delay_rows, limits.max_surface_cells)?;
    Ok(())
}

/// Diagonal of `conj(u)`, logical shape `(m + pad) × m`.
pub fn diagonal_weighting(samples: &[IQSample], pad: usize) -> AmbResult<DiagonalMatrix> {
    let m = samples.len();
    DiagonalMatrix::new(m + pad, m, samples.iter().map(|s| s.conj()).collect())
}

/// One window of the waveform zero-padded by `pad` on both sides per shift.
///
/// Row `n` is `[0; pad] ++ u ++ [0; pad]` read from index `shifts[n]` for
/// `m + pad` samples; only the run covering `u` is stored, at column
/// `pad − shifts[n]`.
pub fn shifted_structure(samples: &[IQSample], shifts: &[usize], pad: usize) -> AmbResult<BandedMatrix> {
    let m = samples.len();
    let width = m + pad;
    let padded_len = m + 2 * pad;

    let rows = try_map_rows(shifts.len(), |n| {
        let shift = shifts[n];
        if shift > pad {
            return Err(AmbiguityError::IndexOutOfRange {
                row: n,
                end: shift + width,
                len: padded_len,
            });
        }
        Ok(BandRow::new(pad - shift, samples.to_vec()))
    })?;

    BandedMatrix::from_rows(width, rows)
}

/// `kernel[d, j] = exp(−2πi · doppler[d] · j/r)`
pub fn doppler_kernel(doppler: &[f64], waveform_len: usize, oversampling: usize) -> DenseMatrix<Complex> {
    let r = oversampling as f64;
    let rows = map_rows(doppler.len(), |d| {
        let f = doppler[d];
        (0..waveform_len)
            .map(|j| complex_ops::from_polar(1.0, -2.0 * PI * f * (j as f64 / r)))
            .collect::<Vec<_>>()
    });
    DenseMatrix::from_row_vecs(waveform_len, rows)
}

/// `|K · Cᴴ|`, evaluated as `(conj(C) · Kᵀ)ᵀ` so the banded operand leads.
pub fn project(kernel: &DenseMatrix<Complex>, correlation: &BandedMatrix) -> AmbResult<DenseMatrix<f64>> {
    let product = correlation.conj().mul_dense_transposed(kernel)?;
    Ok(product.transpose().map(|z| z.norm()))
}

/// Scale so the largest entry is exactly 1.0; returns the unnormalized peak.
pub fn normalize(magnitude: &mut DenseMatrix<f64>) -> AmbResult<f64> {
    let peak = magnitude.max();
    if !(peak.is_finite() && peak > 0.0) {
        return Err(AmbiguityError::invalid(
            "envelope",
            format!("waveform has no energy to normalize (peak {})", peak),
        ));
    }
    magnitude.divide(peak);
    Ok(peak)
}

/// Run the whole engine for one waveform and grid pair.
pub fn compute_quadrant(
    waveform: &Waveform,
    delays: &DelayGrid,
    doppler: &DopplerGrid,
    limits: &ResourceLimits,
) -> AmbResult<Quadrant> {
    let m = waveform.len();
    let pad = delays.max_shift();
    let span = tracing::debug_span!("correlate", m, pad, delays = delays.len(), dopplers = doppler.len());
    let _enter = span.enter();

    check_resources(m, pad, delays.len(), doppler.len(), limits)?;

    let shifted = shifted_structure(waveform.samples(), delays.windows(), pad)?;
    let weighting = diagonal_weighting(waveform.samples(), pad)?;
    let correlation = shifted.mul_diagonal(&weighting)?;
    tracing::trace!(
        shape = ?correlation.shape(),
        nnz = correlation.nnz(),
        "built banded correlation structure"
    );

    let kernel = doppler_kernel(doppler.axis(), m, waveform.oversampling());
    let mut magnitude = project(&kernel, &correlation)?;
    let peak = normalize(&mut magnitude)?;

    tracing::debug!(peak, shape = ?magnitude.shape(), "computed ambiguity quadrant");
    Ok(Quadrant { magnitude, peak })
}
