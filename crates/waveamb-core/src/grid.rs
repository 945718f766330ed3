//! Grid Planner: Quantized Delay and Doppler Axes
//!
//! The Doppler axis is uniform with step `df = F / K / m_basic` and is stored
//! as `[-f_K, .., -f_0, f_0, .., f_K]` (2K+2 entries, zero appears twice).
//!
//! The delay axis covers `[0, ceil(T·m)·dt]` with N+1 points, each rounded to
//! a whole number of samples so every delay hypothesis is an integral shift
//! of the oversampled waveform:
//!
//! ```text
//! dτ  = ceil(T·m) · dt / N
//! τ_n = round(n · dτ / dt) · dt        n = 0..N
//! ```
//!
//! Rounding is half-to-even, so ties resolve the same way on every platform.

use serde::{Deserialize, Serialize};

use crate::types::{AmbResult, AmbiguityError};

/// Concatenate the negated reverse of `half` with `half`.
///
/// `[a, b, c]` becomes `[-c, -b, -a, a, b, c]`.
pub fn mirror_axis(half: &[f64]) -> Vec<f64> {
    half.iter()
        .rev()
        .map(|&x| -x)
        .chain(half.iter().copied())
        .collect()
}

/// Doppler offsets in cycles per chip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DopplerGrid {
    step: f64,
    half: Vec<f64>,
    axis: Vec<f64>,
}

impl DopplerGrid {
    /// Plan K+1 non-negative Doppler points over span `F` and mirror them.
    pub fn plan(span: f64, points: usize, basic_len: usize) -> AmbResult<Self> {
        if points == 0 {
            return Err(AmbiguityError::InvalidGridSize {
                axis: "doppler",
                points,
            });
        }
        if basic_len == 0 {
            return Err(AmbiguityError::invalid("envelope", "must contain at least one chip"));
        }
        if !(span.is_finite() && span > 0.0) {
            return Err(AmbiguityError::invalid(
                "doppler_span",
                format!("must be positive and finite, got {}", span),
            ));
        }

        let step = span / points as f64 / basic_len as f64;
        let half: Vec<f64> = (0..=points).map(|k| k as f64 * step).collect();
        let axis = mirror_axis(&half);

        Ok(Self { step, half, axis })
    }

    /// Number of Doppler steps K
    pub fn points(&self) -> usize {
        self.half.len() - 1
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// f_0..f_K
    pub fn half_axis(&self) -> &[f64] {
        &self.half
    }

    /// The full 2K+2 entry axis
    pub fn axis(&self) -> &[f64] {
        &self.axis
    }

    pub fn len(&self) -> usize {
        self.axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axis.is_empty()
    }
}

/// Non-negative, sample-quantized delay offsets in chips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayGrid {
    step: f64,
    spacing: f64,
    max_shift: usize,
    shifts: Vec<usize>,
    windows: Vec<usize>,
    delays: Vec<f64>,
}

impl DelayGrid {
    /// Plan N+1 delays over span `T` for a waveform of `waveform_len` samples
    /// at `oversampling` samples per chip.
    pub fn plan(
        span: f64,
        points: usize,
        oversampling: usize,
        waveform_len: usize,
    ) -> AmbResult<Self> {
        if points == 0 {
            return Err(AmbiguityError::InvalidGridSize {
                axis: "delay",
                points,
            });
        }
        if !(span.is_finite() && span > 0.0) {
            return Err(AmbiguityError::invalid(
                "delay_span",
                format!("must be positive and finite, got {}", span),
            ));
        }
        if oversampling == 0 {
            return Err(AmbiguityError::InvalidOversampling(0.0));
        }

        let spacing = 1.0 / oversampling as f64;
        let max_shift = max_delay_samples(span, waveform_len);
        let step = max_shift as f64 * spacing / points as f64;

        let shifts: Vec<usize> = (0..=points)
            .map(|n| quantize_shift(n as f64 * step, spacing))
            .collect();
        let windows = window_shifts(&shifts, max_shift);
        let delays = shifts.iter().map(|&s| s as f64 * spacing).collect();

        Ok(Self {
            step,
            spacing,
            max_shift,
            shifts,
            windows,
            delays,
        })
    }

    /// Number of delay steps N
    pub fn points(&self) -> usize {
        self.shifts.len() - 1
    }

    /// Unquantized step dτ
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Sample spacing dt = 1/r
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Tm = ceil(T·m), the largest one-sided delay in samples
    pub fn max_shift(&self) -> usize {
        self.max_shift
    }

    /// Integer sample shift of each delay, round(τ_n / dt)
    pub fn shifts(&self) -> &[usize] {
        &self.shifts
    }

    /// Start of each correlation window in the padded waveform, `Tm − s_{N−n}`
    pub fn windows(&self) -> &[usize] {
        &self.windows
    }

    /// τ_0..τ_N
    pub fn delays(&self) -> &[f64] {
        &self.delays
    }

    pub fn len(&self) -> usize {
        self.delays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }
}

/// Window offsets whose lags `Tm − w_n` run through `shifts` in reverse.
///
/// Window `n` evaluates lag `s_{N−n}` exactly, also when `n·dτ/dt` lands on
/// a half sample.
pub fn window_shifts(shifts: &[usize], max_shift: usize) -> Vec<usize> {
    shifts.iter().rev().map(|&s| max_shift.saturating_sub(s)).collect()
}

/// Tm = ceil(T·m)
pub fn max_delay_samples(span: f64, waveform_len: usize) -> usize {
    (span * waveform_len as f64).ceil() as usize
}

/// Convert a delay in chips to the nearest whole sample shift.
pub fn quantize_shift(delay: f64, spacing: f64) -> usize {
    (delay / spacing).round_ties_even().max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mirror_axis() {
        assert_eq!(mirror_axis(&[0.0, 1.0, 2.0]), vec![-2.0, -1.0, -0.0, 0.0, 1.0, 2.0]);
        assert!(mirror_axis(&[]).is_empty());
    }

    #[test]
    fn test_doppler_grid_by_hand() {
        // F = 1, K = 4, m_basic = 2 -> df = 0.125
        let grid = DopplerGrid::plan(1.0, 4, 2).unwrap();
        assert_relative_eq!(grid.step(), 0.125);
        assert_eq!(grid.len(), 10);
        assert_eq!(grid.half_axis(), &[0.0, 0.125, 0.25, 0.375, 0.5]);
        assert_eq!(grid.axis()[0], -0.5);
        assert_eq!(grid.axis()[9], 0.5);
        assert_eq!(grid.points(), 4);
    }

    #[test]
    fn test_doppler_grid_symmetry() {
        let grid = DopplerGrid::plan(3.0, 17, 13).unwrap();
        let axis = grid.axis();
        let n = axis.len();
        assert_eq!(n, 2 * 17 + 2);
        for i in 0..n {
            assert_eq!(axis[i], -axis[n - 1 - i]);
        }
        // Strictly increasing apart from the doubled zero at the center
        for i in 1..n {
            if i == n / 2 {
                assert_eq!(axis[i], axis[i - 1].abs());
            } else {
                assert!(axis[i] > axis[i - 1]);
            }
        }
    }

    #[test]
    fn test_delay_grid_by_hand() {
        // T = 1, N = 4, r = 2, m = 6: Tm = 6, dt = 0.5, dτ = 0.75
        // n·dτ/dt = [0, 1.5, 3, 4.5, 6] -> ties to even [0, 2, 3, 4, 6]
        let grid = DelayGrid::plan(1.0, 4, 2, 6).unwrap();
        assert_eq!(grid.max_shift(), 6);
        assert_relative_eq!(grid.step(), 0.75);
        assert_eq!(grid.shifts(), &[0, 2, 3, 4, 6]);
        assert_eq!(grid.delays(), &[0.0, 1.0, 1.5, 2.0, 3.0]);
        assert_eq!(grid.points(), 4);
    }

    #[test]
    fn test_windows_follow_shifts_on_ties() {
        // T = 1, N = 2, r = 2, m = 5: Tm = 5, n·dτ/dt = [0, 2.5, 5] -> [0, 2, 5]
        let grid = DelayGrid::plan(1.0, 2, 2, 5).unwrap();
        assert_eq!(grid.shifts(), &[0, 2, 5]);
        // Rounding Tm − n·dτ/dt = 2.5 again would give 2 and lag 3
        assert_eq!(grid.windows(), &[0, 3, 5]);
        for (n, &w) in grid.windows().iter().enumerate() {
            assert_eq!(grid.max_shift() - w, grid.shifts()[grid.points() - n]);
        }
        assert_eq!(window_shifts(&[0, 2, 3, 4, 6], 6), vec![0, 2, 3, 4, 6]);
    }

    #[test]
    fn test_delay_grid_ends_at_max_shift() {
        let grid = DelayGrid::plan(1.0, 50, 40, 520).unwrap();
        assert_eq!(grid.len(), 51);
        assert_eq!(grid.shifts()[0], 0);
        assert_eq!(*grid.shifts().last().unwrap(), 520);
        assert!(grid.shifts().windows(2).all(|w| w[1] > w[0]));
        assert_relative_eq!(*grid.delays().last().unwrap(), 13.0);
    }

    #[test]
    fn test_fractional_span() {
        // T·m = 2.5 rounds up to 3 samples
        assert_eq!(max_delay_samples(0.5, 5), 3);
        let grid = DelayGrid::plan(0.5, 3, 1, 5).unwrap();
        assert_eq!(grid.shifts(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_zero_points_rejected() {
        assert_eq!(
            DopplerGrid::plan(1.0, 0, 13).unwrap_err(),
            AmbiguityError::InvalidGridSize {
                axis: "doppler",
                points: 0
            }
        );
        assert_eq!(
            DelayGrid::plan(1.0, 0, 4, 52).unwrap_err(),
            AmbiguityError::InvalidGridSize {
                axis: "delay",
                points: 0
            }
        );
    }

    #[test]
    fn test_degenerate_spans_rejected() {
        assert!(matches!(
            DopplerGrid::plan(0.0, 5, 13),
            Err(AmbiguityError::InvalidParameter { .. })
        ));
        assert!(matches!(
            DelayGrid::plan(f64::INFINITY, 5, 1, 13),
            Err(AmbiguityError::InvalidParameter { .. })
        ));
    }
}
