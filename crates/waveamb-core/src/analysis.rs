//! End-to-end ambiguity analysis: synthesize, plan, correlate, assemble.

use crate::config::{AmbiguityConfig, ResourceLimits};
use crate::correlation::{check_resources, compute_quadrant};
use crate::grid::{max_delay_samples, DelayGrid, DopplerGrid};
use crate::surface::{assemble, AmbiguitySurface};
use crate::types::AmbResult;
use crate::waveform::{oversampling_factor, synthesize, WaveformTrace};

/// Numeric result of one analysis.
#[derive(Debug, Clone)]
pub struct AmbiguityAnalysis {
    /// Samples per chip actually used (r)
    pub oversampling: usize,
    /// Amplitude, phase and frequency of the synthesized pulse
    pub trace: WaveformTrace,
    /// Assembled delay–Doppler magnitude
    pub surface: AmbiguitySurface,
    /// Quantized delay hypotheses
    pub delay_grid: DelayGrid,
    /// Doppler hypotheses in cycles per chip
    pub doppler_grid: DopplerGrid,
    /// Zero-delay zero-Doppler correlation before normalization (pulse energy)
    pub peak: f64,
}

/// Compute the waveform trace and the ambiguity surface for `config`.
pub fn analyze(config: &AmbiguityConfig) -> AmbResult<AmbiguityAnalysis> {
    config.validate()?;

    let basic_len = config.basic_length();
    let r = oversampling_factor(config.oversampling, config.delay_points, config.delay_span, basic_len)?;
    ResourceLimits::check("oversampled waveform", basic_len, r, config.limits.max_padded_samples)?;

    // Grids are sized by K and N alone, so bound them before planning.
    let m = basic_len.saturating_mul(r);
    let pad = max_delay_samples(config.delay_span, m);
    let delay_rows = config.delay_points.saturating_add(1);
    let doppler_rows = config.doppler_points.saturating_add(1).saturating_mul(2);
    check_resources(m, pad, delay_rows, doppler_rows, &config.limits)?;

    let span = tracing::info_span!("analyze", basic_len, r);
    let _enter = span.enter();

    let waveform = synthesize(&config.envelope, config.active_frequency_code(), r)?;
    let doppler_grid = DopplerGrid::plan(config.doppler_span, config.doppler_points, basic_len)?;
    let delay_grid = DelayGrid::plan(config.delay_span, config.delay_points, r, waveform.len())?;
    tracing::debug!(
        m = waveform.len(),
        max_shift = delay_grid.max_shift(),
        doppler_step = doppler_grid.step(),
        delay_step = delay_grid.step(),
        "planned grids"
    );

    let quadrant = compute_quadrant(&waveform, &delay_grid, &doppler_grid, &config.limits)?;
    let surface = assemble(&quadrant, &delay_grid, &doppler_grid, waveform.time_scale())?;

    Ok(AmbiguityAnalysis {
        oversampling: r,
        trace: waveform.trace(),
        surface,
        delay_grid,
        doppler_grid,
        peak: quadrant.peak,
    })
}
