//! Waveform Synthesizer: Oversampled, Optionally Frequency-Coded Pulses
//!
//! Builds the complex baseband pulse analysed by the correlation engine. Each
//! chip of the basic envelope is held for `r` samples (zero-order hold), and
//! when a frequency code is active the chip frequencies are integrated into a
//! continuous phase ramp:
//!
//! ```text
//! phase[j] = arg(u[j]) + 2π/r · Σ_{i ≤ j} f[i / r]
//! u[j]     = |u[j]| · exp(i·phase[j])
//! ```
//!
//! ## Example
//!
//! ```rust
//! use waveamb_core::types::complex_ops;
//! use waveamb_core::waveform::synthesize;
//!
//! let envelope = complex_ops::from_real(&[1.0, 1.0, 1.0]);
//! let waveform = synthesize(&envelope, Some(&[0.0, 0.5, 1.0]), 4).unwrap();
//! assert_eq!(waveform.len(), 12);
//! assert_eq!(waveform.phase().len(), 12);
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::types::{complex_ops, AmbResult, AmbiguityError, IQBuffer, IQSample};

/// Derive the integer oversampling factor `r = ceil(sr·(N+1) / T / m_basic)`.
///
/// Chosen so that the N+1 delay points over the span T land on distinct
/// samples of the oversampled waveform.
pub fn oversampling_factor(
    oversampling: f64,
    delay_points: usize,
    delay_span: f64,
    basic_len: usize,
) -> AmbResult<usize> {
    if basic_len == 0 {
        return Err(AmbiguityError::invalid("envelope", "must contain at least one chip"));
    }
    if !(delay_span.is_finite() && delay_span > 0.0) {
        return Err(AmbiguityError::invalid(
            "delay_span",
            format!("must be positive and finite, got {}", delay_span),
        ));
    }

    let r = (oversampling * (delay_points + 1) as f64 / delay_span / basic_len as f64).ceil();
    if !r.is_finite() || r < 1.0 {
        return Err(AmbiguityError::InvalidOversampling(r));
    }
    Ok(r as usize)
}

/// Repeat every chip `r` times.
pub fn hold_chips<T: Copy>(chips: &[T], r: usize) -> Vec<T> {
    chips
        .iter()
        .flat_map(|&c| std::iter::repeat(c).take(r))
        .collect()
}

/// Per-sample phase contributed by a frequency code at oversampling `r`.
///
/// Sample `j` carries the frequency of chip `j / r`; the running sum is
/// scaled by `2π/r` so each chip advances the phase by `2π·f` overall.
pub fn phase_ramp(frequency_code: &[f64], r: usize) -> Vec<f64> {
    let coef = 2.0 * PI / r as f64;
    let mut acc = 0.0;
    hold_chips(frequency_code, r)
        .into_iter()
        .map(|f| {
            acc += f;
            coef * acc
        })
        .collect()
}

/// Synthesize the oversampled waveform from a basic envelope.
pub fn synthesize(
    envelope: &[IQSample],
    frequency_code: Option<&[f64]>,
    oversampling: usize,
) -> AmbResult<Waveform> {
    if oversampling == 0 {
        return Err(AmbiguityError::InvalidOversampling(0.0));
    }
    if envelope.is_empty() {
        return Err(AmbiguityError::invalid("envelope", "must contain at least one chip"));
    }
    if let Some(code) = frequency_code {
        if code.len() != envelope.len() {
            return Err(AmbiguityError::ShapeMismatch {
                what: "frequency_code",
                expected: envelope.len(),
                actual: code.len(),
            });
        }
    }

    let held = hold_chips(envelope, oversampling);
    let amplitude: Vec<f64> = held.iter().map(|s| s.norm()).collect();
    let mut phase: Vec<f64> = held.iter().map(|s| s.arg()).collect();

    let samples = match frequency_code {
        Some(code) => {
            for (p, ramp) in phase.iter_mut().zip(phase_ramp(code, oversampling)) {
                *p += ramp;
            }
            amplitude
                .iter()
                .zip(phase.iter())
                .map(|(&a, &p)| complex_ops::from_polar(a, p))
                .collect()
        }
        None => held,
    };

    tracing::debug!(
        basic_len = envelope.len(),
        oversampling,
        samples = amplitude.len(),
        coded = frequency_code.is_some(),
        "synthesized waveform"
    );

    Ok(Waveform {
        samples,
        amplitude,
        phase,
        oversampling,
        basic_len: envelope.len(),
    })
}

/// Oversampled complex baseband pulse with its amplitude and phase.
#[derive(Debug, Clone)]
pub struct Waveform {
    samples: IQBuffer,
    amplitude: Vec<f64>,
    phase: Vec<f64>,
    oversampling: usize,
    basic_len: usize,
}

impl Waveform {
    /// Number of samples m = m_basic · r
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[IQSample] {
        &self.samples
    }

    pub fn amplitude(&self) -> &[f64] {
        &self.amplitude
    }

    /// Phase in radians, unwrapped by the code ramp when coding is active
    pub fn phase(&self) -> &[f64] {
        &self.phase
    }

    /// Samples per chip (r)
    pub fn oversampling(&self) -> usize {
        self.oversampling
    }

    /// Number of chips in the basic envelope (m_basic)
    pub fn basic_len(&self) -> usize {
        self.basic_len
    }

    /// Sample spacing dt = 1/r, in chips
    pub fn sample_spacing(&self) -> f64 {
        1.0 / self.oversampling as f64
    }

    /// Sample times t[j] = j/r, in chips
    pub fn time_axis(&self) -> Vec<f64> {
        let r = self.oversampling as f64;
        (0..self.len()).map(|j| j as f64 / r).collect()
    }

    /// ceil(max t), the factor converting cycles per chip into ν·M·t_b
    pub fn time_scale(&self) -> f64 {
        let last = self.len().saturating_sub(1) as f64;
        (last / self.oversampling as f64).ceil()
    }

    pub fn energy(&self) -> f64 {
        complex_ops::energy(&self.samples)
    }

    /// Amplitude, phase and instantaneous frequency over time.
    pub fn trace(&self) -> WaveformTrace {
        let r = self.oversampling as f64;
        let scale = self.time_scale();

        // First sample has no predecessor to difference against.
        let frequency = std::iter::once(f64::NAN)
            .chain(
                self.phase
                    .windows(2)
                    .map(|w| (w[1] - w[0]) * r / (2.0 * PI) * scale),
            )
            .take(self.len())
            .collect();

        WaveformTrace {
            time: self.time_axis(),
            amplitude: self.amplitude.clone(),
            phase: self.phase.clone(),
            frequency,
        }
    }
}

/// Time-domain description of the synthesized pulse for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveformTrace {
    /// Sample times in chips
    pub time: Vec<f64>,
    /// |u(t)|
    pub amplitude: Vec<f64>,
    /// Phase in radians
    pub phase: Vec<f64>,
    /// Instantaneous frequency in units of 1/(M t_b); the first entry is NaN
    pub frequency: Vec<f64>,
}

impl WaveformTrace {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Amplitude closed with zeros at both ends, for step-style plotting.
    ///
    /// Returns `(time, amplitude)` of length m + 2, with time axis
    /// `[0, t_0, .., t_{m-1}, t_{m-1}]`.
    pub fn envelope_outline(&self) -> (Vec<f64>, Vec<f64>) {
        let last = self.time.last().copied().unwrap_or(0.0);

        let mut time = Vec::with_capacity(self.len() + 2);
        time.push(0.0);
        time.extend_from_slice(&self.time);
        time.push(last);

        let mut amplitude = Vec::with_capacity(self.len() + 2);
        amplitude.push(0.0);
        amplitude.extend(self.amplitude.iter().map(|a| a.abs()));
        amplitude.push(0.0);

        (time, amplitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Complex;
    use approx::assert_relative_eq;

    #[test]
    fn test_oversampling_factor() {
        // sr=10, N=50, T=1, m_basic=13: ceil(510/13) = ceil(39.23)
        assert_eq!(oversampling_factor(10.0, 50, 1.0, 13).unwrap(), 40);
        // Exact division does not round up
        assert_eq!(oversampling_factor(1.0, 12, 1.0, 13).unwrap(), 1);
        assert_eq!(oversampling_factor(2.0, 9, 0.5, 10).unwrap(), 4);
    }

    #[test]
    fn test_oversampling_factor_guards() {
        assert!(matches!(
            oversampling_factor(1.0, 10, 0.0, 13),
            Err(AmbiguityError::InvalidParameter { name: "delay_span", .. })
        ));
        assert!(matches!(
            oversampling_factor(1.0, 10, 1.0, 0),
            Err(AmbiguityError::InvalidParameter { name: "envelope", .. })
        ));
        assert!(matches!(
            oversampling_factor(0.0, 10, 1.0, 5),
            Err(AmbiguityError::InvalidOversampling(_))
        ));
        assert!(matches!(
            oversampling_factor(f64::NAN, 10, 1.0, 5),
            Err(AmbiguityError::InvalidOversampling(_))
        ));
    }

    #[test]
    fn test_hold_chips_interleaves_by_chip() {
        assert_eq!(hold_chips(&[1, 2, 3], 2), vec![1, 1, 2, 2, 3, 3]);
        assert_eq!(hold_chips(&[7], 1), vec![7]);
    }

    #[test]
    fn test_phase_ramp_by_hand() {
        // r = 2, code [1, 3]: held [1, 1, 3, 3], cumsum [1, 2, 5, 8], scale π
        let ramp = phase_ramp(&[1.0, 3.0], 2);
        let expected = [PI, 2.0 * PI, 5.0 * PI, 8.0 * PI];
        for (got, want) in ramp.iter().zip(expected.iter()) {
            assert_relative_eq!(*got, *want, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_phase_ramp_not_tiled() {
        // A tiled layout [1, 3, 1, 3] would give 4π at sample 2.
        let ramp = phase_ramp(&[1.0, 3.0], 2);
        assert!((ramp[2] - 4.0 * PI).abs() > 1e-6);
    }

    #[test]
    fn test_unit_envelope_without_oversampling() {
        let envelope = complex_ops::from_real(&[1.0; 13]);
        let waveform = synthesize(&envelope, None, 1).unwrap();
        assert_eq!(waveform.len(), 13);
        assert!(waveform.amplitude().iter().all(|&a| a == 1.0));
        assert!(waveform.phase().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_coded_phase_without_oversampling() {
        let envelope = complex_ops::from_real(&[1.0, 1.0, 1.0]);
        let waveform = synthesize(&envelope, Some(&[0.25, 0.25, 0.5]), 1).unwrap();
        let phase = waveform.phase();
        assert_relative_eq!(phase[0], 0.5 * PI, epsilon = 1e-12);
        assert_relative_eq!(phase[1], PI, epsilon = 1e-12);
        assert_relative_eq!(phase[2], 2.0 * PI, epsilon = 1e-12);
        assert_relative_eq!(waveform.samples()[0].im, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_oversampled_envelope_holds_chips() {
        let envelope = vec![Complex::new(1.0, 0.0), Complex::new(0.0, 2.0)];
        let waveform = synthesize(&envelope, None, 3).unwrap();
        assert_eq!(waveform.len(), 6);
        assert_eq!(waveform.samples()[2], Complex::new(1.0, 0.0));
        assert_eq!(waveform.samples()[3], Complex::new(0.0, 2.0));
        assert_relative_eq!(waveform.amplitude()[5], 2.0, epsilon = 1e-12);
        assert_relative_eq!(waveform.phase()[4], PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_coded_waveform_keeps_amplitude() {
        let envelope = complex_ops::from_real(&[1.0, 0.5, 2.0]);
        let waveform = synthesize(&envelope, Some(&[-1.0, 0.0, 1.0]), 5).unwrap();
        for (s, a) in waveform.samples().iter().zip(waveform.amplitude()) {
            assert_relative_eq!(s.norm(), *a, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let envelope = complex_ops::from_real(&[1.0; 4]);
        assert_eq!(
            synthesize(&envelope, Some(&[0.0; 5]), 2).unwrap_err(),
            AmbiguityError::ShapeMismatch {
                what: "frequency_code",
                expected: 4,
                actual: 5
            }
        );
    }

    #[test]
    fn test_time_axis_and_scale() {
        let envelope = complex_ops::from_real(&[1.0; 13]);
        let waveform = synthesize(&envelope, None, 40).unwrap();
        let t = waveform.time_axis();
        assert_eq!(t.len(), 520);
        assert_relative_eq!(t[40], 1.0, epsilon = 1e-12);
        assert_eq!(waveform.time_scale(), 13.0);

        let unsampled = synthesize(&envelope, None, 1).unwrap();
        assert_eq!(unsampled.time_scale(), 12.0);
    }

    #[test]
    fn test_trace_instantaneous_frequency() {
        // Constant code f = 0.5 at r = 4: each sample advances 2π·0.5/4
        let envelope = complex_ops::from_real(&[1.0; 2]);
        let waveform = synthesize(&envelope, Some(&[0.5, 0.5]), 4).unwrap();
        let trace = waveform.trace();
        assert_eq!(trace.len(), 8);
        assert!(trace.frequency[0].is_nan());
        // 0.5 cycles/chip times ceil(7/4) = 2
        for f in &trace.frequency[1..] {
            assert_relative_eq!(*f, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_envelope_outline() {
        let envelope = complex_ops::from_real(&[1.0, 2.0]);
        let trace = synthesize(&envelope, None, 1).unwrap().trace();
        let (time, amplitude) = trace.envelope_outline();
        assert_eq!(time, vec![0.0, 0.0, 1.0, 1.0]);
        assert_eq!(amplitude, vec![0.0, 1.0, 2.0, 0.0]);
    }
}
