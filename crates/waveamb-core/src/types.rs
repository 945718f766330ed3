//! Core types for ambiguity analysis
//!
//! Sample aliases shared by every stage of the pipeline, and the error type
//! returned by validation and by the correlation engine.
//!
//! Time is measured in units of the basic chip duration `t_b`, so a sample
//! index `j` of a waveform oversampled by `r` sits at `t = j / r`. Doppler is
//! measured in cycles per chip, and converted to the display unit `ν·M·t_b`
//! only when the surface is assembled.

use num_complex::Complex64;

/// Type alias for complex numbers using f64 precision
pub type Complex = Complex64;

/// A single complex baseband sample
pub type IQSample = Complex64;

/// A buffer of complex baseband samples
pub type IQBuffer = Vec<IQSample>;

/// Result type for ambiguity computations
pub type AmbResult<T> = Result<T, AmbiguityError>;

/// Errors raised while validating inputs or building the ambiguity surface
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AmbiguityError {
    #[error("Shape mismatch for {what}: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid grid size: {axis} needs at least one point, got {points}")]
    InvalidGridSize { axis: &'static str, points: usize },

    #[error("Invalid oversampling factor: {0}. Must be a finite value >= 1")]
    InvalidOversampling(f64),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Shift index out of range in delay row {row}: window ends at {end}, padded length is {len}")]
    IndexOutOfRange { row: usize, end: usize, len: usize },

    #[error("Resource limit exceeded for {what}: {required} cells required, limit is {limit}")]
    ResourceExhausted {
        what: &'static str,
        required: usize,
        limit: usize,
    },
}

impl AmbiguityError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        AmbiguityError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// True for errors detected before any computation starts.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            AmbiguityError::ShapeMismatch { .. }
                | AmbiguityError::InvalidGridSize { .. }
                | AmbiguityError::InvalidOversampling(_)
                | AmbiguityError::InvalidParameter { .. }
        )
    }

    /// True for structural failures raised while correlating.
    pub fn is_structural_error(&self) -> bool {
        matches!(
            self,
            AmbiguityError::IndexOutOfRange { .. } | AmbiguityError::ResourceExhausted { .. }
        )
    }
}

/// Helper functions for working with complex samples
pub mod complex_ops {
    use super::*;

    /// Create a complex number from magnitude and phase
    #[inline]
    pub fn from_polar(magnitude: f64, phase: f64) -> Complex {
        Complex::new(magnitude * phase.cos(), magnitude * phase.sin())
    }

    /// Total energy of a signal (sum of squared magnitudes)
    pub fn energy(samples: &[IQSample]) -> f64 {
        samples.iter().map(|s| s.norm_sqr()).sum()
    }

    /// Lift a real-valued envelope to complex samples
    pub fn from_real(samples: &[f64]) -> IQBuffer {
        samples.iter().map(|&x| Complex::new(x, 0.0)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_complex_from_polar() {
        let c = complex_ops::from_polar(2.0, PI / 2.0);
        assert_relative_eq!(c.re, 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.im, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_energy() {
        let samples = vec![Complex::new(3.0, 4.0), Complex::new(0.0, 1.0)];
        assert_relative_eq!(complex_ops::energy(&samples), 26.0, epsilon = 1e-12);
    }

    #[test]
    fn test_error_classification() {
        let err = AmbiguityError::InvalidGridSize {
            axis: "doppler",
            points: 0,
        };
        assert!(err.is_validation_error());
        assert!(!err.is_structural_error());

        let err = AmbiguityError::ResourceExhausted {
            what: "kernel",
            required: 10,
            limit: 5,
        };
        assert!(err.is_structural_error());
        assert!(err.to_string().contains("kernel"));
    }
}
