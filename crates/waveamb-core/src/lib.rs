//! # Pulse Ambiguity Function Library
//!
//! This crate computes the narrowband ambiguity function |χ(τ, ν)| of a
//! single pulse described by a complex chip envelope and an optional
//! per-chip frequency code.
//!
//! ## Overview
//!
//! - **Waveform synthesis**: oversample the chip envelope and build the
//!   continuous-phase frequency ramp
//! - **Grid planning**: uniform Doppler axis and sample-quantized delay axis
//! - **Correlation**: banded shift structure times a Doppler kernel, one
//!   quadrant of the delay–Doppler plane
//! - **Surface assembly**: fold the quadrant into a surface over the full
//!   delay axis and non-negative Doppler
//!
//! ## Signal Flow
//!
//! ```text
//! envelope, code → synthesize → plan grids → correlate → fold → surface
//!                      └──────────── trace (amplitude, phase, frequency)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use waveamb_core::prelude::*;
//!
//! let config = AmbiguityConfig::builder()
//!     .real_envelope(&[1.0; 13])
//!     .doppler(1.0, 50)
//!     .delay(1.0, 50)
//!     .oversampling(10.0)
//!     .build();
//!
//! let analysis = analyze(&config).unwrap();
//! let (row, col, peak) = analysis.surface.find_peak();
//! assert_eq!((row, col), (0, 50));
//! assert!((peak - 1.0).abs() < 1e-12);
//! ```

pub mod analysis;
pub mod config;
pub mod correlation;
pub mod grid;
pub mod logging;
pub mod render;
pub mod sparse;
pub mod surface;
pub mod types;
pub mod waveform;

pub use analysis::{analyze, AmbiguityAnalysis};
pub use config::{AmbiguityConfig, AmbiguityConfigBuilder, ConfigError, ResourceLimits};
pub use correlation::{compute_quadrant, Quadrant};
pub use grid::{DelayGrid, DopplerGrid};
pub use render::{render_analysis, RenderError, RenderFormat, RenderedAnalysis, Renderer};
pub use surface::{assemble, AmbiguitySurface, SurfaceData};
pub use types::{AmbResult, AmbiguityError, Complex, IQSample};
pub use waveform::{synthesize, Waveform, WaveformTrace};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::analysis::{analyze, AmbiguityAnalysis};
    pub use crate::config::{AmbiguityConfig, ResourceLimits};
    pub use crate::render::{render_analysis, RenderFormat, Renderer};
    pub use crate::surface::AmbiguitySurface;
    pub use crate::types::{AmbResult, AmbiguityError, Complex, IQSample};
    pub use crate::waveform::WaveformTrace;
}
