//! # Analysis Configuration
//!
//! The configuration object consumed by [`crate::analyze`], loadable from
//! YAML or JSON documents.
//!
//! ## Configuration Search Path
//!
//! [`AmbiguityConfig::load`] uses the first file found:
//! 1. Path specified via `WAVEAMB_CONFIG` environment variable
//! 2. `./waveamb.yaml` (current directory)
//! 3. `~/.config/waveamb/config.yaml` (user config)
//! 4. `/etc/waveamb/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! # 13-chip rectangular pulse, samples are [re, im]
//! envelope: [[1,0],[1,0],[1,0],[1,0],[1,0],[1,0],[1,0],[1,0],[1,0],[1,0],[1,0],[1,0],[1,0]]
//! frequency_coding: false
//! doppler_span: 1.0     # F, units of 1/(M t_b)
//! doppler_points: 50    # K
//! delay_span: 1.0       # T, units of M t_b
//! delay_points: 50      # N
//! oversampling: 10.0    # sr
//! limits:
//!   max_kernel_cells: 67108864
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::{AmbResult, AmbiguityError, Complex, IQSample};

/// Error type for loading and saving configuration documents.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("config not found: {0}")]
    NotFound(String),
    /// Failed to read or write the configuration file
    #[error("failed to read config: {0}")]
    ReadError(String),
    /// Failed to parse or serialize configuration
    #[error("failed to parse config: {0}")]
    ParseError(String),
    /// Document parsed but describes an invalid analysis
    #[error("invalid config: {0}")]
    Validation(#[from] AmbiguityError),
}

/// Upper bounds on the structures built by the correlation engine.
///
/// Each field caps a cell count; exceeding one fails the analysis with
/// [`AmbiguityError::ResourceExhausted`] before anything is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Zero-padded waveform length, m + 2·Tm
    pub max_padded_samples: usize,
    /// Stored band cells of the shifted correlation structure, (N+1)·m
    pub max_band_cells: usize,
    /// Doppler kernel cells, (2K+2)·m
    pub max_kernel_cells: usize,
    /// Dense quadrant cells, (2K+2)·(N+1)
    pub max_surface_cells: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_padded_samples: 1 << 24,
            max_band_cells: 1 << 26,
            max_kernel_cells: 1 << 26,
            max_surface_cells: 1 << 24,
        }
    }
}

impl ResourceLimits {
    /// No bounds at all. Intended for tests and trusted callers.
    pub fn unbounded() -> Self {
        Self {
            max_padded_samples: usize::MAX,
            max_band_cells: usize::MAX,
            max_kernel_cells: usize::MAX,
            max_surface_cells: usize::MAX,
        }
    }

    /// Fail with `ResourceExhausted` if `rows × cols` exceeds `limit`.
    pub(crate) fn check(what: &'static str, rows: usize, cols: usize, limit: usize) -> AmbResult<()> {
        let required = rows.checked_mul(cols).unwrap_or(usize::MAX);
        if required > limit {
            return Err(AmbiguityError::ResourceExhausted {
                what,
                required,
                limit,
            });
        }
        Ok(())
    }
}

/// Parameters of one ambiguity analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbiguityConfig {
    /// Basic chip envelope, one complex sample per chip
    pub envelope: Vec<IQSample>,
    /// Apply the frequency code on top of the envelope phase
    #[serde(default)]
    pub frequency_coding: bool,
    /// Per-chip frequency offsets in units of 1/t_b
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_code: Option<Vec<f64>>,
    /// Maximal Doppler shift F, in units of 1/(M t_b)
    pub doppler_span: f64,
    /// Number of Doppler grid points K
    pub doppler_points: usize,
    /// Maximal delay T, in units of M t_b
    pub delay_span: f64,
    /// Number of delay grid points N on each side
    pub delay_points: usize,
    /// Oversampling ratio sr (>= 1)
    pub oversampling: f64,
    /// Memory bounds for the correlation engine
    #[serde(default)]
    pub limits: ResourceLimits,
}

impl Default for AmbiguityConfig {
    fn default() -> Self {
        Self {
            envelope: vec![Complex::new(1.0, 0.0); 51],
            frequency_coding: false,
            frequency_code: None,
            doppler_span: 1.0,
            doppler_points: 50,
            delay_span: 1.0,
            delay_points: 50,
            oversampling: 10.0,
            limits: ResourceLimits::default(),
        }
    }
}

impl AmbiguityConfig {
    /// Create a new builder starting from the defaults
    pub fn builder() -> AmbiguityConfigBuilder {
        AmbiguityConfigBuilder::default()
    }

    /// Number of chips in the basic envelope (m_basic)
    pub fn basic_length(&self) -> usize {
        self.envelope.len()
    }

    /// The frequency code when coding is enabled, `None` otherwise.
    pub fn active_frequency_code(&self) -> Option<&[f64]> {
        if self.frequency_coding {
            self.frequency_code.as_deref()
        } else {
            None
        }
    }

    /// Check every field before any computation starts.
    pub fn validate(&self) -> AmbResult<()> {
        if self.envelope.is_empty() {
            return Err(AmbiguityError::invalid("envelope", "must contain at least one chip"));
        }
        if self.envelope.iter().any(|s| !s.re.is_finite() || !s.im.is_finite()) {
            return Err(AmbiguityError::invalid("envelope", "samples must be finite"));
        }
        if self.doppler_points == 0 {
            return Err(AmbiguityError::InvalidGridSize {
                axis: "doppler",
                points: self.doppler_points,
            });
        }
        if self.delay_points == 0 {
            return Err(AmbiguityError::InvalidGridSize {
                axis: "delay",
                points: self.delay_points,
            });
        }
        if !(self.delay_span.is_finite() && self.delay_span > 0.0) {
            return Err(AmbiguityError::invalid(
                "delay_span",
                format!("must be positive and finite, got {}", self.delay_span),
            ));
        }
        if !(self.doppler_span.is_finite() && self.doppler_span > 0.0) {
            return Err(AmbiguityError::invalid(
                "doppler_span",
                format!("must be positive and finite, got {}", self.doppler_span),
            ));
        }
        if !(self.oversampling.is_finite() && self.oversampling >= 1.0) {
            return Err(AmbiguityError::InvalidOversampling(self.oversampling));
        }

        if self.frequency_coding {
            let code = self.frequency_code.as_ref().ok_or_else(|| {
                AmbiguityError::invalid("frequency_code", "required when frequency_coding is set")
            })?;
            if code.len() != self.envelope.len() {
                return Err(AmbiguityError::ShapeMismatch {
                    what: "frequency_code",
                    expected: self.envelope.len(),
                    actual: code.len(),
                });
            }
            if code.iter().any(|f| !f.is_finite()) {
                return Err(AmbiguityError::invalid("frequency_code", "offsets must be finite"));
            }
        } else if self.frequency_code.is_some() {
            tracing::warn!("frequency_code given while frequency_coding is disabled; ignoring it");
        }

        Ok(())
    }

    /// Load configuration from the default search path.
    ///
    /// Returns the default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("WAVEAMB_CONFIG") {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            return Self::load_from(&path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load and validate configuration from a YAML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "loading ambiguity config");
        Self::parse(&content)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a YAML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_yaml()?;
        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./waveamb.yaml")];

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "waveamb") {
            paths.push(config_dir.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/waveamb/config.yaml"));
        paths
    }
}

/// Builder for AmbiguityConfig
#[derive(Debug, Clone, Default)]
pub struct AmbiguityConfigBuilder {
    config: AmbiguityConfig,
}

impl AmbiguityConfigBuilder {
    pub fn envelope(mut self, envelope: Vec<IQSample>) -> Self {
        self.config.envelope = envelope;
        self
    }

    /// Real-valued envelope (amplitudes with zero phase, or ±1 phase codes)
    pub fn real_envelope(mut self, envelope: &[f64]) -> Self {
        self.config.envelope = crate::types::complex_ops::from_real(envelope);
        self
    }

    /// Enable frequency coding with the given per-chip offsets
    pub fn frequency_code(mut self, code: Vec<f64>) -> Self {
        self.config.frequency_coding = true;
        self.config.frequency_code = Some(code);
        self
    }

    pub fn doppler(mut self, span: f64, points: usize) -> Self {
        self.config.doppler_span = span;
        self.config.doppler_points = points;
        self
    }

    pub fn delay(mut self, span: f64, points: usize) -> Self {
        self.config.delay_span = span;
        self.config.delay_points = points;
        self
    }

    pub fn oversampling(mut self, ratio: f64) -> Self {
        self.config.oversampling = ratio;
        self
    }

    pub fn limits(mut self, limits: ResourceLimits) -> Self {
        self.config.limits = limits;
        self
    }

    pub fn build(self) -> AmbiguityConfig {
        self.config
    }
}
