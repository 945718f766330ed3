//! Rendering seam
//!
//! Plotting lives outside this crate. A [`Renderer`] receives a finished
//! [`AmbiguityAnalysis`] together with a destination and an output format;
//! [`render_analysis`] keeps the numeric result whether or not rendering
//! succeeds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::analysis::{analyze, AmbiguityAnalysis};
use crate::config::AmbiguityConfig;
use crate::types::AmbResult;

/// Output format selector passed to a renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    #[default]
    Svg,
    Png,
    Pdf,
    Eps,
}

impl RenderFormat {
    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            RenderFormat::Svg => "svg",
            RenderFormat::Png => "png",
            RenderFormat::Pdf => "pdf",
            RenderFormat::Eps => "eps",
        }
    }
}

impl fmt::Display for RenderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for RenderFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(RenderFormat::Svg),
            "png" => Ok(RenderFormat::Png),
            "pdf" => Ok(RenderFormat::Pdf),
            "eps" => Ok(RenderFormat::Eps),
            other => Err(RenderError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Errors reported by a renderer. They never invalidate the numeric result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("Unsupported render format: {0}")]
    UnsupportedFormat(String),

    #[error("Render failure for {destination}: {reason}")]
    RenderFailure { destination: String, reason: String },
}

/// Consumer of analysis results that produces visual artifacts.
pub trait Renderer {
    fn render(
        &self,
        analysis: &AmbiguityAnalysis,
        destination: &str,
        format: RenderFormat,
    ) -> Result<(), RenderError>;
}

/// Numeric result plus the outcome of rendering it.
#[derive(Debug)]
pub struct RenderedAnalysis {
    pub analysis: AmbiguityAnalysis,
    pub render: Result<(), RenderError>,
}

/// Analyze `config`, then hand the result to `renderer`.
///
/// Numeric errors are returned as `Err`; a render failure is reported in
/// [`RenderedAnalysis::render`] next to the intact analysis.
pub fn render_analysis(
    config: &AmbiguityConfig,
    renderer: &dyn Renderer,
    destination: &str,
    format: RenderFormat,
) -> AmbResult<RenderedAnalysis> {
    let analysis = analyze(config)?;
    let render = renderer.render(&analysis, destination, format);
    if let Err(e) = &render {
        tracing::warn!(destination, %format, "rendering failed: {}", e);
    }
    Ok(RenderedAnalysis { analysis, render })
}
