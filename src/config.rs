//! JSON configuration for a compositor session.
//!
//! Every section is optional; missing fields take their defaults. Unknown fields are rejected so
//! typos surface as errors instead of silently falling back.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::{
    foundation::core::{Rgb8, Rgba8},
    foundation::error::{ChromaError, ChromaResult},
    layout::geometry::DEFAULT_MAX_CONTAINER_FRACTION,
    render::surface::ScaleFilter,
    session::frame_loop::PipelineThreading,
    session::state::{CompositorState, DEFAULT_TOLERANCE},
};

/// Top-level configuration file model.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositorConfig {
    /// Background classification and edge smoothing.
    pub keying: KeyingConfig,
    /// Canvas size and placement.
    pub geometry: GeometryConfig,
    /// Presentation surface settings.
    pub surface: SurfaceConfig,
    /// Worker threads for the per-pixel stages.
    pub threading: PipelineThreading,
}

/// `keying` section.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyingConfig {
    /// Symmetric HSV tolerance around the background color.
    pub tolerance: f64,
    /// Edge smoothing strength; 0 disables smoothing.
    pub smoothing: f64,
    /// Fixed background color; bypasses sampling when set.
    pub background: Option<Rgb8>,
}

impl Default for KeyingConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            smoothing: 0.0,
            background: None,
        }
    }
}

/// `geometry` section.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeometryConfig {
    /// Target width; 0 or negative uses the native width.
    pub width: i64,
    /// Target height; 0 or negative uses the native height.
    pub height: i64,
    /// Derive height from width and the native aspect ratio.
    pub aspect_locked: bool,
    /// Horizontal draw offset in surface pixels.
    pub offset_x: f64,
    /// Vertical draw offset in surface pixels.
    pub offset_y: f64,
    /// Largest share of the container the canvas may cover on either axis.
    pub max_container_fraction: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            aspect_locked: false,
            offset_x: 0.0,
            offset_y: 0.0,
            max_container_fraction: DEFAULT_MAX_CONTAINER_FRACTION,
        }
    }
}

/// `surface` section.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurfaceConfig {
    /// Clear color as `[r, g, b, a]`; transparent when absent.
    pub clear_rgba: Option<Rgba8>,
    /// Resampling filter for size changes.
    pub filter: ScaleFilter,
}

impl CompositorConfig {
    /// Load and validate a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> ChromaResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ChromaError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Parse and validate configuration JSON from any reader.
    pub fn from_reader(r: impl Read) -> ChromaResult<Self> {
        let cfg: Self =
            serde_json::from_reader(r).map_err(|e| ChromaError::serde(format!("config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate configuration JSON held in memory.
    pub fn from_json_str(s: &str) -> ChromaResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Pretty-printed JSON, e.g. for `chromakey config`.
    pub fn to_json_pretty(&self) -> ChromaResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ChromaError::serde(e.to_string()))
    }

    /// Check every value against the same rules the runtime setters enforce.
    pub fn validate(&self) -> ChromaResult<()> {
        CompositorState::from_config(self)?;
        if let Some(0) = self.threading.threads {
            return Err(ChromaError::validation(
                "threading.threads must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
