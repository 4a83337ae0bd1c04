use crate::{
    config::CompositorConfig,
    foundation::core::{Rgb8, Vec2},
    foundation::error::{ChromaError, ChromaResult},
    layout::geometry::{DEFAULT_MAX_CONTAINER_FRACTION, GeometryState},
    render::surface::SurfaceSettings,
};

/// Default keying tolerance, in HSV units.
pub const DEFAULT_TOLERANCE: f64 = 30.0;

/// Everything the UI can change about the pipeline.
///
/// The setters are the only mutation surface; the frame loop reads a consistent snapshot of these
/// values for the duration of a tick and never writes them back.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositorState {
    tolerance: f64,
    smoothing: f64,
    background_override: Option<Rgb8>,
    geometry: GeometryState,
    max_container_fraction: f64,
    surface: SurfaceSettings,
}

impl Default for CompositorState {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            smoothing: 0.0,
            background_override: None,
            geometry: GeometryState::default(),
            max_container_fraction: DEFAULT_MAX_CONTAINER_FRACTION,
            surface: SurfaceSettings::default(),
        }
    }
}

impl CompositorState {
    /// Build a state by routing every config value through the public setters.
    pub fn from_config(config: &CompositorConfig) -> ChromaResult<Self> {
        let mut s = Self::default();
        s.set_tolerance(config.keying.tolerance)?;
        s.set_smoothing(config.keying.smoothing)?;
        s.set_background_override(config.keying.background);
        s.set_target_size(config.geometry.width, config.geometry.height);
        s.set_aspect_locked(config.geometry.aspect_locked);
        s.set_offset(config.geometry.offset_x, config.geometry.offset_y)?;
        s.set_max_container_fraction(config.geometry.max_container_fraction)?;
        s.set_surface_settings(SurfaceSettings {
            clear_rgba: config.surface.clear_rgba,
            filter: config.surface.filter,
        });
        Ok(s)
    }

    /// HSV tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// HSV tolerance; must be finite and >= 0.
    pub fn set_tolerance(&mut self, tolerance: f64) -> ChromaResult<()> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ChromaError::validation(format!(
                "tolerance must be finite and >= 0, got {tolerance}"
            )));
        }
        self.tolerance = tolerance;
        Ok(())
    }

    /// Edge smoothing strength.
    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// Edge smoothing strength; 0 disables the pass.
    pub fn set_smoothing(&mut self, strength: f64) -> ChromaResult<()> {
        if !strength.is_finite() || strength < 0.0 {
            return Err(ChromaError::validation(format!(
                "smoothing strength must be finite and >= 0, got {strength}"
            )));
        }
        self.smoothing = strength;
        Ok(())
    }

    /// Fixed background color, if any.
    pub fn background_override(&self) -> Option<Rgb8> {
        self.background_override
    }

    /// Use a fixed background instead of sampling. Takes effect on the next session start.
    pub fn set_background_override(&mut self, background: Option<Rgb8>) {
        self.background_override = background;
    }

    /// Requested placement.
    pub fn geometry(&self) -> &GeometryState {
        &self.geometry
    }

    /// Requested canvas size. Zero or negative values mean "use the native resolution".
    pub fn set_target_size(&mut self, width: i64, height: i64) {
        self.geometry.canvas_width = non_negative_px(width);
        self.geometry.canvas_height = non_negative_px(height);
    }

    /// Lock height to width via the native aspect ratio.
    pub fn set_aspect_locked(&mut self, locked: bool) {
        self.geometry.aspect_locked = locked;
    }

    /// Draw offset; both components must be finite.
    pub fn set_offset(&mut self, x: f64, y: f64) -> ChromaResult<()> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ChromaError::validation("offset must be finite"));
        }
        self.geometry.offset = Vec2::new(x, y);
        Ok(())
    }

    /// Share of the container the canvas may cover.
    pub fn max_container_fraction(&self) -> f64 {
        self.max_container_fraction
    }

    /// Share of the container the canvas may cover; must lie in `(0, 1]`.
    pub fn set_max_container_fraction(&mut self, fraction: f64) -> ChromaResult<()> {
        if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
            return Err(ChromaError::validation(format!(
                "max container fraction must be in (0, 1], got {fraction}"
            )));
        }
        self.max_container_fraction = fraction;
        Ok(())
    }

    /// Presentation settings.
    pub fn surface_settings(&self) -> SurfaceSettings {
        self.surface
    }

    /// Replace the presentation settings.
    pub fn set_surface_settings(&mut self, settings: SurfaceSettings) {
        self.surface = settings;
    }
}

fn non_negative_px(v: i64) -> u32 {
    u32::try_from(v.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[path = "../../tests/unit/session/state.rs"]
mod tests;
