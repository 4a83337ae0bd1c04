use crate::foundation::core::{Size, Vec2};

/// Default share of the container a canvas may occupy on either axis.
pub const DEFAULT_MAX_CONTAINER_FRACTION: f64 = 0.9;

/// UI-driven placement parameters, read once per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryState {
    /// Requested canvas width; 0 means "use native".
    pub canvas_width: u32,
    /// Requested canvas height; 0 means "use native".
    pub canvas_height: u32,
    /// Translation applied when drawing onto the presentation surface.
    pub offset: Vec2,
    /// Derive height from width and the source's native aspect ratio on every tick.
    pub aspect_locked: bool,
}

impl Default for GeometryState {
    fn default() -> Self {
        Self {
            canvas_width: 0,
            canvas_height: 0,
            offset: Vec2::ZERO,
            aspect_locked: false,
        }
    }
}

/// Effective placement after container constraints, reported back for UI synchronization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedGeometry {
    /// Canvas width in pixels, at least 1.
    pub width: u32,
    /// Canvas height in pixels, at least 1.
    pub height: u32,
    /// Draw offset, passed through unchanged.
    pub offset: Vec2,
    /// Whether the requested size was scaled down to fit the container.
    pub clamped: bool,
    /// Uniform factor applied to the requested size (1.0 when not clamped).
    pub scale: f64,
}

impl ResolvedGeometry {
    /// Canvas size as a `kurbo::Size`.
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Compute the canvas size and offset for one tick.
///
/// Explicit dimensions win only when both are > 0; otherwise the source's `native` size is used.
/// With `aspect_locked`, height is re-derived from width and the native aspect ratio. If either
/// dimension exceeds `max_fraction` of the container, both are scaled by the smallest factor that
/// fits, preserving the attempted aspect ratio. Container axes that are not positive impose no
/// constraint. Dimensions are floored to whole pixels and never drop below 1.
pub fn resolve_geometry(
    state: &GeometryState,
    native: Size,
    container: Size,
    max_fraction: f64,
) -> ResolvedGeometry {
    let explicit = state.canvas_width > 0 && state.canvas_height > 0;
    let (w, mut h) = if explicit {
        (f64::from(state.canvas_width), f64::from(state.canvas_height))
    } else {
        (native.width, native.height)
    };

    if state.aspect_locked && native.width > 0.0 {
        h = w * (native.height / native.width);
    }

    let limit_w = axis_limit(container.width, max_fraction);
    let limit_h = axis_limit(container.height, max_fraction);

    let mut out = ResolvedGeometry {
        width: to_pixels(w, f64::INFINITY),
        height: to_pixels(h, f64::INFINITY),
        offset: state.offset,
        clamped: false,
        scale: 1.0,
    };

    if w > limit_w || h > limit_h {
        let scale = (limit_w / w).min(limit_h / h);
        out.width = to_pixels(w * scale, limit_w);
        out.height = to_pixels(h * scale, limit_h);
        out.clamped = true;
        out.scale = scale;
        tracing::warn!(
            requested_w = w,
            requested_h = h,
            width = out.width,
            height = out.height,
            "canvas exceeds container bounds; scaled down"
        );
    }

    out
}

fn axis_limit(container: f64, max_fraction: f64) -> f64 {
    if container.is_finite() && container > 0.0 {
        container * max_fraction
    } else {
        f64::INFINITY
    }
}

fn to_pixels(v: f64, limit: f64) -> u32 {
    // Absorb float noise like 674.9999999 before flooring, but never round past the limit.
    let snapped = (v + 1e-6).floor().min(limit.floor());
    if snapped.is_finite() {
        (snapped.max(1.0).min(f64::from(u32::MAX))) as u32
    } else {
        1
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/geometry.rs"]
mod tests;
