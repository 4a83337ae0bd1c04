use rayon::prelude::*;

use crate::{
    color::hsv::{Hsv, rgb_to_hsv},
    foundation::core::{Frame, Rgb8},
};

/// Inclusive HSV ranges around a reference color.
///
/// Each range is `[reference - tolerance, reference + tolerance]`, clamped to the channel domain
/// (hue to `[0, 360]`, saturation and value to `[0, 100]`). Hue does not wrap around.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToleranceWindow {
    /// Hue range, degrees.
    pub h: (f64, f64),
    /// Saturation range.
    pub s: (f64, f64),
    /// Value range.
    pub v: (f64, f64),
}

impl ToleranceWindow {
    /// Window of `±tolerance` on every channel around `reference`.
    pub fn around(reference: Hsv, tolerance: f64) -> Self {
        let span = |c: f64, max: f64| ((c - tolerance).max(0.0), (c + tolerance).min(max));
        Self {
            h: span(reference.h, 360.0),
            s: span(reference.s, 100.0),
            v: span(reference.v, 100.0),
        }
    }

    /// Inclusive on both ends of every range.
    pub fn contains(&self, c: Hsv) -> bool {
        let within = |(lo, hi): (f64, f64), x: f64| lo <= x && x <= hi;
        within(self.h, c.h) && within(self.s, c.s) && within(self.v, c.v)
    }
}

/// Per-tick keying counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyStats {
    /// Pixels classified as background (alpha forced to 0).
    pub keyed_pixels: u64,
}

/// Set alpha to 0 for every pixel whose HSV lies inside the tolerance window around `background`.
///
/// Pixels outside the window are left untouched, alpha included. The background's HSV is computed
/// once per call. Rows are independent, so `parallel` fans them out on the current rayon pool with
/// bit-identical results.
#[tracing::instrument(skip(frame), fields(w = frame.width(), h = frame.height()))]
pub fn key_frame(frame: &mut Frame, background: Rgb8, tolerance: f64, parallel: bool) -> KeyStats {
    if frame.is_empty() {
        return KeyStats::default();
    }

    let window = ToleranceWindow::around(rgb_to_hsv(background), tolerance);
    let row_bytes = frame.row_bytes();
    let bytes = frame.as_bytes_mut();

    let keyed_pixels = if parallel {
        bytes
            .par_chunks_mut(row_bytes)
            .map(|row| key_row(row, &window))
            .sum::<u64>()
    } else {
        bytes
            .chunks_mut(row_bytes)
            .map(|row| key_row(row, &window))
            .sum::<u64>()
    };

    KeyStats { keyed_pixels }
}

fn key_row(row: &mut [u8], window: &ToleranceWindow) -> u64 {
    let mut keyed = 0u64;
    for px in row.chunks_exact_mut(4) {
        let hsv = rgb_to_hsv(Rgb8::new(px[0], px[1], px[2]));
        if window.contains(hsv) {
            px[3] = 0;
            keyed += 1;
        }
    }
    keyed
}

#[cfg(test)]
#[path = "../../tests/unit/keying/engine.rs"]
mod tests;
