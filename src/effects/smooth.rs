use rayon::prelude::*;

use crate::foundation::core::Frame;

/// Strength at which a pixel fully surrounded by transparency is blended by its neighbor ratio.
const STRENGTH_UNIT: f64 = 30.0;

/// Transparent and opaque counts over a pixel's in-bounds 8-neighborhood.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeighborCounts {
    /// Neighbors with alpha == 0.
    pub transparent: u8,
    /// Neighbors with alpha > 0.
    pub opaque: u8,
}

/// Per-tick smoothing counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SmoothStats {
    /// Pixels whose alpha was reduced because they border a keyed pixel.
    pub softened_pixels: u64,
}

/// Soften alpha along keyed edges.
///
/// Reads only from `src` and writes a fresh buffer, so the scan order cannot leak into the result.
/// For each pixel with alpha > 0 and at least one transparent in-bounds neighbor:
/// `alpha' = max(0, alpha * (1 - (transparent / 8) * (strength / 30)))`. Neighbors outside the
/// frame are skipped, not counted as transparent, and the divisor stays 8. Alpha never increases.
/// The new alpha is rounded to the nearest integer with halves rounded away from zero
/// (`12 * 0.875 = 10.5` becomes 11).
///
/// `strength <= 0` (or non-finite) returns an exact copy of `src`.
#[tracing::instrument(skip(src), fields(w = src.width(), h = src.height()))]
pub fn smooth_edges(src: &Frame, strength: f64, parallel: bool) -> (Frame, SmoothStats) {
    let mut out = src.clone();
    if !strength.is_finite() || strength <= 0.0 || src.is_empty() {
        return (out, SmoothStats::default());
    }

    let row_bytes = src.row_bytes();
    let scale = strength / STRENGTH_UNIT;
    let bytes = out.as_bytes_mut();

    let softened_pixels = if parallel {
        bytes
            .par_chunks_mut(row_bytes)
            .enumerate()
            .map(|(y, row)| smooth_row(src, y as u32, row, scale))
            .sum::<u64>()
    } else {
        bytes
            .chunks_mut(row_bytes)
            .enumerate()
            .map(|(y, row)| smooth_row(src, y as u32, row, scale))
            .sum::<u64>()
    };

    (out, SmoothStats { softened_pixels })
}

fn smooth_row(src: &Frame, y: u32, dst_row: &mut [u8], scale: f64) -> u64 {
    let mut softened = 0u64;
    for (x, px) in dst_row.chunks_exact_mut(4).enumerate() {
        let alpha = px[3];
        if alpha == 0 {
            continue;
        }
        let counts = neighbor_counts(src, x as u32, y);
        if counts.transparent == 0 {
            continue;
        }
        let blend = (f64::from(counts.transparent) / 8.0) * scale;
        let next = (f64::from(alpha) * (1.0 - blend)).max(0.0).round() as u8;
        if next < alpha {
            softened += 1;
        }
        px[3] = next.min(alpha);
    }
    softened
}

/// Count transparent/opaque neighbors of `(x, y)`, skipping positions outside `frame`.
pub fn neighbor_counts(frame: &Frame, x: u32, y: u32) -> NeighborCounts {
    let mut counts = NeighborCounts::default();
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = i64::from(x) + dx;
            let ny = i64::from(y) + dy;
            if nx < 0 || ny < 0 {
                continue;
            }
            let Some(p) = frame.pixel(nx as u32, ny as u32) else {
                continue;
            };
            if p.a == 0 {
                counts.transparent += 1;
            } else {
                counts.opaque += 1;
            }
        }
    }
    counts
}

#[cfg(test)]
#[path = "../../tests/unit/effects/smooth.rs"]
mod tests;
