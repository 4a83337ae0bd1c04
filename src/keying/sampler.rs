use std::collections::HashMap;

use crate::foundation::core::{Frame, Rgb8};

/// Estimate the background color as the most frequent exact RGB triple in `frame`.
///
/// Alpha is ignored. Ties resolve to the color seen first in row-major scan order, so the result is
/// deterministic for a given frame. Returns `None` only for a frame with no pixels.
///
/// This is a majority heuristic: when the subject covers more of the frame than the backdrop the
/// subject's dominant color wins. That degradation is accepted; callers that know the backdrop can
/// bypass sampling with an explicit background.
#[tracing::instrument(skip(frame), fields(w = frame.width(), h = frame.height()))]
pub fn sample_background(frame: &Frame) -> Option<Rgb8> {
    let mut hist = HashMap::<Rgb8, ColorCount>::new();
    for (idx, px) in frame.pixels().enumerate() {
        hist.entry(px.rgb())
            .or_insert(ColorCount {
                count: 0,
                first_seen: idx,
            })
            .count += 1;
    }

    let (color, stats) = hist
        .into_iter()
        .max_by(|(_, a), (_, b)| {
            a.count
                .cmp(&b.count)
                .then_with(|| b.first_seen.cmp(&a.first_seen))
        })?;

    tracing::debug!(
        r = color.r,
        g = color.g,
        b = color.b,
        count = stats.count,
        "sampled background color"
    );
    Some(color)
}

#[derive(Clone, Copy, Debug)]
struct ColorCount {
    count: u64,
    first_seen: usize,
}

#[cfg(test)]
#[path = "../../tests/unit/keying/sampler.rs"]
mod tests;
