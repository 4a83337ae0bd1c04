use crate::foundation::core::Rgba8;
use crate::foundation::error::{ChromaError, ChromaResult};

/// Straight-alpha source-over.
pub fn over(dst: Rgba8, src: Rgba8) -> Rgba8 {
    if src.a == 0 {
        return dst;
    }
    if src.a == 255 || dst.a == 0 {
        return src;
    }

    let sa = u32::from(src.a);
    let da = mul_div255(u32::from(dst.a), 255 - sa);
    let out_a = sa + da;

    let mix = |s: u8, d: u8| -> u8 {
        let num = u32::from(s) * sa + u32::from(d) * da;
        ((num + out_a / 2) / out_a).min(255) as u8
    };

    Rgba8::new(
        mix(src.r, dst.r),
        mix(src.g, dst.g),
        mix(src.b, dst.b),
        out_a.min(255) as u8,
    )
}

/// Source-over `src` onto `dst`, pixel by pixel. Both must be equal-length RGBA8 slices.
pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> ChromaResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ChromaError::evaluation(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over(
            Rgba8::new(d[0], d[1], d[2], d[3]),
            Rgba8::new(s[0], s[1], s[2], s[3]),
        );
        d.copy_from_slice(&out.to_array());
    }
    Ok(())
}

fn mul_div255(x: u32, y: u32) -> u32 {
    (x * y + 127) / 255
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
