use crate::foundation::core::Rgb8;

/// Hue in degrees `[0, 360)`, saturation and value in `[0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Hsv {
    /// Hue in degrees, `[0, 360)`.
    pub h: f64,
    /// Saturation, `[0, 100]`.
    pub s: f64,
    /// Value, `[0, 100]`.
    pub v: f64,
}

/// Convert an 8-bit RGB color to HSV.
///
/// Achromatic inputs (`max == min`) get `h = 0`; black additionally gets `s = 0`.
pub fn rgb_to_hsv(c: Rgb8) -> Hsv {
    let r = f64::from(c.r) / 255.0;
    let g = f64::from(c.g) / 255.0;
    let b = f64::from(c.b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let d = max - min;

    let s = if max == 0.0 { 0.0 } else { d / max };
    let h = if d == 0.0 {
        0.0
    } else if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    let mut h = h * 60.0;
    if h >= 360.0 {
        h -= 360.0;
    }

    Hsv {
        h,
        s: s * 100.0,
        v: max * 100.0,
    }
}

/// Convert HSV back to 8-bit RGB. Out-of-range inputs are wrapped (hue) or clamped (s, v).
pub fn hsv_to_rgb(hsv: Hsv) -> Rgb8 {
    let h = if hsv.h.is_finite() {
        hsv.h.rem_euclid(360.0)
    } else {
        0.0
    };
    let s = (hsv.s / 100.0).clamp(0.0, 1.0);
    let v = (hsv.v / 100.0).clamp(0.0, 1.0);

    let c = v * s;
    let sector = h / 60.0;
    let x = c * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match sector as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;

    Rgb8::new(to_u8(r1 + m), to_u8(g1 + m), to_u8(b1 + m))
}

fn to_u8(unit: f64) -> u8 {
    (unit * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/color/hsv.rs"]
mod tests;
