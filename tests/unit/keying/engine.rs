use super::*;
use crate::foundation::core::Rgba8;

const GREEN: Rgb8 = Rgb8::new(0, 255, 0);

#[test]
fn exact_background_is_keyed_even_at_zero_tolerance() {
    let mut f = Frame::solid(3, 2, GREEN.with_alpha(255)).unwrap();
    let stats = key_frame(&mut f, GREEN, 0.0, false);
    assert_eq!(stats.keyed_pixels, 6);
    assert!(f.pixels().all(|p| p.a == 0));
}

#[test]
fn pixel_outside_window_keeps_color_and_alpha() {
    let mut f = Frame::solid(2, 1, GREEN.with_alpha(255)).unwrap();
    f.set_pixel(1, 0, Rgba8::new(255, 0, 0, 180));
    let stats = key_frame(&mut f, GREEN, 50.0, false);
    assert_eq!(stats.keyed_pixels, 1);
    assert_eq!(f.pixel(1, 0), Some(Rgba8::new(255, 0, 0, 180)));
}

#[test]
fn keying_changes_only_alpha() {
    let mut f = Frame::solid(1, 1, Rgba8::new(10, 240, 12, 255)).unwrap();
    key_frame(&mut f, GREEN, 20.0, false);
    assert_eq!(f.pixel(0, 0), Some(Rgba8::new(10, 240, 12, 0)));
}

#[test]
fn window_bounds_are_inclusive_and_clamped() {
    let w = ToleranceWindow::around(
        Hsv {
            h: 10.0,
            s: 95.0,
            v: 50.0,
        },
        20.0,
    );
    assert_eq!(w.h, (0.0, 30.0));
    assert_eq!(w.s, (75.0, 100.0));
    assert_eq!(w.v, (30.0, 70.0));
    assert!(w.contains(Hsv {
        h: 30.0,
        s: 75.0,
        v: 70.0
    }));
    assert!(!w.contains(Hsv {
        h: 30.5,
        s: 80.0,
        v: 50.0
    }));
}

#[test]
fn single_channel_outside_tolerance_blocks_keying() {
    // Same hue and saturation as green, value well below the window.
    let dark_green = Rgb8::new(0, 64, 0);
    let mut f = Frame::solid(1, 1, dark_green.with_alpha(255)).unwrap();
    let stats = key_frame(&mut f, GREEN, 10.0, false);
    assert_eq!(stats.keyed_pixels, 0);
    assert_eq!(f.pixel(0, 0).map(|p| p.a), Some(255));
}

#[test]
fn keying_is_idempotent() {
    let mut f = Frame::solid(4, 4, GREEN.with_alpha(255)).unwrap();
    f.set_pixel(1, 1, Rgba8::new(200, 30, 40, 255));
    key_frame(&mut f, GREEN, 30.0, false);
    let once = f.clone();
    key_frame(&mut f, GREEN, 30.0, false);
    assert_eq!(f, once);
}

#[test]
fn parallel_rows_match_sequential() {
    let mut a = Frame::solid(16, 9, GREEN.with_alpha(255)).unwrap();
    for i in 0..16u32 {
        a.set_pixel(i, i % 9, Rgba8::new((i * 15) as u8, 100, 200, 255));
    }
    let mut b = a.clone();
    let sa = key_frame(&mut a, GREEN, 25.0, false);
    let sb = key_frame(&mut b, GREEN, 25.0, true);
    assert_eq!(a, b);
    assert_eq!(sa, sb);
}

#[test]
fn empty_frame_is_a_noop() {
    let mut f = Frame::transparent(0, 5).unwrap();
    assert_eq!(key_frame(&mut f, GREEN, 10.0, true), KeyStats::default());
}
