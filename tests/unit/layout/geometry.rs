use super::*;

fn state(w: u32, h: u32, locked: bool) -> GeometryState {
    GeometryState {
        canvas_width: w,
        canvas_height: h,
        aspect_locked: locked,
        ..GeometryState::default()
    }
}

#[test]
fn oversized_request_scales_uniformly_into_container() {
    let g = resolve_geometry(
        &state(4000, 3000, false),
        Size::new(640.0, 480.0),
        Size::new(1000.0, 800.0),
        DEFAULT_MAX_CONTAINER_FRACTION,
    );
    assert!(g.clamped);
    assert!(f64::from(g.width) <= 900.0);
    assert!(f64::from(g.height) <= 720.0);
    assert_eq!((g.width, g.height), (900, 675));
    assert_eq!(u64::from(g.width) * 3000, u64::from(g.height) * 4000);
}

#[test]
fn unset_dimensions_fall_back_to_native() {
    let g = resolve_geometry(
        &state(0, 300, false),
        Size::new(320.0, 240.0),
        Size::new(1920.0, 1080.0),
        0.9,
    );
    assert_eq!((g.width, g.height), (320, 240));
    assert!(!g.clamped);
    assert_eq!(g.scale, 1.0);
}

#[test]
fn aspect_lock_derives_height_from_width() {
    let g = resolve_geometry(
        &state(800, 100, true),
        Size::new(1280.0, 720.0),
        Size::new(4000.0, 4000.0),
        0.9,
    );
    assert_eq!((g.width, g.height), (800, 450));
}

#[test]
fn unlocked_keeps_attempted_aspect_when_clamped() {
    let g = resolve_geometry(
        &state(2000, 500, false),
        Size::new(1280.0, 720.0),
        Size::new(1000.0, 1000.0),
        0.9,
    );
    assert_eq!((g.width, g.height), (900, 225));
}

#[test]
fn height_overflow_alone_triggers_scaling() {
    let g = resolve_geometry(
        &state(100, 1000, false),
        Size::new(10.0, 10.0),
        Size::new(1000.0, 500.0),
        0.9,
    );
    assert!(g.clamped);
    assert_eq!((g.width, g.height), (45, 450));
}

#[test]
fn non_positive_container_axis_is_unconstrained() {
    let g = resolve_geometry(
        &state(3000, 200, false),
        Size::new(10.0, 10.0),
        Size::new(0.0, 1000.0),
        0.9,
    );
    assert_eq!((g.width, g.height), (3000, 200));
    assert!(!g.clamped);
}

#[test]
fn offset_is_carried_through() {
    let mut s = state(0, 0, false);
    s.offset = Vec2::new(12.0, -4.0);
    let g = resolve_geometry(&s, Size::new(8.0, 8.0), Size::new(100.0, 100.0), 0.9);
    assert_eq!(g.offset, Vec2::new(12.0, -4.0));
}
