use super::*;

#[test]
fn empty_object_yields_defaults() {
    let cfg = CompositorConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, CompositorConfig::default());
    assert_eq!(cfg.keying.tolerance, DEFAULT_TOLERANCE);
    assert_eq!(cfg.geometry.max_container_fraction, 0.9);
    assert_eq!(cfg.surface.filter, ScaleFilter::Triangle);
}

#[test]
fn sections_parse_with_array_colors() {
    let cfg = CompositorConfig::from_json_str(
        r#"{
            "keying": { "tolerance": 42, "smoothing": 10, "background": [0, 255, 0] },
            "geometry": { "width": 640, "height": -1, "aspect_locked": true, "offset_x": 8 },
            "surface": { "clear_rgba": [0, 0, 0, 255], "filter": "nearest" },
            "threading": { "parallel": true, "threads": 2 }
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.keying.background, Some(Rgb8::new(0, 255, 0)));
    assert_eq!(cfg.geometry.width, 640);
    assert!(cfg.geometry.aspect_locked);
    assert_eq!(cfg.surface.clear_rgba, Some(Rgba8::new(0, 0, 0, 255)));
    assert_eq!(cfg.surface.filter, ScaleFilter::Nearest);
    assert_eq!(cfg.threading.threads, Some(2));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = CompositorConfig::from_json_str(r#"{ "keying": { "tolerence": 3 } }"#).unwrap_err();
    assert!(err.to_string().contains("serialization error:"));
}

#[test]
fn invalid_values_fail_validation() {
    let err =
        CompositorConfig::from_json_str(r#"{ "keying": { "tolerance": -5 } }"#).unwrap_err();
    assert!(err.to_string().contains("validation error:"));

    assert!(
        CompositorConfig::from_json_str(r#"{ "threading": { "threads": 0 } }"#).is_err()
    );
}

#[test]
fn pretty_json_reloads_identically() {
    let mut cfg = CompositorConfig::default();
    cfg.keying.smoothing = 4.5;
    cfg.geometry.offset_y = -3.0;
    let json = cfg.to_json_pretty().unwrap();
    assert_eq!(CompositorConfig::from_json_str(&json).unwrap(), cfg);
}
