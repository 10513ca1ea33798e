// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use stream_compositor::Config;
use stream_compositor::frames::PixelFormat;

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("stream-compositor-test-{}", std::process::id()))
        .join(name)
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(
        !config.point_cloud.enabled_on_start,
        "Point-cloud view should start disabled"
    );
    assert!((config.point_cloud.grayscale_max_range_m - 1.2).abs() < f32::EPSILON);
    assert!(config.validate().is_ok(), "Defaults must validate");
}

#[test]
fn test_config_save_and_load() {
    let path = temp_path("roundtrip/config.json");
    let mut config = Config::default();
    config.point_cloud.grayscale_max_range_m = 3.5;
    config.sensor.color_format = PixelFormat::Rgb8;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_load_or_default_on_invalid_file() {
    let path = temp_path("invalid/config.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not json").unwrap();

    assert!(Config::load(&path).is_err());
    assert_eq!(Config::load_or_default(Some(&path)), Config::default());

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_load_or_default_on_missing_file() {
    let path = temp_path("missing/config.json");
    assert_eq!(Config::load_or_default(Some(&path)), Config::default());
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let path = temp_path("range/config.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{ "point_cloud": { "grayscale_max_range_m": -1.0 } }"#).unwrap();

    assert!(Config::load(&path).is_err());

    std::fs::remove_file(&path).ok();
}
