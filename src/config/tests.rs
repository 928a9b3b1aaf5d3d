//! Configuration unit tests.

use super::*;

#[test]
fn empty_toml_gives_defaults() {
    let parsed = UiConfig::from_toml_str("").expect("deserialize");
    assert_eq!(parsed.surface.width, 448);
    assert_eq!(parsed.surface.height, 720);
    assert_eq!(parsed.surface.layout, PixelLayout::RowMajor);
    assert!(parsed.fonts.default.is_none());
    assert!(parsed.render.multithreaded);
    assert_eq!(parsed.render.max_workers, 4);
    assert!(parsed.theme.is_none());
}

#[test]
fn partial_toml_uses_defaults() {
    let toml_str = r#"
[surface]
layout = "tiled"
height = 768

[render]
capture_mode = true
"#;
    let parsed = UiConfig::from_toml_str(toml_str).expect("deserialize");
    assert_eq!(parsed.surface.layout, PixelLayout::Tiled);
    assert_eq!(parsed.surface.height, 768);
    // Other fields should be defaults
    assert_eq!(parsed.surface.width, 448);
    assert!(parsed.render.capture_mode);
    assert!(parsed.render.multithreaded);
    assert!((parsed.fonts.size - 23.0).abs() < f32::EPSILON);
}

#[test]
fn font_paths_from_toml() {
    let toml_str = r#"
theme = "/etc/tessera/theme.toml"

[fonts]
default = "/usr/share/fonts/ui.ttf"
icon = "/usr/share/fonts/icons.ttf"
width_table = false
"#;
    let parsed = UiConfig::from_toml_str(toml_str).expect("deserialize");
    assert_eq!(
        parsed.fonts.default.as_deref(),
        Some(Path::new("/usr/share/fonts/ui.ttf"))
    );
    assert!(parsed.fonts.local.is_none());
    assert!(parsed.fonts.icon.is_some());
    assert!(!parsed.fonts.width_table);
    assert!(parsed.theme.is_some());
}

#[test]
fn default_config_roundtrip() {
    let cfg = UiConfig::default();
    let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
    let parsed = UiConfig::from_toml_str(&toml_str).expect("deserialize");
    assert_eq!(parsed.surface.width, cfg.surface.width);
    assert_eq!(parsed.render.frame_interval_ms, 16);
}

#[test]
fn malformed_toml_is_an_error() {
    let err = UiConfig::from_toml_str("[surface]\nwidth = \"wide\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn missing_file_gives_defaults() {
    let path = std::env::temp_dir().join("tessera-config-that-does-not-exist.toml");
    let cfg = UiConfig::load_from(&path).expect("defaults");
    assert_eq!(cfg.surface.width, 448);
}

#[test]
fn config_path_ends_with_file_name() {
    assert!(config_path().ends_with("tessera/config.toml"));
}
