use claimmap_core::{ClaimMapConfig, ConfigError, Rgb, StartupPolicy, SyncError};
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn load_reads_full_file() {
    let file = write_config(
        r##"
        [marker_set]
        key = "claims.layer"
        label = "Player Claims"
        layer_priority = 4
        hide_by_default = true

        [style]
        admin = { line = "#aa0000", fill = "#ff0000" }
        regular = { line = 39880, fill = 39880 }
        line_weight = 3
        line_opacity = 1.0
        fill_opacity = 0.2

        [info_window]
        avatar_url_template = "https://mc-heads.net/avatar/{owner}/20"
        escape_owner = false

        [startup]
        mode = "after_ticks"
        ticks = 100

        [plugins]
        marker_service = "dynmap"
        claim_store = "GriefPrevention"
        "##,
    );

    let config = ClaimMapConfig::from_path(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.marker_set.key, "claims.layer");
    assert_eq!(config.marker_set.layer_priority, 4);
    assert!(config.marker_set.hide_by_default);
    assert_eq!(config.style.admin.line, Rgb::from_rgb(0xaa, 0, 0));
    assert_eq!(config.style.regular.fill, Rgb::TEAL);
    assert_eq!(config.style.line_weight, 3);
    assert!(!config.info_window.escape_owner);
    assert_eq!(config.startup, StartupPolicy::AfterTicks { ticks: 100 });
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ClaimMapConfig::from_path(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn parse_error_reports_path() {
    let file = write_config("[marker_set\nkey = 1");
    let err = ClaimMapConfig::from_path(file.path()).unwrap_err();
    match err {
        ConfigError::Parse { path, .. } => {
            assert_eq!(path, file.path().display().to_string());
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn load_rejects_invalid_values() {
    let file = write_config("[style]\nline_opacity = 2.0\n");
    let err = ClaimMapConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, SyncError::Config(ConfigError::InvalidValue { .. })));
}
