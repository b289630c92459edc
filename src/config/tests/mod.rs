//! Unit tests for config module
//!
//! Tests configuration types, defaults, serialization and file loading.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::path::PathBuf;

use crate::config::Config;
use crate::player::ReplaygainMode;

#[test]
fn config_default() {
    let config = Config::default();

    assert!(config.player.output.is_none());
    assert!(config.player.filters.is_empty());
    assert!(config.player.gapless);
    assert!(config.player.replaygain.is_none());
    assert!(config.library.path.is_none());
    assert!(!config.notifications.enabled);
}

#[test]
fn config_serialize_toml() {
    let config = Config::default();

    let toml_str = toml::to_string(&config).unwrap();
    assert!(!toml_str.is_empty());
    assert!(toml_str.contains("[player]"));
    assert!(toml_str.contains("[library]"));
    assert!(toml_str.contains("[notifications]"));
}

#[test]
fn config_deserialize_toml() {
    let toml_str = r#"
        [player]
        output = "pulse"
        filters = ["equalizer=f=1000:t=q:w=1:g=2"]
        cache = "8192"
        gapless = false
        replaygain = "album"

        [library]
        path = "/home/user/.config/beets/library.db"

        [notifications]
        enabled = true
    "#;

    let config: Config = toml::from_str(toml_str).unwrap();

    assert_eq!(config.player.output.as_deref(), Some("pulse"));
    assert_eq!(config.player.filters.len(), 1);
    assert_eq!(config.player.cache.as_deref(), Some("8192"));
    assert!(!config.player.gapless);
    assert_eq!(config.player.replaygain, Some(ReplaygainMode::Album));
    assert_eq!(
        config.library.path,
        Some(PathBuf::from("/home/user/.config/beets/library.db"))
    );
    assert!(config.notifications.enabled);
}

#[test]
fn config_serialize_roundtrip() {
    let original = Config::default();

    let toml_str = toml::to_string(&original).unwrap();

    let deserialized: Config = toml::from_str(&toml_str).unwrap();

    assert_eq!(format!("{original:?}"), format!("{deserialized:?}"));
}

#[test]
fn config_minimal_toml() {
    let minimal_toml = r#"
        [player]
    "#;

    let config: Config = toml::from_str(minimal_toml).unwrap();

    assert!(config.player.gapless);
    assert!(config.library.path.is_none());
}

#[test]
fn config_empty_toml() {
    let config: Config = toml::from_str("").unwrap();

    assert!(config.player.gapless);
    assert!(!config.notifications.enabled);
}

#[test]
fn config_rejects_unknown_replaygain_mode() {
    let toml_str = r#"
        [player]
        replaygain = "loudness"
    "#;

    assert!(toml::from_str::<Config>(toml_str).is_err());
}

#[test]
fn config_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[notifications]\nenabled = true").unwrap();

    let config = Config::load(file.path()).unwrap();

    assert!(config.notifications.enabled);
}

#[test]
fn config_load_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-config.toml");

    assert!(Config::load(&path).is_err());
}
