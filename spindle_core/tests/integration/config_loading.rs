//! Integration test: configuration files on disk.

use std::fs;

use spindle_common::prelude::*;
use spindle_core::{load_config, load_config_from_str};
use tempfile::TempDir;

use super::support::TWO_SPINDLES;

#[test]
fn load_valid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("spindles.toml");
    fs::write(&path, TWO_SPINDLES).unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.spindles.len(), 2);
    assert_eq!(config.spindles[1].atc.as_deref(), Some("rack"));
    assert_eq!(config.spindles[0].speed_map.as_ref().map(|m| m.len()), Some(2));
}

#[test]
fn missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = load_config(&dir.path().join("nope.toml")).unwrap_err();
    assert_eq!(err, SpindleError::Config(ConfigError::FileNotFound));
}

#[test]
fn decreasing_speed_map_is_rejected_at_load() {
    let bad = TWO_SPINDLES.replace("0=0% 1000=100%", "0=0% 1000=100% 2000=50%");
    match load_config_from_str(&bad) {
        Err(SpindleError::Config(ConfigError::ParseError(msg))) => {
            assert!(msg.contains("decreases"), "{msg}");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn malformed_speed_map_is_a_parse_error() {
    let bad = TWO_SPINDLES.replace("0=0% 1000=100%", "0=0% fast=100%");
    assert!(matches!(
        load_config_from_str(&bad),
        Err(SpindleError::Config(ConfigError::ParseError(_)))
    ));
}
