//! Integration tests for settings loading (src/config.rs).

mod common;

use pretty_assertions::assert_eq;
use std::path::PathBuf;

use common::*;
use gsheets_plaid::Error;
use gsheets_plaid::config::{self, Config};

#[test]
fn test_load_env_file() {
    let (_tmp, dir) = temp_dir();
    let env_file = dir.join("finance.env");
    std::fs::write(
        &env_file,
        "# finance settings\n\
         GOOGLE_SHEETS_CONFIG_FILENAME=records/sheet.json\n\
         PLAID_GSHEETS_TEST_MARKER=\"quoted value\"\n",
    )
    .unwrap();

    let config = Config::load(Some(&env_file)).unwrap();
    assert_eq!(config.get("PLAID_GSHEETS_TEST_MARKER"), Some("quoted value"));
    assert_eq!(config.sheets_config_file(), PathBuf::from("records/sheet.json"));
}

#[test]
fn test_load_missing_env_file_is_error() {
    let (_tmp, dir) = temp_dir();
    let err = Config::load(Some(&dir.join("missing.env"))).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "{:?}", err);
}

#[test]
fn test_entries_export_everything() {
    let config = Config::default().with("PLAID_SECRET", "s3cret");
    let entries: Vec<(&str, &str)> = config.entries().collect();
    assert!(entries.contains(&("PLAID_SECRET", "s3cret")));
    assert!(entries.contains(&(config::PLAID_LINK_PORT, "8000")));
}

#[test]
fn test_config_in_points_into_dir() {
    let (_tmp, dir) = temp_dir();
    let config = config_in(&dir);
    assert_eq!(config.token_file(), token_path(&dir));
    assert_eq!(config.credential_file(), secret_path(&dir));
    assert_eq!(config.sheets_config_file(), record_path(&dir));
    assert!(!config.open_browser());
}

#[test]
fn test_app_config_dir_returns_path() {
    let dir = config::app_config_dir();
    assert!(dir.to_string_lossy().contains("gsheets-plaid"));
}
