//! Integration tests for the Plaid Link launcher (src/link.rs).

#![cfg(unix)]

mod common;

use std::time::Duration;

use common::*;
use gsheets_plaid::Error;
use gsheets_plaid::config::{self, Config};
use gsheets_plaid::link::{LinkOptions, launch_with_delay};

fn link_config(dir: &std::path::Path, command: &str) -> Config {
    Config::from_pairs([
        (config::PLAID_LINK_DIR, path_str(dir)),
        (config::PLAID_LINK_COMMAND, command.to_string()),
        (config::OPEN_BROWSER, "false".to_string()),
    ])
}

#[test]
fn test_child_sees_config_and_overrides() {
    let (_tmp, dir) = temp_dir();
    std::fs::write(
        dir.join("check.sh"),
        r#"[ "$PLAID_LINK_PORT" = "8123" ] || exit 11
[ "$PLAID_ENV" = "development" ] || exit 12
[ "$PLAID_SANDBOX_REDIRECT_URI" = "https://localhost:8123/oauth" ] || exit 13
[ "$PLAID_CLIENT_ID" = "client-from-settings" ] || exit 14
exit 0
"#,
    )
    .unwrap();

    let config = link_config(&dir, "sh check.sh").with("PLAID_CLIENT_ID", "client-from-settings");
    let options = LinkOptions {
        port: Some(8123),
        env: Some("development".to_string()),
        redirect_uri: Some("https://localhost:8123/oauth".to_string()),
    };

    launch_with_delay(&config, &options, Duration::ZERO).unwrap();
}

#[test]
fn test_runs_in_link_dir() {
    let (_tmp, dir) = temp_dir();
    std::fs::write(dir.join("package.json"), "{}").unwrap();
    let config = link_config(&dir, "test -f package.json");
    launch_with_delay(&config, &LinkOptions::default(), Duration::ZERO).unwrap();
}

#[test]
fn test_nonzero_exit_is_error() {
    let (_tmp, dir) = temp_dir();
    let config = link_config(&dir, "false");
    let err = launch_with_delay(&config, &LinkOptions::default(), Duration::ZERO).unwrap_err();
    assert!(matches!(err, Error::LinkServer(_)), "{:?}", err);
}

#[test]
fn test_missing_program_is_error() {
    let (_tmp, dir) = temp_dir();
    let config = link_config(&dir, "gsheets-plaid-no-such-program");
    let err = launch_with_delay(&config, &LinkOptions::default(), Duration::ZERO).unwrap_err();
    assert!(err.to_string().contains("failed to start"), "{}", err);
}

#[test]
fn test_empty_command_is_error() {
    let (_tmp, dir) = temp_dir();
    let config = link_config(&dir, "   ");
    let err = launch_with_delay(&config, &LinkOptions::default(), Duration::ZERO).unwrap_err();
    assert!(matches!(err, Error::LinkServer(_)), "{:?}", err);
}

#[test]
fn test_invalid_port_is_config_error() {
    let (_tmp, dir) = temp_dir();
    let config = link_config(&dir, "true").with(config::PLAID_LINK_PORT, "http");
    let err = launch_with_delay(&config, &LinkOptions::default(), Duration::ZERO).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "{:?}", err);
}
