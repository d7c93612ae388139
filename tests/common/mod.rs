//! Shared test fixtures and helpers.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use gsheets_plaid::auth::Credential;
use gsheets_plaid::auth::credential::CREDENTIAL_SCHEMA_VERSION;
use gsheets_plaid::config::{self, Config};

pub const SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Create a temporary directory to hold token, secret and record files.
pub fn temp_dir() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let dir = tmp.path().to_path_buf();
    (tmp, dir)
}

pub fn token_path(dir: &Path) -> PathBuf {
    dir.join("token.json")
}

pub fn secret_path(dir: &Path) -> PathBuf {
    dir.join("credentials.json")
}

pub fn record_path(dir: &Path) -> PathBuf {
    dir.join("gsheets_config.json")
}

/// Config whose file paths all point into `dir`.
pub fn config_in(dir: &Path) -> Config {
    Config::from_pairs([
        (config::GOOGLE_TOKEN_FILENAME, path_str(&token_path(dir))),
        (config::GOOGLE_CREDENTIAL_FILENAME, path_str(&secret_path(dir))),
        (config::GOOGLE_SHEETS_CONFIG_FILENAME, path_str(&record_path(dir))),
        (config::OPEN_BROWSER, "false".to_string()),
    ])
}

pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Write an "installed" client secret whose token endpoint is `token_uri`.
pub fn write_secret(dir: &Path, token_uri: &str) {
    let content = format!(
        r#"{{"installed":{{"client_id":"test-client.apps.googleusercontent.com","project_id":"finance","auth_uri":"https://accounts.google.com/o/oauth2/auth","token_uri":"{}","client_secret":"test-secret","redirect_uris":["http://localhost"]}}}}"#,
        token_uri
    );
    std::fs::write(secret_path(dir), content).unwrap();
}

pub fn scopes() -> std::collections::BTreeSet<String> {
    [SCOPE.to_string()].into_iter().collect()
}

/// A credential expiring `expires_in_secs` from now.
pub fn credential(token_uri: &str, expires_in_secs: i64) -> Credential {
    Credential {
        version: CREDENTIAL_SCHEMA_VERSION,
        access_token: Some("ya29.cached".to_string()),
        refresh_token: Some("1//refresh".to_string()),
        token_uri: token_uri.to_string(),
        client_id: "test-client.apps.googleusercontent.com".to_string(),
        client_secret: "test-secret".to_string(),
        scopes: scopes(),
        expiry: Some(Utc::now() + Duration::seconds(expires_in_secs)),
    }
}

pub fn write_credential(dir: &Path, credential: &Credential) {
    std::fs::write(token_path(dir), credential.to_json().unwrap()).unwrap();
}
