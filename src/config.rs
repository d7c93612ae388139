//! Process configuration: a read-only key/value map built once at startup.
//!
//! Resolution order for the settings file:
//!   1. `--env-file PATH` (must exist)
//!   2. `.env` in cwd
//!   3. `{user_config_dir}/gsheets-plaid/.env`
//!
//! Process environment variables prefixed with `GOOGLE_` or `PLAID_`
//! override values from the settings file. Defaults fill the rest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const GOOGLE_TOKEN_FILENAME: &str = "GOOGLE_TOKEN_FILENAME";
pub const GOOGLE_CREDENTIAL_FILENAME: &str = "GOOGLE_CREDENTIAL_FILENAME";
pub const GOOGLE_SHEETS_CONFIG_FILENAME: &str = "GOOGLE_SHEETS_CONFIG_FILENAME";
pub const GOOGLE_SHEETS_API_BASE: &str = "GOOGLE_SHEETS_API_BASE";
pub const GOOGLE_OAUTH_PORT: &str = "GOOGLE_OAUTH_PORT";
pub const PLAID_LINK_PORT: &str = "PLAID_LINK_PORT";
pub const PLAID_ENV: &str = "PLAID_ENV";
pub const PLAID_SANDBOX_REDIRECT_URI: &str = "PLAID_SANDBOX_REDIRECT_URI";
pub const PLAID_LINK_DIR: &str = "PLAID_LINK_DIR";
pub const PLAID_LINK_COMMAND: &str = "PLAID_LINK_COMMAND";
pub const OPEN_BROWSER: &str = "OPEN_BROWSER";

const DEFAULTS: &[(&str, &str)] = &[
    (GOOGLE_TOKEN_FILENAME, "token.json"),
    (GOOGLE_CREDENTIAL_FILENAME, "credentials.json"),
    (GOOGLE_SHEETS_CONFIG_FILENAME, "gsheets_config.json"),
    (GOOGLE_SHEETS_API_BASE, "https://sheets.googleapis.com"),
    (GOOGLE_OAUTH_PORT, "0"),
    (PLAID_LINK_PORT, "8000"),
    (PLAID_ENV, "sandbox"),
    (PLAID_LINK_DIR, "include/plaid_link_server"),
    (PLAID_LINK_COMMAND, "npm start"),
    (OPEN_BROWSER, "true"),
];

const ENV_PREFIXES: &[&str] = &["GOOGLE_", "PLAID_"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    values: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let values = DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { values }
    }
}

impl Config {
    /// Load defaults, then the settings file, then matching environment variables.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = settings_file(env_file)? {
            tracing::debug!(path = %path.display(), "reading settings file");
            for item in dotenvy::from_path_iter(&path)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
            {
                let (key, value) =
                    item.map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
                config.values.insert(key, value);
            }
        }

        for (key, value) in std::env::vars() {
            if ENV_PREFIXES.iter().any(|p| key.starts_with(p)) {
                config.values.insert(key, value);
            }
        }

        Ok(config)
    }

    /// Defaults overlaid with the given pairs. Ignores the process environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (k, v) in pairs {
            config.values.insert(k.into(), v.into());
        }
        config
    }

    /// Return a copy with `key` set to `value`.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// All entries, for exporting into a child process environment.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn token_file(&self) -> PathBuf {
        self.path(GOOGLE_TOKEN_FILENAME)
    }

    pub fn credential_file(&self) -> PathBuf {
        self.path(GOOGLE_CREDENTIAL_FILENAME)
    }

    pub fn sheets_config_file(&self) -> PathBuf {
        self.path(GOOGLE_SHEETS_CONFIG_FILENAME)
    }

    pub fn sheets_api_base(&self) -> &str {
        self.get(GOOGLE_SHEETS_API_BASE)
            .unwrap_or("https://sheets.googleapis.com")
            .trim_end_matches('/')
    }

    pub fn oauth_port(&self) -> Result<u16> {
        self.port(GOOGLE_OAUTH_PORT, 0)
    }

    pub fn link_port(&self) -> Result<u16> {
        self.port(PLAID_LINK_PORT, 8000)
    }

    pub fn plaid_env(&self) -> &str {
        self.get(PLAID_ENV).unwrap_or("sandbox")
    }

    pub fn redirect_uri(&self) -> Option<&str> {
        self.get(PLAID_SANDBOX_REDIRECT_URI)
    }

    pub fn link_dir(&self) -> PathBuf {
        self.path(PLAID_LINK_DIR)
    }

    /// The link server command line, split on whitespace.
    pub fn link_command(&self) -> Vec<String> {
        self.get(PLAID_LINK_COMMAND)
            .unwrap_or("npm start")
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    pub fn open_browser(&self) -> bool {
        !matches!(
            self.get(OPEN_BROWSER).map(str::to_ascii_lowercase).as_deref(),
            Some("0" | "false" | "no" | "off")
        )
    }

    fn path(&self, key: &str) -> PathBuf {
        expand_tilde(self.get(key).unwrap_or_default())
    }

    fn port(&self, key: &str, default: u16) -> Result<u16> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{} is not a valid port: {:?}", key, raw))),
        }
    }
}

fn settings_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "settings file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }
    let local = PathBuf::from(".env");
    if local.is_file() {
        return Ok(Some(local));
    }
    let app = app_config_dir().join(".env");
    if app.is_file() {
        return Ok(Some(app));
    }
    Ok(None)
}

/// Return the OS-native gsheets-plaid config directory.
pub fn app_config_dir() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "gsheets-plaid") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        home_dir().join(".config").join("gsheets-plaid")
    }
}

/// Get the user's home directory.
pub fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Expand ~ to home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else if path == "~" {
        home_dir()
    } else {
        PathBuf::from(path)
    }
}
