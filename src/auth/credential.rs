//! Credential type and its on-disk schema.
//!
//! The file format is Google's "authorized user" JSON, plus an optional
//! `version` key. Keys written by other Google clients are ignored.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{Error, Result};

pub const CREDENTIAL_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens are treated as expired this many seconds before their actual expiry.
pub const REFRESH_THRESHOLD_SECS: i64 = 225;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(default = "schema_version")]
    pub version: u32,
    #[serde(rename = "token", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub scopes: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn schema_version() -> u32 {
    CREDENTIAL_SCHEMA_VERSION
}

pub(crate) fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl Credential {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.as_deref().is_none_or(str::is_empty) {
            return true;
        }
        match self.expiry {
            Some(expiry) => now >= expiry - Duration::seconds(REFRESH_THRESHOLD_SECS),
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Has an access token that is not about to expire.
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }

    pub fn is_refreshable(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Either usable as-is or renewable without user interaction.
    pub fn is_usable(&self) -> bool {
        self.is_valid() || self.is_refreshable()
    }

    /// True if every requested scope has been granted.
    pub fn covers(&self, scopes: &BTreeSet<String>) -> bool {
        scopes.is_subset(&self.scopes)
    }

    /// Requested scopes this credential does not grant, space-separated.
    pub fn missing_scopes(&self, scopes: &BTreeSet<String>) -> String {
        scopes
            .difference(&self.scopes)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The bearer token, or an empty string if none was issued.
    pub fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or_default()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse and validate credential JSON.
    pub fn from_json(data: &str) -> std::result::Result<Self, String> {
        let credential: Credential = serde_json::from_str(data).map_err(|e| e.to_string())?;
        credential.validate()?;
        Ok(credential)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.version > CREDENTIAL_SCHEMA_VERSION {
            return Err(format!(
                "unsupported schema version {} (expected <= {})",
                self.version, CREDENTIAL_SCHEMA_VERSION
            ));
        }
        if self.access_token.as_deref().is_none_or(str::is_empty) && !self.is_refreshable() {
            return Err("neither token nor refresh_token is present".to_string());
        }
        if self.is_refreshable() && (self.client_id.is_empty() || self.client_secret.is_empty()) {
            return Err("refresh_token requires client_id and client_secret".to_string());
        }
        Ok(())
    }
}

/// Load the credential file, or `None` if it does not exist.
pub fn load(path: &Path) -> Result<Option<Credential>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path).map_err(|e| Error::CredentialLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let credential = Credential::from_json(&data).map_err(|reason| Error::CredentialLoad {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(Some(credential))
}

/// Overwrite the credential file, creating parent dirs if needed.
pub fn save(path: &Path, credential: &Credential) -> Result<()> {
    let persist_err = |source| Error::CredentialPersist {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(persist_err)?;
    }
    let data = credential
        .to_json()
        .map_err(|e| persist_err(std::io::Error::other(e)))?;
    std::fs::write(path, data).map_err(persist_err)?;

    // Set file permissions to 0600 on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(persist_err)?;
    }

    Ok(())
}
