//! OAuth client secret file ("installed application" format).

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "super::credential::default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Deserialize)]
struct SecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

impl ClientSecret {
    /// Parse a client secret document. Accepts `installed` or `web` clients.
    pub fn from_json(data: &str) -> std::result::Result<Self, String> {
        let file: SecretFile = serde_json::from_str(data).map_err(|e| e.to_string())?;
        let secret = file
            .installed
            .or(file.web)
            .ok_or_else(|| "expected an \"installed\" or \"web\" client".to_string())?;
        if secret.client_id.is_empty() {
            return Err("client_id is empty".to_string());
        }
        Ok(secret)
    }
}

/// Load the client secret file. A missing file is [`Error::SecretFileMissing`].
pub fn load(path: &Path) -> Result<ClientSecret> {
    if !path.exists() {
        return Err(Error::SecretFileMissing {
            path: path.to_path_buf(),
        });
    }
    let data = std::fs::read_to_string(path).map_err(|e| Error::SecretFileLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    ClientSecret::from_json(&data).map_err(|reason| Error::SecretFileLoad {
        path: path.to_path_buf(),
        reason,
    })
}
