//! Error taxonomy for the credential and provisioning workflow.
//!
//! Every variant is fatal: nothing in this crate retries or falls back.

use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load credential file {}: {reason}", .path.display())]
    CredentialLoad { path: PathBuf, reason: String },

    #[error("failed to refresh credential: {0}")]
    CredentialRefresh(String),

    #[error("failed to save credential file {}: {source}", .path.display())]
    CredentialPersist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "client secret file not found at {}.\n\
         Download it from Google Cloud Console -> Credentials -> your Desktop app -> Download JSON.",
        .path.display()
    )]
    SecretFileMissing { path: PathBuf },

    #[error("failed to load client secret file {}: {reason}", .path.display())]
    SecretFileLoad { path: PathBuf, reason: String },

    #[error("authorization failed: {0}")]
    Authorization(String),

    #[error("failed to load spreadsheet record {}: {reason}", .path.display())]
    ResourceRecordLoad { path: PathBuf, reason: String },

    #[error("failed to create spreadsheet: {0}")]
    ResourceCreation(String),

    #[error("failed to save spreadsheet record {}: {source}", .path.display())]
    ResourcePersist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("link server: {0}")]
    LinkServer(String),

    #[error("configuration: {0}")]
    Config(String),
}

/// Render a failed ureq call, including the response body when the server sent one.
pub(crate) fn describe_http_error(err: ureq::Error) -> String {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            let body = body.trim();
            if body.is_empty() {
                format!("HTTP {}", code)
            } else {
                format!("HTTP {}: {}", code, body)
            }
        }
        ureq::Error::Transport(transport) => transport.to_string(),
    }
}
