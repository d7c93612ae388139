//! Google OAuth credential workflow: reuse, refresh, or newly acquire.

pub mod credential;
pub mod flow;
pub mod pkce;
pub mod secret;
pub mod token;

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{Error, Result};

pub use self::credential::Credential;
pub use self::flow::{Authorizer, LoopbackAuthorizer};
pub use self::secret::ClientSecret;

/// Scope needed to create and edit spreadsheets this app owns.
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Default scope set for the finance tracker.
pub fn default_scopes() -> BTreeSet<String> {
    [DRIVE_FILE_SCOPE.to_string()].into_iter().collect()
}

/// Resolves a valid credential from the token cache and client secret on disk.
///
/// The token file is read then overwritten without locking. Running two
/// instances against the same file at once is unsafe: the last writer wins.
pub struct CredentialManager<A = LoopbackAuthorizer> {
    token_file: PathBuf,
    secret_file: PathBuf,
    authorizer: A,
}

impl<A: std::fmt::Debug> std::fmt::Debug for CredentialManager<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("token_file", &self.token_file)
            .field("secret_file", &self.secret_file)
            .field("authorizer", &self.authorizer)
            .finish()
    }
}

impl CredentialManager<LoopbackAuthorizer> {
    /// Manager using the interactive loopback flow configured in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let authorizer = LoopbackAuthorizer {
            port: config.oauth_port()?,
            open_browser: config.open_browser(),
        };
        Ok(Self::new(config, authorizer))
    }
}

impl<A: Authorizer> CredentialManager<A> {
    pub fn new(config: &Config, authorizer: A) -> Self {
        Self {
            token_file: config.token_file(),
            secret_file: config.credential_file(),
            authorizer,
        }
    }

    pub fn token_file(&self) -> &std::path::Path {
        &self.token_file
    }

    /// Return a credential valid for `scopes` right now.
    ///
    /// May block indefinitely on the interactive consent step. A refresh
    /// failure is returned as-is and never falls back to re-consent, and a
    /// refresh that narrows the granted scopes is an error that leaves the
    /// token file untouched.
    pub fn obtain_credential(&self, scopes: &BTreeSet<String>) -> Result<Credential> {
        if scopes.is_empty() {
            return Err(Error::Config("at least one OAuth scope is required".to_string()));
        }

        let cached = credential::load(&self.token_file)?;
        let credential = match cached {
            Some(cred) if cred.covers(scopes) && cred.is_valid() => {
                tracing::debug!(path = %self.token_file.display(), "using cached credential");
                return Ok(cred);
            }
            Some(cred) if cred.covers(scopes) && cred.is_refreshable() => {
                tracing::info!("access token expired; refreshing");
                let refreshed = token::refresh(&cred)?;
                if !refreshed.covers(scopes) {
                    return Err(Error::CredentialRefresh(format!(
                        "refresh did not grant: {}",
                        refreshed.missing_scopes(scopes)
                    )));
                }
                refreshed
            }
            Some(cred) => {
                tracing::info!(
                    covers_scopes = cred.covers(scopes),
                    "cached credential cannot be reused; starting authorization"
                );
                self.authorize(scopes)?
            }
            None => {
                tracing::info!(path = %self.token_file.display(), "no cached credential; starting authorization");
                self.authorize(scopes)?
            }
        };

        credential::save(&self.token_file, &credential)?;
        Ok(credential)
    }

    fn authorize(&self, scopes: &BTreeSet<String>) -> Result<Credential> {
        let secret = secret::load(&self.secret_file)?;
        self.authorizer.authorize(&secret, scopes)
    }
}

/// CLI: gsheets-plaid auth
pub fn run(config: &Config) -> Result<()> {
    let manager = CredentialManager::from_config(config)?;
    let credential = manager.obtain_credential(&default_scopes())?;
    println!(
        "Credential ready ({} scope(s)), saved to {}",
        credential.scopes.len(),
        manager.token_file().display()
    );
    Ok(())
}
