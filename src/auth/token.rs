//! Token endpoint calls: refresh and authorization-code exchange.

use chrono::{Duration, Utc};
use serde::Deserialize;
use std::collections::BTreeSet;

use super::credential::{CREDENTIAL_SCHEMA_VERSION, Credential};
use super::secret::ClientSecret;
use crate::error::{Error, Result, describe_http_error};

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Fold this response into `base`, keeping the old refresh token and
    /// scopes when the server omits them.
    ///
    /// A lifetime at or below `REFRESH_THRESHOLD_SECS` yields a credential
    /// that is already expired; the next `obtain_credential` refreshes it.
    pub fn apply(self, mut base: Credential) -> Credential {
        base.version = CREDENTIAL_SCHEMA_VERSION;
        base.access_token = Some(self.access_token);
        base.expiry = self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs));
        if let Some(refresh) = self.refresh_token.filter(|t| !t.is_empty()) {
            base.refresh_token = Some(refresh);
        }
        if let Some(scope) = self.scope {
            let granted: BTreeSet<String> = scope.split_whitespace().map(str::to_string).collect();
            if !granted.is_empty() {
                base.scopes = granted;
            }
        }
        base
    }
}

fn post_form(uri: &str, form: &[(&str, &str)]) -> std::result::Result<TokenResponse, String> {
    let response = ureq::post(uri).send_form(form).map_err(describe_http_error)?;
    response
        .into_json::<TokenResponse>()
        .map_err(|e| format!("invalid token response: {}", e))
}

/// Exchange the refresh token for a new access token.
pub fn refresh(credential: &Credential) -> Result<Credential> {
    let refresh_token = credential
        .refresh_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::CredentialRefresh("credential has no refresh token".to_string()))?;

    tracing::debug!(token_uri = %credential.token_uri, "refreshing access token");
    let response = post_form(
        &credential.token_uri,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
        ],
    )
    .map_err(Error::CredentialRefresh)?;

    Ok(response.apply(credential.clone()))
}

/// Exchange an authorization code for a credential bound to `scopes`.
pub fn exchange_code(
    secret: &ClientSecret,
    code: &str,
    redirect_uri: &str,
    code_verifier: &str,
    scopes: &BTreeSet<String>,
) -> Result<Credential> {
    tracing::debug!(token_uri = %secret.token_uri, "exchanging authorization code");
    let response = post_form(
        &secret.token_uri,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
            ("code_verifier", code_verifier),
        ],
    )
    .map_err(Error::Authorization)?;

    let base = Credential {
        version: CREDENTIAL_SCHEMA_VERSION,
        access_token: None,
        refresh_token: None,
        token_uri: secret.token_uri.clone(),
        client_id: secret.client_id.clone(),
        client_secret: secret.client_secret.clone(),
        scopes: scopes.clone(),
        expiry: None,
    };
    Ok(response.apply(base))
}
