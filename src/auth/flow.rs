//! Interactive loopback authorization (installed-app flow).
//!
//! The user consents in a browser; Google redirects to a listener on
//! 127.0.0.1 carrying the authorization code, which is exchanged for tokens.

use std::collections::BTreeSet;

use super::credential::Credential;
use super::pkce::{generate_pkce, generate_state};
use super::secret::ClientSecret;
use super::token;
use crate::error::{Error, Result};

const SUCCESS_MESSAGE: &str =
    "The authentication flow has completed. You may close this window.";

/// Obtains a fresh credential through user consent.
pub trait Authorizer {
    /// Blocks until consent completes. There is no timeout.
    fn authorize(&self, secret: &ClientSecret, scopes: &BTreeSet<String>) -> Result<Credential>;
}

impl<T: Authorizer + ?Sized> Authorizer for &T {
    fn authorize(&self, secret: &ClientSecret, scopes: &BTreeSet<String>) -> Result<Credential> {
        (**self).authorize(secret, scopes)
    }
}

/// Authorizer that listens on a loopback port for the OAuth redirect.
#[derive(Debug, Clone)]
pub struct LoopbackAuthorizer {
    /// Port to listen on; 0 lets the OS pick one.
    pub port: u16,
    pub open_browser: bool,
}

impl Authorizer for LoopbackAuthorizer {
    fn authorize(&self, secret: &ClientSecret, scopes: &BTreeSet<String>) -> Result<Credential> {
        let server = CallbackServer::bind(self.port)?;
        let redirect_uri = server.redirect_uri();
        let pkce = generate_pkce();
        let state = generate_state();
        let url = authorization_url(secret, &redirect_uri, scopes, &state, &pkce.challenge)?;

        println!("Please visit this URL to authorize this application: {}", url);
        if self.open_browser && open::that(&url).is_err() {
            println!("Could not open browser. Open the URL above manually.");
        }

        tracing::info!(port = server.port(), "waiting for authorization callback");
        let code = server.wait_for_code(&state)?;

        let credential =
            token::exchange_code(secret, &code, &redirect_uri, &pkce.verifier, scopes)?;
        if !credential.covers(scopes) {
            return Err(Error::Authorization(format!(
                "consent did not grant: {}",
                credential.missing_scopes(scopes)
            )));
        }
        Ok(credential)
    }
}

/// Build the consent URL the user is sent to.
pub fn authorization_url(
    secret: &ClientSecret,
    redirect_uri: &str,
    scopes: &BTreeSet<String>,
    state: &str,
    code_challenge: &str,
) -> Result<String> {
    let scope = scopes.iter().map(String::as_str).collect::<Vec<_>>().join(" ");
    let url = url::Url::parse_with_params(
        &secret.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", secret.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("state", state),
            ("access_type", "offline"),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
        ],
    )
    .map_err(|e| Error::Authorization(format!("invalid auth_uri {:?}: {}", secret.auth_uri, e)))?;
    Ok(url.to_string())
}

/// One-shot HTTP listener for the OAuth redirect.
pub struct CallbackServer {
    server: tiny_http::Server,
    port: u16,
}

impl std::fmt::Debug for CallbackServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackServer").field("port", &self.port).finish()
    }
}

impl CallbackServer {
    pub fn bind(port: u16) -> Result<Self> {
        let server = tiny_http::Server::http(("127.0.0.1", port))
            .map_err(|e| Error::Authorization(format!("cannot listen on port {}: {}", port, e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| Error::Authorization("listener has no IP address".to_string()))?;
        Ok(Self { server, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/", self.port)
    }

    /// Serve requests until one carries `code` or `error`.
    pub fn wait_for_code(&self, state: &str) -> Result<String> {
        loop {
            let request = self
                .server
                .recv()
                .map_err(|e| Error::Authorization(format!("callback listener failed: {}", e)))?;
            let outcome = parse_callback(request.url(), state);
            let response = match &outcome {
                Ok(Some(_)) => tiny_http::Response::from_string(SUCCESS_MESSAGE),
                Ok(None) => tiny_http::Response::from_string("Not found").with_status_code(404),
                Err(e) => tiny_http::Response::from_string(e.to_string()).with_status_code(400),
            };
            if let Err(e) = request.respond(response) {
                tracing::warn!(error = %e, "failed to answer callback request");
            }
            if let Some(code) = outcome? {
                return Ok(code);
            }
        }
    }
}

/// Inspect a redirect request path. `Ok(None)` means the request is unrelated.
pub fn parse_callback(request_url: &str, state: &str) -> Result<Option<String>> {
    let url = url::Url::parse("http://localhost")
        .and_then(|base| base.join(request_url))
        .map_err(|e| Error::Authorization(format!("bad callback request: {}", e)))?;

    let mut code = None;
    let mut error = None;
    let mut returned_state = None;
    for (key, value) in url.query_pairs() {
        match &*key {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "state" => returned_state = Some(value.into_owned()),
            _ => {}
        }
    }

    if code.is_none() && error.is_none() {
        return Ok(None);
    }
    if returned_state.as_deref() != Some(state) {
        return Err(Error::Authorization(
            "state mismatch in callback; possible CSRF".to_string(),
        ));
    }
    if let Some(error) = error {
        return Err(Error::Authorization(format!("consent denied: {}", error)));
    }
    Ok(code.filter(|c| !c.is_empty()))
}
