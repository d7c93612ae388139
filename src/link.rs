//! Plaid Link launcher: start the local link server and open a browser to it.

use std::process::Command;
use std::time::Duration;

use crate::config::{Config, PLAID_ENV, PLAID_LINK_PORT, PLAID_SANDBOX_REDIRECT_URI};
use crate::error::{Error, Result};

/// Wait this long after spawning before opening the browser.
pub const STARTUP_DELAY: Duration = Duration::from_secs(1);

/// Per-run overrides for the link server settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOptions {
    pub port: Option<u16>,
    pub env: Option<String>,
    pub redirect_uri: Option<String>,
}

impl LinkOptions {
    /// A copy of `config` with these overrides applied.
    pub fn apply(&self, config: &Config) -> Config {
        let mut config = config.clone();
        if let Some(port) = self.port {
            config = config.with(PLAID_LINK_PORT, port.to_string());
        }
        if let Some(env) = &self.env {
            config = config.with(PLAID_ENV, env.as_str());
        }
        if let Some(uri) = &self.redirect_uri {
            config = config.with(PLAID_SANDBOX_REDIRECT_URI, uri.as_str());
        }
        config
    }
}

pub fn link_url(port: u16) -> String {
    format!("http://localhost:{}/", port)
}

/// Run the link server until it exits.
///
/// Every configuration entry is exported to the child environment on top of
/// the current process environment.
pub fn launch_link_server(config: &Config, options: &LinkOptions) -> Result<()> {
    launch_with_delay(config, options, STARTUP_DELAY)
}

pub fn launch_with_delay(config: &Config, options: &LinkOptions, delay: Duration) -> Result<()> {
    let config = options.apply(config);
    let port = config.link_port()?;
    let command = config.link_command();
    let Some((program, args)) = command.split_first() else {
        return Err(Error::LinkServer("PLAID_LINK_COMMAND is empty".to_string()));
    };
    let dir = config.link_dir();

    tracing::info!(
        command = %command.join(" "),
        dir = %dir.display(),
        port,
        env = config.plaid_env(),
        "starting link server"
    );
    let mut child = Command::new(program)
        .args(args)
        .current_dir(&dir)
        .envs(config.entries())
        .spawn()
        .map_err(|e| {
            Error::LinkServer(format!(
                "failed to start '{}' in {}: {}",
                command.join(" "),
                dir.display(),
                e
            ))
        })?;

    std::thread::sleep(delay);

    let url = link_url(port);
    if config.open_browser() {
        if let Err(e) = open::that(&url) {
            tracing::warn!(error = %e, "could not open browser");
            println!("Could not open browser. Please visit:\n{}", url);
        }
    } else {
        println!("Plaid Link is available at {}", url);
    }

    let status = child
        .wait()
        .map_err(|e| Error::LinkServer(format!("failed to wait for link server: {}", e)))?;
    if !status.success() {
        return Err(Error::LinkServer(format!("link server exited with {}", status)));
    }
    Ok(())
}

/// CLI: gsheets-plaid link [--port N] [--env NAME] [--redirect-uri URI]
pub fn run(config: &Config, options: &LinkOptions) -> Result<()> {
    launch_link_server(config, options)
}
