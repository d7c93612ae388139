use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use gsheets_plaid::cli::{Cli, Commands};
use gsheets_plaid::config::{self, Config};
use gsheets_plaid::link::LinkOptions;

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("gsheets_plaid=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(env_file: Option<&Path>, no_browser: bool) -> Result<Config> {
    let config = Config::load(env_file)?;
    if no_browser {
        return Ok(config.with(config::OPEN_BROWSER, "false"));
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let env_file = cli.env_file.as_deref();
    match cli.command {
        Commands::Auth => {
            let config = load_config(env_file, cli.no_browser)?;
            gsheets_plaid::auth::run(&config)?;
        }
        Commands::SheetId { verbose } => {
            let config = load_config(env_file, cli.no_browser)?;
            gsheets_plaid::sheets::run(&config, verbose)?;
        }
        Commands::Link {
            port,
            env,
            redirect_uri,
        } => {
            let config = load_config(env_file, cli.no_browser)?;
            let options = LinkOptions {
                port,
                env,
                redirect_uri,
            };
            gsheets_plaid::link::run(&config, &options)?;
        }
        Commands::Help { filter } => gsheets_plaid::help::run(filter.as_deref())?,
    }
    Ok(())
}
