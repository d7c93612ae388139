use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gsheets-plaid",
    version,
    about = "Bootstrap Google Sheets credentials and link bank accounts with Plaid",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Settings file to read (default: .env in cwd, then the app config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Print URLs instead of opening a browser
    #[arg(long, global = true)]
    pub no_browser: bool,

    /// Enable debug logging (otherwise RUST_LOG or warn)
    #[arg(short, long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authorize with Google and cache the token
    Auth,

    /// Print the finance spreadsheet id, creating the spreadsheet if needed
    SheetId {
        /// Report whether the spreadsheet was found or created
        #[arg(long, short)]
        verbose: bool,
    },

    /// Start the Plaid Link server and open it in a browser
    Link {
        /// Port for the link server (PLAID_LINK_PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Plaid environment, e.g. sandbox or development (PLAID_ENV)
        #[arg(long)]
        env: Option<String>,

        /// OAuth redirect URI (PLAID_SANDBOX_REDIRECT_URI)
        #[arg(long)]
        redirect_uri: Option<String>,
    },

    /// Show command reference
    Help {
        /// Filter commands by name
        filter: Option<String>,
    },
}
