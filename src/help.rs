//! Command reference for gsheets-plaid.

use anyhow::Result;

const COMMANDS: &[(&str, &str)] = &[
    ("auth", "Authorize with Google and cache the token"),
    ("sheet-id [--verbose]", "Print the spreadsheet id, creating it on first run"),
    ("link [--port N] [--env NAME]", "Start Plaid Link and open a browser"),
    ("link --redirect-uri URI", "Override the Plaid OAuth redirect URI"),
    ("help [FILTER]", "Show this reference"),
];

const GLOBAL_FLAGS: &[(&str, &str)] = &[
    ("--env-file PATH", "Read settings from PATH instead of .env"),
    ("--no-browser", "Print URLs instead of opening a browser"),
    ("-d, --debug", "Enable debug logging"),
];

const SETTINGS: &[(&str, &str)] = &[
    ("GOOGLE_TOKEN_FILENAME", "Cached OAuth token (token.json)"),
    ("GOOGLE_CREDENTIAL_FILENAME", "OAuth client secret (credentials.json)"),
    ("GOOGLE_SHEETS_CONFIG_FILENAME", "Spreadsheet record (gsheets_config.json)"),
    ("GOOGLE_OAUTH_PORT", "Loopback port for consent (0 = any)"),
    ("PLAID_LINK_PORT", "Link server port (8000)"),
    ("PLAID_ENV", "Plaid environment (sandbox)"),
    ("PLAID_SANDBOX_REDIRECT_URI", "Plaid OAuth redirect URI"),
    ("PLAID_LINK_DIR", "Link server directory (include/plaid_link_server)"),
    ("PLAID_LINK_COMMAND", "Link server command (npm start)"),
];

pub fn run(filter: Option<&str>) -> Result<()> {
    if let Some(filter) = filter {
        let matches: Vec<(&str, &str)> = COMMANDS
            .iter()
            .chain(GLOBAL_FLAGS.iter())
            .chain(SETTINGS.iter())
            .filter(|(name, _)| name.contains(filter))
            .copied()
            .collect();
        if matches.is_empty() {
            println!("No command matching '{}'", filter);
            std::process::exit(1);
        }
        print_table(&matches);
        return Ok(());
    }

    println!("gsheets-plaid commands\n");
    print_table(COMMANDS);

    println!("\nglobal flags\n");
    print_table(GLOBAL_FLAGS);

    println!("\nsettings (.env or environment)\n");
    print_table(SETTINGS);

    Ok(())
}

fn print_table(rows: &[(&str, &str)]) {
    let name_w = rows.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
    for (name, desc) in rows {
        println!("  {:<width$}  {}", name, desc, width = name_w);
    }
}
