//! PeopleHub CLI - command-line client for the PeopleHub portal API.

mod commands;
mod output;

use clap::{Parser, Subcommand};

/// PeopleHub CLI for authentication and session management.
#[derive(Parser)]
#[command(name = "peoplehub")]
#[command(about = "PeopleHub portal client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login {
        /// Email address (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Logout and clear session
    Logout,

    /// Check authentication status
    Status,

    /// Show the signed-in user
    Whoami,

    /// Show the landing decision for a location
    Route {
        /// Current location path
        #[arg(default_value = "/")]
        path: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    client_config::init_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Login { email } => commands::login(email, &cli.format).await,
        Commands::Logout => commands::logout(&cli.format).await,
        Commands::Status => commands::status(&cli.format).await,
        Commands::Whoami => commands::whoami(&cli.format).await,
        Commands::Route { path } => commands::route(&path, &cli.format).await,
    };

    if let Err(e) = result {
        output::print_error(&e.to_string(), &cli.format);
        std::process::exit(1);
    }
}
