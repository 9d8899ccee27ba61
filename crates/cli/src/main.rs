mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "usde")]
#[command(about = "Provisioning and inspection toolkit for the USDE backend database")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision the full USDE schema (tables, columns, indexes)
    Init,

    /// Seed base roles and the demo accounts
    Seed,

    /// Report which expected schema objects exist
    Status,

    /// Log in against a deployed API and check that a token comes back
    SmokeLogin,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::run().await,
        Commands::Seed => commands::seed::run().await,
        Commands::Status => commands::status::run().await,
        Commands::SmokeLogin => commands::smoke::run().await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
