//! ClaimConduit CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a starter config
//! - `chat`    — Interactive chat or single-message mode
//! - `prompt`  — Print the system instruction for a mode and claim
//! - `modes`   — List operating modes, goals and quick starts
//! - `status`  — Show configuration status
//! - `doctor`  — Diagnose configuration and provider health

use clap::{Parser, Subcommand};

mod commands;
mod input;

#[derive(Parser)]
#[command(
    name = "claimconduit",
    about = "ClaimConduit — claims assistant for insurance restoration contractors",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Chat with the claims assistant
    Chat(commands::chat::ChatArgs),

    /// Print the system instruction for a mode and claim
    Prompt(commands::ClaimArgs),

    /// List operating modes, claim goals and quick starts
    Modes,

    /// Show configuration status
    Status,

    /// Diagnose configuration and provider health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat(args) => commands::chat::run(args).await?,
        Commands::Prompt(args) => commands::prompt::run(args).await?,
        Commands::Modes => commands::modes::run().await?,
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
