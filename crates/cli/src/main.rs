//! Vitrinex CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! vx-cli migrate
//!
//! # Create an account (password from VX_ACCOUNT_PASSWORD)
//! vx-cli account create -e ana@example.com -u ana -r vendor
//!
//! # Seed demo accounts and stores
//! vx-cli seed stores crates/cli/seeds/demo.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "vx-cli")]
#[command(author, version, about = "Vitrinex CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Load demo data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Create a new account
    Create {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        username: String,

        /// Account role (`standard`, `vendor`, `customer`)
        #[arg(short, long, default_value = "standard")]
        role: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Seed accounts and their stores from a YAML file
    Stores {
        /// Path to the seed file
        file: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Account { action } => match action {
            AccountAction::Create {
                email,
                username,
                role,
            } => {
                commands::account::create(&email, &username, &role).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Stores { file } => {
                commands::seed::stores(&file).await?;
            }
        },
    }
    Ok(())
}
