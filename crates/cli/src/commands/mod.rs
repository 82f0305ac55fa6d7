//! `vx-cli` subcommands.

pub mod account;
pub mod migrate;
pub mod seed;

use thiserror::Error;

use vitrinex_api::config::{ConfigError, get_database_url};
use vitrinex_api::db::{Storage, create_pool};
use vitrinex_api::services::{AuthError, StoreError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Missing or invalid environment configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Account validation or persistence failed.
    #[error("Account error: {0}")]
    Auth(#[from] AuthError),

    /// Store validation or persistence failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Seed file could not be read.
    #[error("Failed to read {0}: {1}")]
    Io(String, std::io::Error),

    /// Seed file is not valid YAML for the expected shape.
    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Connect to the database named by `VITRINEX_DATABASE_URL` (or `DATABASE_URL`).
async fn connect() -> Result<Storage, CliError> {
    dotenvy::dotenv().ok();

    let database_url = get_database_url("VITRINEX_DATABASE_URL")?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;
    Ok(Storage::postgres(pool))
}
