//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! vx-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `VITRINEX_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Migrations live in `crates/api/migrations/` and are embedded at build time.

use super::{CliError, connect};

/// Apply every pending migration.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let storage = connect().await?;
    let Some(pool) = storage.pool() else {
        return Ok(());
    };

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
