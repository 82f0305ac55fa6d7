//! Seed demo accounts and stores from a YAML file.
//!
//! Accounts and stores go through the same services the API uses, so every
//! seeded row passes the same validation. Re-running a seed is safe: existing
//! accounts are reused and stores whose name the owner already has are
//! skipped.
//!
//! ```yaml
//! accounts:
//!   - username: ana
//!     email: ana@example.com
//!     password: demo-password
//!     role: vendor
//!     stores:
//!       - name: Panadería Ana
//!         mode: products
//!         comuna: Ñuñoa
//!         tipoNegocio: panadería
//!         lat: -33.456
//!         lng: -70.597
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use vitrinex_api::config::store_cardinality_from_env;
use vitrinex_api::models::StoreInput;
use vitrinex_api::services::auth::NewCredentials;
use vitrinex_api::services::{AuthError, SaveOutcome, StoreService};
use vitrinex_core::{AccountRole, Email};

use super::account::credential_store;
use super::{CliError, connect};

/// Top level of a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,
}

/// One demo account and the stores it owns.
#[derive(Debug, Deserialize)]
pub struct SeedAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: AccountRole,
    #[serde(default)]
    pub stores: Vec<StoreInput>,
}

/// Totals reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub accounts_created: usize,
    pub accounts_reused: usize,
    pub stores_created: usize,
    pub stores_updated: usize,
    pub stores_skipped: usize,
}

/// Parse a seed file.
///
/// # Errors
///
/// Returns `CliError::Yaml` if the content does not match [`SeedFile`].
pub fn parse(content: &str) -> Result<SeedFile, CliError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Seed stores (and their owners) from `file_path`.
///
/// # Errors
///
/// Returns `CliError` if the file cannot be read or parsed, or if any account
/// or store fails validation.
pub async fn stores(file_path: &str) -> Result<SeedSummary, CliError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading seed file");

    // Read and parse before connecting to the database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::Io(file_path.to_owned(), e))?;
    let seed = parse(&content)?;
    info!(accounts = seed.accounts.len(), "Parsed seed file");

    let storage = connect().await?;
    let credentials = credential_store(&storage)?;
    let store_service = StoreService::new(storage.stores.clone(), store_cardinality_from_env()?);

    let mut summary = SeedSummary::default();

    for entry in seed.accounts {
        let email = Email::parse(&entry.email).map_err(AuthError::from)?;

        let account = match credentials.find_by_email(&email).await? {
            Some(existing) => {
                summary.accounts_reused += 1;
                existing
            }
            None => {
                let username = entry.username.trim();
                if username.is_empty() {
                    return Err(
                        AuthError::Validation(format!("username missing for {email}")).into(),
                    );
                }
                summary.accounts_created += 1;
                credentials
                    .create(NewCredentials {
                        username: username.to_owned(),
                        email,
                        role: entry.role,
                        password: entry.password,
                    })
                    .await?
            }
        };

        let existing: Vec<String> = store_service
            .list_mine(account.id)
            .await?
            .into_iter()
            .map(|store| store.name)
            .collect();

        for store in entry.stores {
            let name = store.name.as_deref().map(str::trim).unwrap_or_default();
            if existing.iter().any(|n| n == name) {
                summary.stores_skipped += 1;
                continue;
            }

            let (saved, outcome) = store_service.save(account.id, store).await?;
            match outcome {
                SaveOutcome::Created => summary.stores_created += 1,
                SaveOutcome::Updated => summary.stores_updated += 1,
            }
            info!(store_id = %saved.id, name = %saved.name, "Seeded store");
        }
    }

    info!("Seeding complete!");
    info!("  Accounts created: {}", summary.accounts_created);
    info!("  Accounts reused: {}", summary.accounts_reused);
    info!("  Stores created: {}", summary.stores_created);
    info!("  Stores updated: {}", summary.stores_updated);
    info!("  Stores skipped: {}", summary.stores_skipped);

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_file() {
        let seed = parse(
            r"
accounts:
  - username: ana
    email: ana@example.com
    password: demo-password
    role: vendor
    stores:
      - name: Panadería Ana
        mode: bookings
        comuna: Ñuñoa
        tipoNegocio: panadería
        lat: -33.456
        lng: -70.597
  - username: beto
    email: beto@example.com
    password: demo-password
",
        )
        .unwrap();

        assert_eq!(seed.accounts.len(), 2);
        let ana = &seed.accounts[0];
        assert_eq!(ana.role, AccountRole::Vendor);
        assert_eq!(ana.stores.len(), 1);
        assert_eq!(ana.stores[0].tipo_negocio.as_deref(), Some("panadería"));
        assert_eq!(ana.stores[0].lat, Some(Some(-33.456)));

        let beto = &seed.accounts[1];
        assert_eq!(beto.role, AccountRole::Standard);
        assert!(beto.stores.is_empty());
    }

    #[test]
    fn test_empty_seed_file() {
        let seed = parse("accounts: []").unwrap();
        assert!(seed.accounts.is_empty());
    }

    #[test]
    fn test_rejects_unknown_role() {
        let result = parse(
            r"
accounts:
  - username: x
    email: x@example.com
    password: demo-password
    role: admin
",
        );
        assert!(matches!(result, Err(CliError::Yaml(_))));
    }
}
