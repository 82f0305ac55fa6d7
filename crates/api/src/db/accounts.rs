//! `PostgreSQL` account repository.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use vitrinex_core::{AccountId, Email};

use super::{AccountRepository, RepositoryError, conflict_on_unique};
use crate::models::{Account, AccountChanges, AccountRow, NewAccount};

const ACCOUNT_COLUMNS: &str =
    "id, username, email, role, avatar_url, bio, created_at, updated_at";

/// Row shape for the login lookup.
#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    account: AccountRow,
    password_hash: String,
}

/// Account repository backed by `vitrinex.account`.
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    #[instrument(skip(self, account), fields(username = %account.username))]
    async fn create(&self, account: &NewAccount) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r"
            INSERT INTO vitrinex.account (id, username, email, role, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "
        ))
        .bind(AccountId::generate())
        .bind(&account.username)
        .bind(&account.email)
        .bind(account.role.as_str())
        .bind(&account.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already exists"))?;

        Account::try_from(row)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM vitrinex.account WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Account::try_from)
        .transpose()
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM vitrinex.account WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(Account::try_from)
        .transpose()
    }

    #[instrument(skip(self, email))]
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS}, password_hash FROM vitrinex.account WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((Account::try_from(r.account)?, r.password_hash))),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, email))]
    async fn email_taken_by_other(
        &self,
        email: &Email,
        except: AccountId,
    ) -> Result<bool, RepositoryError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM vitrinex.account WHERE email = $1 AND id <> $2)",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    #[instrument(skip(self, changes))]
    async fn update(
        &self,
        id: AccountId,
        changes: &AccountChanges,
    ) -> Result<Account, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE vitrinex.account SET updated_at = now()");

        if let Some(username) = &changes.username {
            query.push(", username = ").push_bind(username.clone());
        }
        if let Some(email) = &changes.email {
            query.push(", email = ").push_bind(email.as_str().to_owned());
        }
        if let Some(hash) = &changes.password_hash {
            query.push(", password_hash = ").push_bind(hash.clone());
        }
        if let Some(avatar_url) = &changes.avatar_url {
            query.push(", avatar_url = ").push_bind(avatar_url.clone());
        }
        if let Some(bio) = &changes.bio {
            query.push(", bio = ").push_bind(bio.clone());
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(ACCOUNT_COLUMNS);

        let row = query
            .build_query_as::<AccountRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "email already exists"))?
            .ok_or(RepositoryError::NotFound)?;

        Account::try_from(row)
    }
}
