//! Registered user accounts, keyed by normalized email.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use skuforge_auth::{AuthError, PasswordHash, PrincipalId, UserAccount};

use crate::store::StoreError;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Store a new account. Fails with `AuthError::EmailTaken` if the email is in use.
    async fn insert(&self, account: UserAccount) -> Result<(), StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError>;
}

#[async_trait]
impl<S> UserDirectory for Arc<S>
where
    S: UserDirectory + ?Sized,
{
    async fn insert(&self, account: UserAccount) -> Result<(), StoreError> {
        (**self).insert(account).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        (**self).find_by_email(email).await
    }
}

fn lookup_key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    inner: RwLock<HashMap<String, UserAccount>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn insert(&self, account: UserAccount) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let key = lookup_key(account.email());
        if map.contains_key(&key) {
            return Err(AuthError::EmailTaken.into());
        }
        map.insert(key, account);
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(&lookup_key(email)).cloned())
    }
}

/// Accounts in the same SQLite database as the SKU table.
#[derive(Debug, Clone)]
pub struct SqliteUserDirectory {
    pool: SqlitePool,
}

impl SqliteUserDirectory {
    pub async fn new(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id             TEXT PRIMARY KEY,
                email          TEXT NOT NULL UNIQUE,
                password_hash  TEXT NOT NULL,
                created_at     TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::database("create_users_table", e))?;

        Ok(Self { pool })
    }
}

fn account_from_row(row: &SqliteRow) -> Result<UserAccount, StoreError> {
    let id: String = row.try_get("id").map_err(|e| StoreError::database("read_row", e))?;
    let email: String = row.try_get("email").map_err(|e| StoreError::database("read_row", e))?;
    let hash: String = row.try_get("password_hash").map_err(|e| StoreError::database("read_row", e))?;
    let created_at: String = row.try_get("created_at").map_err(|e| StoreError::database("read_row", e))?;

    let id = PrincipalId::from_str(&id).map_err(|e| StoreError::Decode(format!("stored user id: {e}")))?;
    let hash = PasswordHash::from_str(&hash).map_err(|e| StoreError::Decode(format!("stored password hash: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| StoreError::Decode(format!("stored timestamp: {e}")))?
        .with_timezone(&Utc);

    Ok(UserAccount::restore(id, &email, hash, created_at))
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn insert(&self, account: UserAccount) -> Result<(), StoreError> {
        let result = sqlx::query("INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)")
            .bind(account.id().to_string())
            .bind(account.email())
            .bind(account.password_hash().to_string())
            .bind(account.created_at().to_rfc3339())
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(AuthError::EmailTaken.into()),
            Err(e) => Err(StoreError::database("insert_user", e)),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let row = sqlx::query("SELECT id, email, password_hash, created_at FROM users WHERE email = ?")
            .bind(lookup_key(email))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::database("find_user", e))?;

        row.as_ref().map(account_from_row).transpose()
    }
}
