//! Key-value settings store
//!
//! Values are serialized as JSON text into the `settings` table, so any
//! serde type can be stored under a string key.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

/// Typed access to the `settings` table
#[derive(Clone)]
pub struct SettingsStore {
    db: SqlitePool,
}

impl SettingsStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Load and decode a value
    ///
    /// **Returns:** Some(value) if set, None if the key is missing or NULL
    pub async fn load<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT value FROM settings WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.db)
                .await
                .map_err(Error::Database)?;

        match row {
            Some((Some(value),)) => Ok(Some(serde_json::from_str(&value)?)),
            _ => Ok(None),
        }
    }

    /// Encode and save a value, replacing any previous one
    pub async fn save<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let encoded = serde_json::to_string(value)?;

        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(encoded)
        .execute(&self.db)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.db)
            .await
            .map_err(Error::Database)?;

        Ok(())
    }
}
