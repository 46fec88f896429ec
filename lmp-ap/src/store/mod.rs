//! Key-value persistence
//!
//! Everything the player saves (queue, current track, loop mode, playlists,
//! favourites) goes through [`KeyValueStore`]. Production uses the SQLite
//! `settings` table; tests and ephemeral runs use [`MemoryStore`].

pub mod session;

use crate::error::Result;
use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Saved queue (JSON array of tracks)
pub const KEY_QUEUE: &str = "queue";
/// Id of the track at the queue pointer
pub const KEY_QUEUE_CURRENT_ID: &str = "queue_current_id";
/// Loop mode as a lowercase string
pub const KEY_LOOP_MODE: &str = "loop_mode";
/// Saved playlists (JSON array)
pub const KEY_PLAYLISTS: &str = "playlists";
/// Saved favourites (JSON array of tracks)
pub const KEY_FAVOURITES: &str = "favourites";

/// String key-value persistence
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Value for `key`, None when never set
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace the value for `key`
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Store backed by the `settings` table
#[derive(Clone)]
pub struct SqliteStore {
    db: Pool<Sqlite>,
}

impl SqliteStore {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

/// In-process store; contents are lost on drop
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store whose writes always fail
#[cfg(test)]
pub(crate) struct ReadOnlyStore;

#[cfg(test)]
#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, key: &str, _value: &str) -> Result<()> {
        Err(crate::Error::Persistence(format!("{} is read-only", key)))
    }
}
