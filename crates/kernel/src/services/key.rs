//! Key service.

use sqlx::PgPool;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::key::{CreateKey, Key, KeyFilter, KeySort, UpdateKey};
use crate::query::Page;

/// Service facade over the key storer.
#[derive(Clone)]
pub struct KeyService {
    pool: PgPool,
}

impl KeyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a key and return the stored record.
    pub async fn create(&self, input: CreateKey) -> Result<Key> {
        let id = Key::insert(&self.pool, input).await?;
        debug!(key_id = id, "created key");
        self.require(id).await
    }

    /// Partially update a key and return the stored record.
    pub async fn update(&self, id: i64, input: UpdateKey) -> Result<Key> {
        Key::update(&self.pool, id, input).await?;
        self.require(id).await
    }

    /// Delete a key by name, cascading to its bunch links. Deleting an
    /// unknown name succeeds silently.
    pub async fn delete(&self, name: &str) -> Result<()> {
        match Key::find_by_name(&self.pool, name).await? {
            Some(key) => Key::delete(&self.pool, key.id).await,
            None => Ok(()),
        }
    }

    /// Get a key by name.
    pub async fn get(&self, name: &str) -> Result<Option<Key>> {
        Key::find_by_name(&self.pool, name).await
    }

    /// List keys with filtering, sorting, and pagination.
    pub async fn list(&self, filter: &KeyFilter, sort: &KeySort) -> Result<Page<Key>> {
        Key::list(&self.pool, filter, sort).await
    }

    /// Re-fetch a row that a successful write just touched.
    async fn require(&self, id: i64) -> Result<Key> {
        Key::find_by_id(&self.pool, id)
            .await?
            .ok_or(Error::Database(sqlx::Error::RowNotFound))
    }
}
