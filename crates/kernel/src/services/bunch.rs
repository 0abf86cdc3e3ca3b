//! Bunch service, including bunch↔key membership operations.

use sqlx::PgPool;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::bunch::{
    Bunch, BunchFilter, BunchKey, BunchKeyFilter, BunchKeyRow, BunchKeySort, BunchSort,
    CreateBunch, UpdateBunch,
};
use crate::query::Page;

/// Service facade over the bunch and bunch↔key storers.
#[derive(Clone)]
pub struct BunchService {
    pool: PgPool,
}

impl BunchService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a bunch (active by default) and return the stored record.
    pub async fn create(&self, input: CreateBunch) -> Result<Bunch> {
        let id = Bunch::insert(&self.pool, input).await?;
        debug!(bunch_id = id, "created bunch");
        self.require(id).await
    }

    /// Partially update a bunch and return the stored record.
    pub async fn update(&self, id: i64, input: UpdateBunch) -> Result<Bunch> {
        Bunch::update(&self.pool, id, input).await?;
        self.require(id).await
    }

    /// Delete a bunch by name. Deleting an unknown name succeeds
    /// silently.
    pub async fn delete(&self, name: &str) -> Result<()> {
        match Bunch::find_by_name(&self.pool, name).await? {
            Some(bunch) => Bunch::delete(&self.pool, bunch.id).await,
            None => Ok(()),
        }
    }

    /// Get a bunch by name.
    pub async fn get(&self, name: &str) -> Result<Option<Bunch>> {
        Bunch::find_by_name(&self.pool, name).await
    }

    /// List bunches with filtering, sorting, and pagination.
    pub async fn list(&self, filter: &BunchFilter, sort: &BunchSort) -> Result<Page<Bunch>> {
        Bunch::list(&self.pool, filter, sort).await
    }

    /// Link a key into a bunch, returning the join row id.
    pub async fn add_key(&self, bunch_id: i64, key_id: i64) -> Result<i64> {
        BunchKey::insert(&self.pool, bunch_id, key_id).await
    }

    /// Remove a bunch↔key link by its row id; idempotent.
    pub async fn remove_key(&self, link_id: i64) -> Result<()> {
        BunchKey::delete(&self.pool, link_id).await
    }

    /// List bunch↔key rows with both entities decoded.
    pub async fn list_keys(
        &self,
        filter: &BunchKeyFilter,
        sort: &BunchKeySort,
    ) -> Result<Page<BunchKeyRow>> {
        BunchKey::list(&self.pool, filter, sort).await
    }

    async fn require(&self, id: i64) -> Result<Bunch> {
        Bunch::find_by_id(&self.pool, id)
            .await?
            .ok_or(Error::Database(sqlx::Error::RowNotFound))
    }
}
