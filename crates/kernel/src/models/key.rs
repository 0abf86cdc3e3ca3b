//! Permission key model and storer.

use chrono::{DateTime, Utc};
use sea_query::{Expr, Iden, PostgresQueryBuilder, Query};
use sea_query_binder::SqlxBinder;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;

use crate::error::Result;
use crate::query::{FilterSet, Page, SortDirection, SortSet, fetch_page};

/// `keys` table columns.
#[derive(Iden)]
pub enum Keys {
    Table,
    Id,
    Name,
    Description,
    UpdatedAt,
}

/// Permission key record: an atomic named capability.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Key {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new key.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateKey {
    pub name: String,
    pub description: String,
}

/// Input for a partial key update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateKey {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Filter criteria for listing keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyFilter {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Lower `updated_at` bound, exclusive.
    pub from: Option<DateTime<Utc>>,
    /// Upper `updated_at` bound, inclusive.
    pub to: Option<DateTime<Utc>>,
    /// Records per page; zero means the default page size.
    pub limit: u64,
    pub offset: u64,
}

/// Sort criteria for listing keys. Field declaration order is the
/// multi-key precedence order.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct KeySort {
    pub name: Option<SortDirection>,
    pub description: Option<SortDirection>,
    pub updated_at: Option<SortDirection>,
}

impl Key {
    /// Insert a new key, returning its assigned id.
    ///
    /// A duplicate name is rejected by the store's unique constraint and
    /// surfaces as [`crate::Error::Duplicate`].
    pub async fn insert(pool: &PgPool, input: CreateKey) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO keys (name, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    /// Apply a partial update. When no field is set this is a silent
    /// no-op; otherwise `updated_at` is bumped alongside the changes.
    pub async fn update(pool: &PgPool, id: i64, input: UpdateKey) -> Result<()> {
        let mut stmt = Query::update();
        stmt.table(Keys::Table);

        let mut changed = false;
        if let Some(name) = &input.name {
            stmt.value(Keys::Name, name.as_str());
            changed = true;
        }
        if let Some(description) = &input.description {
            stmt.value(Keys::Description, description.as_str());
            changed = true;
        }

        if !changed {
            return Ok(());
        }

        stmt.value(Keys::UpdatedAt, Utc::now());
        stmt.and_where(Expr::col(Keys::Id).eq(id));

        let (sql, values) = stmt.build_sqlx(PostgresQueryBuilder);
        sqlx::query_with(&sql, values).execute(pool).await?;

        Ok(())
    }

    /// Delete a key and all of its bunch_keys join rows in one
    /// transaction — both deletes commit or neither does. Deleting a
    /// missing id is not an error.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<()> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM bunch_keys WHERE key_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM keys WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(key_id = id, "deleted key with its bunch links");
        Ok(())
    }

    /// Find a key by id.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>> {
        let key = sqlx::query_as::<_, Key>("SELECT * FROM keys WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(key)
    }

    /// Find a key by its unique name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>> {
        let key = sqlx::query_as::<_, Key>("SELECT * FROM keys WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;

        Ok(key)
    }

    /// List keys matching `filter`, sorted by `sort`, with the matching
    /// total fetched concurrently.
    pub async fn list(pool: &PgPool, filter: &KeyFilter, sort: &KeySort) -> Result<Page<Self>> {
        let filters = FilterSet::new()
            .contains(Keys::Name, filter.name.as_deref())
            .contains(Keys::Description, filter.description.as_deref())
            .after(Keys::UpdatedAt, filter.from)
            .at_or_before(Keys::UpdatedAt, filter.to);

        let mut select = Query::select();
        select
            .columns([Keys::Id, Keys::Name, Keys::Description, Keys::UpdatedAt])
            .from(Keys::Table);
        filters.apply(&mut select);

        let mut count = Query::select();
        count.expr(Expr::col(Keys::Id).count()).from(Keys::Table);
        filters.apply(&mut count);

        SortSet::new()
            .key(Keys::Name, sort.name)
            .key(Keys::Description, sort.description)
            .key(Keys::UpdatedAt, sort.updated_at)
            .apply(&mut select, Keys::Id);

        fetch_page(pool, select, count, filter.limit, filter.offset).await
    }
}
