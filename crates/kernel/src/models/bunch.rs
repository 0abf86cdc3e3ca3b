//! Bunch model, bunch↔key join rows, and their storers.

use chrono::{DateTime, Utc};
use sea_query::{Alias, Expr, Iden, PostgresQueryBuilder, Query, SelectStatement};
use sea_query_binder::SqlxBinder;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};

use super::key::{Key, Keys};
use crate::error::Result;
use crate::query::{FilterSet, Page, SortDirection, SortSet, fetch_page};

/// `bunches` table columns.
#[derive(Iden)]
pub enum Bunches {
    Table,
    Id,
    Name,
    Description,
    Active,
    UpdatedAt,
}

/// `bunch_keys` table columns.
#[derive(Iden)]
pub enum BunchKeys {
    Table,
    Id,
    BunchId,
    KeyId,
    UpdatedAt,
}

/// Bunch record: a named, activatable grouping of permission keys.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bunch {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new bunch. New bunches start active.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBunch {
    pub name: String,
    pub description: String,
}

/// Input for a partial bunch update. `None` fields are left untouched;
/// `active` is tri-state so it can be switched off explicitly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBunch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// Filter criteria for listing bunches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BunchFilter {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    /// Lower `updated_at` bound, exclusive.
    pub from: Option<DateTime<Utc>>,
    /// Upper `updated_at` bound, inclusive.
    pub to: Option<DateTime<Utc>>,
    pub limit: u64,
    pub offset: u64,
}

/// Sort criteria for listing bunches.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BunchSort {
    pub name: Option<SortDirection>,
    pub description: Option<SortDirection>,
    pub active: Option<SortDirection>,
    pub updated_at: Option<SortDirection>,
}

/// Bunch↔key join record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BunchKey {
    pub id: i64,
    pub bunch_id: i64,
    pub key_id: i64,
    pub updated_at: DateTime<Utc>,
}

/// One joined bunch_keys row with both referenced entities, produced
/// only by list queries, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct BunchKeyRow {
    pub key: Key,
    pub bunch: Bunch,
    pub link: BunchKey,
}

/// Filter criteria for listing bunch↔key rows. Names match exactly here
/// (these drive membership screens, not free-text search).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BunchKeyFilter {
    pub bunch_name: Option<String>,
    pub key_name: Option<String>,
    pub bunch_active: Option<bool>,
    pub limit: u64,
    pub offset: u64,
}

/// Sort criteria for listing bunch↔key rows.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BunchKeySort {
    pub bunch_name: Option<SortDirection>,
    pub key_name: Option<SortDirection>,
    pub bunch_active: Option<SortDirection>,
}

impl Bunch {
    /// Insert a new bunch (active by default), returning its assigned id.
    pub async fn insert(pool: &PgPool, input: CreateBunch) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO bunches (name, description, active) VALUES ($1, $2, TRUE) RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    /// Apply a partial update; a fully-unset input is a silent no-op.
    pub async fn update(pool: &PgPool, id: i64, input: UpdateBunch) -> Result<()> {
        let mut stmt = Query::update();
        stmt.table(Bunches::Table);

        let mut changed = false;
        if let Some(name) = &input.name {
            stmt.value(Bunches::Name, name.as_str());
            changed = true;
        }
        if let Some(description) = &input.description {
            stmt.value(Bunches::Description, description.as_str());
            changed = true;
        }
        if let Some(active) = input.active {
            stmt.value(Bunches::Active, active);
            changed = true;
        }

        if !changed {
            return Ok(());
        }

        stmt.value(Bunches::UpdatedAt, Utc::now());
        stmt.and_where(Expr::col(Bunches::Id).eq(id));

        let (sql, values) = stmt.build_sqlx(PostgresQueryBuilder);
        sqlx::query_with(&sql, values).execute(pool).await?;

        Ok(())
    }

    /// Delete a bunch; its join rows go with it via the store's
    /// referential cascade. Deleting a missing id is not an error.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM bunches WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Find a bunch by id.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>> {
        let bunch = sqlx::query_as::<_, Bunch>("SELECT * FROM bunches WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(bunch)
    }

    /// Find a bunch by its unique name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>> {
        let bunch = sqlx::query_as::<_, Bunch>("SELECT * FROM bunches WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;

        Ok(bunch)
    }

    /// List bunches matching `filter`, sorted by `sort`.
    pub async fn list(pool: &PgPool, filter: &BunchFilter, sort: &BunchSort) -> Result<Page<Self>> {
        let filters = FilterSet::new()
            .contains(Bunches::Name, filter.name.as_deref())
            .contains(Bunches::Description, filter.description.as_deref())
            .active(Bunches::Active, filter.active)
            .after(Bunches::UpdatedAt, filter.from)
            .at_or_before(Bunches::UpdatedAt, filter.to);

        let mut select = Query::select();
        select
            .columns([
                Bunches::Id,
                Bunches::Name,
                Bunches::Description,
                Bunches::Active,
                Bunches::UpdatedAt,
            ])
            .from(Bunches::Table);
        filters.apply(&mut select);

        let mut count = Query::select();
        count
            .expr(Expr::col(Bunches::Id).count())
            .from(Bunches::Table);
        filters.apply(&mut count);

        SortSet::new()
            .key(Bunches::Name, sort.name)
            .key(Bunches::Description, sort.description)
            .key(Bunches::Active, sort.active)
            .key(Bunches::UpdatedAt, sort.updated_at)
            .apply(&mut select, Bunches::Id);

        fetch_page(pool, select, count, filter.limit, filter.offset).await
    }
}

impl BunchKey {
    /// Link a key into a bunch, returning the join row id. A duplicate
    /// (bunch, key) pair surfaces as [`crate::Error::Duplicate`].
    pub async fn insert(pool: &PgPool, bunch_id: i64, key_id: i64) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO bunch_keys (bunch_id, key_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(bunch_id)
        .bind(key_id)
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    /// Remove a single join row. Deleting a missing id is not an error.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM bunch_keys WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// List joined bunch↔key rows with both referenced entities decoded,
    /// plus the concurrently-fetched total.
    pub async fn list(
        pool: &PgPool,
        filter: &BunchKeyFilter,
        sort: &BunchKeySort,
    ) -> Result<Page<BunchKeyRow>> {
        let filters = FilterSet::new()
            .matches((Bunches::Table, Bunches::Name), filter.bunch_name.as_deref())
            .matches((Keys::Table, Keys::Name), filter.key_name.as_deref())
            .active((Bunches::Table, Bunches::Active), filter.bunch_active);

        let mut select = joined_select();
        filters.apply(&mut select);

        let mut count = Query::select();
        count.expr(Expr::col((BunchKeys::Table, BunchKeys::Id)).count());
        join_tables(&mut count);
        filters.apply(&mut count);

        SortSet::new()
            .key((Bunches::Table, Bunches::Name), sort.bunch_name)
            .key((Keys::Table, Keys::Name), sort.key_name)
            .key((Bunches::Table, Bunches::Active), sort.bunch_active)
            .apply(&mut select, (BunchKeys::Table, BunchKeys::Id));

        fetch_page(pool, select, count, filter.limit, filter.offset).await
    }
}

/// FROM bunch_keys INNER JOIN keys INNER JOIN bunches.
fn join_tables(stmt: &mut SelectStatement) {
    stmt.from(BunchKeys::Table)
        .inner_join(
            Keys::Table,
            Expr::col((Keys::Table, Keys::Id)).equals((BunchKeys::Table, BunchKeys::KeyId)),
        )
        .inner_join(
            Bunches::Table,
            Expr::col((Bunches::Table, Bunches::Id)).equals((BunchKeys::Table, BunchKeys::BunchId)),
        );
}

/// Joined select with every column aliased for [`BunchKeyRow`] decoding.
fn joined_select() -> SelectStatement {
    let mut select = Query::select();
    select
        .expr_as(Expr::col((Keys::Table, Keys::Id)), Alias::new("key_id"))
        .expr_as(Expr::col((Keys::Table, Keys::Name)), Alias::new("key_name"))
        .expr_as(
            Expr::col((Keys::Table, Keys::Description)),
            Alias::new("key_description"),
        )
        .expr_as(
            Expr::col((Keys::Table, Keys::UpdatedAt)),
            Alias::new("key_updated_at"),
        )
        .expr_as(Expr::col((Bunches::Table, Bunches::Id)), Alias::new("bunch_id"))
        .expr_as(
            Expr::col((Bunches::Table, Bunches::Name)),
            Alias::new("bunch_name"),
        )
        .expr_as(
            Expr::col((Bunches::Table, Bunches::Description)),
            Alias::new("bunch_description"),
        )
        .expr_as(
            Expr::col((Bunches::Table, Bunches::Active)),
            Alias::new("bunch_active"),
        )
        .expr_as(
            Expr::col((Bunches::Table, Bunches::UpdatedAt)),
            Alias::new("bunch_updated_at"),
        )
        .expr_as(Expr::col((BunchKeys::Table, BunchKeys::Id)), Alias::new("link_id"))
        .expr_as(
            Expr::col((BunchKeys::Table, BunchKeys::BunchId)),
            Alias::new("link_bunch_id"),
        )
        .expr_as(
            Expr::col((BunchKeys::Table, BunchKeys::KeyId)),
            Alias::new("link_key_id"),
        )
        .expr_as(
            Expr::col((BunchKeys::Table, BunchKeys::UpdatedAt)),
            Alias::new("link_updated_at"),
        );
    join_tables(&mut select);
    select
}

impl<'r> FromRow<'r, PgRow> for BunchKeyRow {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            key: Key {
                id: row.try_get("key_id")?,
                name: row.try_get("key_name")?,
                description: row.try_get("key_description")?,
                updated_at: row.try_get("key_updated_at")?,
            },
            bunch: Bunch {
                id: row.try_get("bunch_id")?,
                name: row.try_get("bunch_name")?,
                description: row.try_get("bunch_description")?,
                active: row.try_get("bunch_active")?,
                updated_at: row.try_get("bunch_updated_at")?,
            },
            link: BunchKey {
                id: row.try_get("link_id")?,
                bunch_id: row.try_get("link_bunch_id")?,
                key_id: row.try_get("link_key_id")?,
                updated_at: row.try_get("link_updated_at")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_select_aliases_every_column() {
        let sql = joined_select().to_string(PostgresQueryBuilder);

        for alias in [
            "key_id",
            "key_name",
            "key_description",
            "key_updated_at",
            "bunch_id",
            "bunch_name",
            "bunch_description",
            "bunch_active",
            "bunch_updated_at",
            "link_id",
            "link_bunch_id",
            "link_key_id",
            "link_updated_at",
        ] {
            assert!(sql.contains(&format!("\"{alias}\"")), "missing {alias}: {sql}");
        }

        assert!(sql.contains(r#"INNER JOIN "keys""#), "unexpected sql: {sql}");
        assert!(sql.contains(r#"INNER JOIN "bunches""#), "unexpected sql: {sql}");
    }
}
