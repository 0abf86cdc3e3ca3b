//! User model, user↔bunch membership rows, and their storers.

use chrono::{DateTime, Utc};
use sea_query::{Alias, Expr, Iden, PostgresQueryBuilder, Query, SelectStatement};
use sea_query_binder::SqlxBinder;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::debug;

use super::bunch::{Bunch, Bunches};
use crate::error::Result;
use crate::query::{FilterSet, Page, SortDirection, SortSet, fetch_page};

/// `users` table columns.
#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    FullName,
    Username,
    Email,
    Hash,
    Salt,
    Active,
    UpdatedAt,
}

/// `user_bunches` table columns.
#[derive(Iden)]
pub enum UserBunches {
    Table,
    Id,
    UserId,
    BunchId,
    UpdatedAt,
}

/// User record. Password material is stored as an opaque hash and salt;
/// credential verification lives outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hash: String,
    #[serde(skip_serializing)]
    pub salt: String,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user. New users start active.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub hash: String,
    pub salt: String,
}

/// Input for a partial user update. `None` fields are left untouched;
/// `active` is tri-state so accounts can be switched off explicitly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub hash: Option<String>,
    pub salt: Option<String>,
    pub active: Option<bool>,
}

/// Filter criteria for listing users.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub active: Option<bool>,
    /// Lower `updated_at` bound, exclusive.
    pub from: Option<DateTime<Utc>>,
    /// Upper `updated_at` bound, inclusive.
    pub to: Option<DateTime<Utc>>,
    pub limit: u64,
    pub offset: u64,
}

/// Sort criteria for listing users.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UserSort {
    pub full_name: Option<SortDirection>,
    pub username: Option<SortDirection>,
    pub email: Option<SortDirection>,
    pub active: Option<SortDirection>,
    pub updated_at: Option<SortDirection>,
}

/// User↔bunch membership record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserBunch {
    pub id: i64,
    pub user_id: i64,
    pub bunch_id: i64,
    pub updated_at: DateTime<Utc>,
}

/// One joined user_bunches row with both referenced entities, produced
/// only by list queries, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct UserBunchRow {
    pub user: User,
    pub bunch: Bunch,
    pub link: UserBunch,
}

/// Filter criteria for listing user↔bunch rows.
///
/// `user_active` and `bunch_active` are independent predicates with their
/// own parameters — setting both filters on both tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserBunchFilter {
    pub username: Option<String>,
    pub bunch_name: Option<String>,
    pub user_active: Option<bool>,
    pub bunch_active: Option<bool>,
    pub limit: u64,
    pub offset: u64,
}

/// Sort criteria for listing user↔bunch rows.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UserBunchSort {
    pub username: Option<SortDirection>,
    pub bunch_name: Option<SortDirection>,
}

impl User {
    /// Insert a new user, returning the assigned id. Duplicate username
    /// or email surfaces as [`crate::Error::Duplicate`].
    pub async fn insert(pool: &PgPool, input: CreateUser) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (full_name, username, email, hash, salt) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&input.full_name)
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.hash)
        .bind(&input.salt)
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    /// Apply a partial update; a fully-unset input is a silent no-op.
    pub async fn update(pool: &PgPool, id: i64, input: UpdateUser) -> Result<()> {
        let mut stmt = Query::update();
        stmt.table(Users::Table);

        let mut changed = false;
        if let Some(full_name) = &input.full_name {
            stmt.value(Users::FullName, full_name.as_str());
            changed = true;
        }
        if let Some(username) = &input.username {
            stmt.value(Users::Username, username.as_str());
            changed = true;
        }
        if let Some(email) = &input.email {
            stmt.value(Users::Email, email.as_str());
            changed = true;
        }
        if let Some(hash) = &input.hash {
            stmt.value(Users::Hash, hash.as_str());
            changed = true;
        }
        if let Some(salt) = &input.salt {
            stmt.value(Users::Salt, salt.as_str());
            changed = true;
        }
        if let Some(active) = input.active {
            stmt.value(Users::Active, active);
            changed = true;
        }

        if !changed {
            return Ok(());
        }

        stmt.value(Users::UpdatedAt, Utc::now());
        stmt.and_where(Expr::col(Users::Id).eq(id));

        let (sql, values) = stmt.build_sqlx(PostgresQueryBuilder);
        sqlx::query_with(&sql, values).execute(pool).await?;

        Ok(())
    }

    /// Delete a user; their membership rows go with them via the store's
    /// referential cascade. Deleting a missing id is not an error.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        debug!(user_id = id, "deleted user");
        Ok(())
    }

    /// Find a user by id.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Find a user by their unique username.
    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Find a user by their unique email.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// List users matching `filter`, sorted by `sort`.
    pub async fn list(pool: &PgPool, filter: &UserFilter, sort: &UserSort) -> Result<Page<Self>> {
        let filters = FilterSet::new()
            .contains(Users::FullName, filter.full_name.as_deref())
            .contains(Users::Username, filter.username.as_deref())
            .contains(Users::Email, filter.email.as_deref())
            .active(Users::Active, filter.active)
            .after(Users::UpdatedAt, filter.from)
            .at_or_before(Users::UpdatedAt, filter.to);

        let mut select = Query::select();
        select
            .columns([
                Users::Id,
                Users::FullName,
                Users::Username,
                Users::Email,
                Users::Hash,
                Users::Salt,
                Users::Active,
                Users::UpdatedAt,
            ])
            .from(Users::Table);
        filters.apply(&mut select);

        let mut count = Query::select();
        count.expr(Expr::col(Users::Id).count()).from(Users::Table);
        filters.apply(&mut count);

        SortSet::new()
            .key(Users::FullName, sort.full_name)
            .key(Users::Username, sort.username)
            .key(Users::Email, sort.email)
            .key(Users::Active, sort.active)
            .key(Users::UpdatedAt, sort.updated_at)
            .apply(&mut select, Users::Id);

        fetch_page(pool, select, count, filter.limit, filter.offset).await
    }
}

impl UserBunch {
    /// Add a user to a bunch, returning the membership row id. A
    /// duplicate (user, bunch) pair surfaces as
    /// [`crate::Error::Duplicate`].
    pub async fn insert(pool: &PgPool, user_id: i64, bunch_id: i64) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO user_bunches (user_id, bunch_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id)
        .bind(bunch_id)
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    /// Remove a single membership row. Deleting a missing id is not an
    /// error.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM user_bunches WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// List joined user↔bunch rows with both referenced entities decoded,
    /// plus the concurrently-fetched total.
    pub async fn list(
        pool: &PgPool,
        filter: &UserBunchFilter,
        sort: &UserBunchSort,
    ) -> Result<Page<UserBunchRow>> {
        let filters = FilterSet::new()
            .contains((Users::Table, Users::Username), filter.username.as_deref())
            .contains((Bunches::Table, Bunches::Name), filter.bunch_name.as_deref())
            .active((Users::Table, Users::Active), filter.user_active)
            .active((Bunches::Table, Bunches::Active), filter.bunch_active);

        let mut select = joined_select();
        filters.apply(&mut select);

        let mut count = Query::select();
        count.expr(Expr::col((UserBunches::Table, UserBunches::Id)).count());
        join_tables(&mut count);
        filters.apply(&mut count);

        SortSet::new()
            .key((Users::Table, Users::Username), sort.username)
            .key((Bunches::Table, Bunches::Name), sort.bunch_name)
            .apply(&mut select, (UserBunches::Table, UserBunches::Id));

        fetch_page(pool, select, count, filter.limit, filter.offset).await
    }
}

/// FROM user_bunches INNER JOIN users INNER JOIN bunches.
fn join_tables(stmt: &mut SelectStatement) {
    stmt.from(UserBunches::Table)
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id)).equals((UserBunches::Table, UserBunches::UserId)),
        )
        .inner_join(
            Bunches::Table,
            Expr::col((Bunches::Table, Bunches::Id))
                .equals((UserBunches::Table, UserBunches::BunchId)),
        );
}

/// Joined select with every column aliased for [`UserBunchRow`] decoding.
fn joined_select() -> SelectStatement {
    let mut select = Query::select();
    select
        .expr_as(Expr::col((Users::Table, Users::Id)), Alias::new("user_id"))
        .expr_as(
            Expr::col((Users::Table, Users::FullName)),
            Alias::new("user_full_name"),
        )
        .expr_as(
            Expr::col((Users::Table, Users::Username)),
            Alias::new("user_username"),
        )
        .expr_as(Expr::col((Users::Table, Users::Email)), Alias::new("user_email"))
        .expr_as(Expr::col((Users::Table, Users::Hash)), Alias::new("user_hash"))
        .expr_as(Expr::col((Users::Table, Users::Salt)), Alias::new("user_salt"))
        .expr_as(
            Expr::col((Users::Table, Users::Active)),
            Alias::new("user_active"),
        )
        .expr_as(
            Expr::col((Users::Table, Users::UpdatedAt)),
            Alias::new("user_updated_at"),
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
        .expr_as(
            Expr::col((UserBunches::Table, UserBunches::Id)),
            Alias::new("link_id"),
        )
        .expr_as(
            Expr::col((UserBunches::Table, UserBunches::UserId)),
            Alias::new("link_user_id"),
        )
        .expr_as(
            Expr::col((UserBunches::Table, UserBunches::BunchId)),
            Alias::new("link_bunch_id"),
        )
        .expr_as(
            Expr::col((UserBunches::Table, UserBunches::UpdatedAt)),
            Alias::new("link_updated_at"),
        );
    join_tables(&mut select);
    select
}

impl<'r> FromRow<'r, PgRow> for UserBunchRow {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            user: User {
                id: row.try_get("user_id")?,
                full_name: row.try_get("user_full_name")?,
                username: row.try_get("user_username")?,
                email: row.try_get("user_email")?,
                hash: row.try_get("user_hash")?,
                salt: row.try_get("user_salt")?,
                active: row.try_get("user_active")?,
                updated_at: row.try_get("user_updated_at")?,
            },
            bunch: Bunch {
                id: row.try_get("bunch_id")?,
                name: row.try_get("bunch_name")?,
                description: row.try_get("bunch_description")?,
                active: row.try_get("bunch_active")?,
                updated_at: row.try_get("bunch_updated_at")?,
            },
            link: UserBunch {
                id: row.try_get("link_id")?,
                user_id: row.try_get("link_user_id")?,
                bunch_id: row.try_get("link_bunch_id")?,
                updated_at: row.try_get("link_updated_at")?,
            },
        })
    }
}
