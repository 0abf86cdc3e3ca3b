//! User service, including user↔bunch membership operations.

use sqlx::PgPool;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::user::{
    CreateUser, UpdateUser, User, UserBunch, UserBunchFilter, UserBunchRow, UserBunchSort,
    UserFilter, UserSort,
};
use crate::query::Page;

/// Service facade over the user and user↔bunch storers.
#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a user (active by default) and return the stored record.
    pub async fn create(&self, input: CreateUser) -> Result<User> {
        let id = User::insert(&self.pool, input).await?;
        debug!(user_id = id, "created user");
        self.require(id).await
    }

    /// Partially update a user and return the stored record.
    pub async fn update(&self, id: i64, input: UpdateUser) -> Result<User> {
        User::update(&self.pool, id, input).await?;
        self.require(id).await
    }

    /// Delete a user by username, cascading to their memberships.
    /// Deleting an unknown username succeeds silently.
    pub async fn delete(&self, username: &str) -> Result<()> {
        match User::find_by_username(&self.pool, username).await? {
            Some(user) => User::delete(&self.pool, user.id).await,
            None => Ok(()),
        }
    }

    /// Get a user by username.
    pub async fn get(&self, username: &str) -> Result<Option<User>> {
        User::find_by_username(&self.pool, username).await
    }

    /// Get a user by email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        User::find_by_email(&self.pool, email).await
    }

    /// List users with filtering, sorting, and pagination.
    pub async fn list(&self, filter: &UserFilter, sort: &UserSort) -> Result<Page<User>> {
        User::list(&self.pool, filter, sort).await
    }

    /// Add a user to a bunch, returning the membership row id.
    pub async fn add_bunch(&self, user_id: i64, bunch_id: i64) -> Result<i64> {
        UserBunch::insert(&self.pool, user_id, bunch_id).await
    }

    /// Remove a user↔bunch membership by its row id; idempotent.
    pub async fn remove_bunch(&self, link_id: i64) -> Result<()> {
        UserBunch::delete(&self.pool, link_id).await
    }

    /// List user↔bunch rows with both entities decoded.
    pub async fn list_bunches(
        &self,
        filter: &UserBunchFilter,
        sort: &UserBunchSort,
    ) -> Result<Page<UserBunchRow>> {
        UserBunch::list(&self.pool, filter, sort).await
    }

    async fn require(&self, id: i64) -> Result<User> {
        User::find_by_id(&self.pool, id)
            .await?
            .ok_or(Error::Database(sqlx::Error::RowNotFound))
    }
}
