#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for database-backed integration tests.
//!
//! Tests run against the database named by `TEST_DATABASE_URL` (also
//! honored from a `.env` file). When the variable is unset the tests
//! print a notice and pass without asserting anything, so plain
//! `cargo test` stays green on machines without PostgreSQL.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique string for natural keys so reruns against a persistent
/// database never collide. Keep `prefix` short: key and bunch names are
/// capped at 32 characters.
pub fn unique(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs();
    let pid = std::process::id() & 0xffff;
    format!("{prefix}_{secs:x}{pid:x}_{n}")
}

/// Connect to the test database and ensure the schema exists, or `None`
/// when `TEST_DATABASE_URL` is unset.
pub async fn test_pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();

    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL is not set; skipping database-backed test");
        return None;
    };

    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("failed to connect to TEST_DATABASE_URL");

    keybunch_kernel::schema::ensure_schema(&pool)
        .await
        .expect("failed to ensure schema");

    Some(pool)
}
