//! Idempotent schema bootstrap.
//!
//! Join tables cascade on delete of either parent; the key storer
//! additionally deletes its join rows explicitly inside its own
//! transaction so the cascade is visible in application logic.

use sqlx::PgPool;
use tracing::debug;

use crate::error::Result;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS keys (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(32) NOT NULL,
    description VARCHAR(64) NOT NULL DEFAULT '',
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT keys_name_uniq UNIQUE (name)
);

CREATE TABLE IF NOT EXISTS bunches (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(32) NOT NULL,
    description VARCHAR(64) NOT NULL DEFAULT '',
    active BOOLEAN NOT NULL DEFAULT TRUE,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT bunches_name_uniq UNIQUE (name)
);

CREATE INDEX IF NOT EXISTS bunches_active_idx ON bunches (active);

CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    full_name VARCHAR(64) NOT NULL,
    username VARCHAR(32) NOT NULL,
    email VARCHAR(64) NOT NULL,
    hash VARCHAR(128) NOT NULL,
    salt VARCHAR(32) NOT NULL,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT users_username_uniq UNIQUE (username),
    CONSTRAINT users_email_uniq UNIQUE (email)
);

CREATE INDEX IF NOT EXISTS users_active_idx ON users (active);

CREATE TABLE IF NOT EXISTS bunch_keys (
    id BIGSERIAL PRIMARY KEY,
    bunch_id BIGINT NOT NULL REFERENCES bunches (id) ON DELETE CASCADE,
    key_id BIGINT NOT NULL REFERENCES keys (id) ON DELETE CASCADE,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT bunch_keys_pair_uniq UNIQUE (bunch_id, key_id)
);

CREATE INDEX IF NOT EXISTS bunch_keys_key_id_idx ON bunch_keys (key_id);
CREATE INDEX IF NOT EXISTS bunch_keys_bunch_id_idx ON bunch_keys (bunch_id);

CREATE TABLE IF NOT EXISTS user_bunches (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    bunch_id BIGINT NOT NULL REFERENCES bunches (id) ON DELETE CASCADE,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT user_bunches_pair_uniq UNIQUE (user_id, bunch_id)
);

CREATE INDEX IF NOT EXISTS user_bunches_user_id_idx ON user_bunches (user_id);
CREATE INDEX IF NOT EXISTS user_bunches_bunch_id_idx ON user_bunches (bunch_id);
"#;

/// Create all tables and indexes if they do not already exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    debug!("ensuring keybunch schema");
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
