//! Keybunch access-control kernel.
//!
//! Manages three related entities — permission keys, bunches (role-like
//! groupings of keys), and users with bunch memberships — backed by
//! PostgreSQL. The reusable core is the dynamic query-construction and
//! dual-query pagination layer in [`query`]; [`models`] owns the per-entity
//! storage, [`services`] the pass-through service facades consumed by
//! HTTP/CLI layers outside this crate.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod schema;
pub mod services;

pub use config::Config;
pub use error::{Error, Result};
pub use query::{DEFAULT_PAGE_SIZE, Page, SortDirection};
