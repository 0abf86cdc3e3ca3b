//! Pass-through service facades.
//!
//! One service per primary entity, translating external-facing request
//! shapes into storer calls. No business rules live here: uniqueness is
//! enforced by the store's constraints, and delete-by-name is idempotent
//! by looking the name up first.

pub mod bunch;
pub mod key;
pub mod user;

pub use bunch::BunchService;
pub use key::KeyService;
pub use user::UserService;
