//! Entity models and storers.

pub mod bunch;
pub mod key;
pub mod user;

pub use bunch::{Bunch, BunchKey, BunchKeyRow};
pub use key::Key;
pub use user::{User, UserBunch, UserBunchRow};
