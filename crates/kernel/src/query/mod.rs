//! Dynamic query construction and dual-query pagination.
//!
//! Every list operation is built from the same three pieces:
//! - [`types`]: the criteria model (sort directions, page size default),
//! - [`builder`]: typed predicate/order descriptors rendered through
//!   SeaQuery, so no filter value is ever interpolated into SQL text,
//! - [`executor`]: the paginated dual-query executor that runs the row
//!   fetch and the matching count concurrently and joins the results.

pub mod builder;
pub mod executor;
pub mod types;

pub use builder::{FilterSet, SortSet};
pub use executor::{DEFAULT_PAGE_SIZE, Page, fetch_page};
pub use types::SortDirection;
