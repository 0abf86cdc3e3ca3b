//! Criteria model shared by all list operations.
//!
//! Per-entity filter and sort structs live next to their models; this
//! module holds the pieces they have in common. Tri-state boolean filters
//! are plain `Option<bool>` — `None` means "not filtering on this field",
//! which must never collapse into a default `false`.

use sea_query::Order;
use serde::{Deserialize, Serialize};

/// Sort direction for a single sortable field.
///
/// Sort structs use `Option<SortDirection>` per field; `None` leaves the
/// field out of the ORDER BY clause entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub(crate) fn order(self) -> Order {
        match self {
            SortDirection::Ascending => Order::Asc,
            SortDirection::Descending => Order::Desc,
        }
    }
}
