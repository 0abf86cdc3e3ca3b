//! Paginated dual-query executor.

use sea_query::{PostgresQueryBuilder, SelectStatement};
use sea_query_binder::SqlxBinder;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::error::Result;

/// Default number of records per page, applied when a caller passes a
/// zero limit.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// One page of a list operation: the rows plus the total number of rows
/// matching the same filter.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// Replace an unset (zero) limit with [`DEFAULT_PAGE_SIZE`].
pub(crate) fn effective_limit(limit: u64) -> u64 {
    if limit == 0 { DEFAULT_PAGE_SIZE } else { limit }
}

/// Execute a filtered row fetch and its matching count concurrently and
/// join the results into a [`Page`].
///
/// `select` and `count` must carry the same WHERE clause (apply one
/// `FilterSet` to both); pagination is added here so the count statement
/// never sees it. Both statements are built with bound parameters and run
/// as two independent pooled connections — they are *not* snapshot
/// consistent with each other, so under concurrent writes the total may
/// briefly disagree with the page. That trade-off is accepted in exchange
/// for not holding a transaction across the fan-out.
///
/// If either statement fails the whole operation fails; the row-fetch
/// error takes precedence when both do.
pub async fn fetch_page<T>(
    pool: &PgPool,
    mut select: SelectStatement,
    count: SelectStatement,
    limit: u64,
    offset: u64,
) -> Result<Page<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let limit = effective_limit(limit);
    select.limit(limit).offset(offset);

    let (sql, values) = select.build_sqlx(PostgresQueryBuilder);
    let (count_sql, count_values) = count.build_sqlx(PostgresQueryBuilder);

    debug!(%sql, limit, offset, "executing paginated list");

    let rows = sqlx::query_as_with::<_, T, _>(&sql, values).fetch_all(pool);
    let total = sqlx::query_scalar_with::<_, i64, _>(&count_sql, count_values).fetch_one(pool);

    // Fixed two-way fan-out, then join; each branch owns its own result
    // slot and the two are only combined after both complete.
    let (rows, total) = tokio::join!(rows, total);

    let items = rows?;
    let total = total?;

    Ok(Page { items, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_uses_default_page_size() {
        assert_eq!(effective_limit(0), DEFAULT_PAGE_SIZE);
        assert_eq!(effective_limit(25), 25);
    }
}
