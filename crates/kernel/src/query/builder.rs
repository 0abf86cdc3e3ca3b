//! Predicate and order builders.
//!
//! Filters accumulate as an ordered list of typed predicate descriptors
//! and are rendered onto a statement through SeaQuery, which keeps every
//! value a bound parameter. The same [`FilterSet`] is applied to both the
//! row-fetch and the count statement of a list operation, so the two
//! always observe the same WHERE clause.

use chrono::{DateTime, Utc};
use sea_query::{ColumnRef, Expr, IntoColumnRef, Order, SelectStatement, SimpleExpr};

use super::types::SortDirection;

/// One filter predicate against a single column.
#[derive(Debug, Clone)]
enum Predicate {
    /// Case-sensitive substring match (`LIKE '%value%'`), wildcards in the
    /// value escaped.
    Contains(ColumnRef, String),
    /// Exact string equality.
    Matches(ColumnRef, String),
    /// Boolean equality. Only produced for a tri-state filter that is set;
    /// an unset filter produces no predicate at all.
    Active(ColumnRef, bool),
    /// Strictly after (`>`), used for the `from` bound of a time range.
    After(ColumnRef, DateTime<Utc>),
    /// At or before (`<=`), used for the `to` bound. The asymmetry with
    /// [`Predicate::After`] is intentional: `from` is exclusive, `to` is
    /// inclusive.
    AtOrBefore(ColumnRef, DateTime<Utc>),
}

impl Predicate {
    fn to_expr(&self) -> SimpleExpr {
        match self {
            Predicate::Contains(col, needle) => {
                Expr::col(col.clone()).like(format!("%{}%", escape_like(needle)))
            }
            Predicate::Matches(col, value) => Expr::col(col.clone()).eq(value.as_str()),
            Predicate::Active(col, value) => Expr::col(col.clone()).eq(*value),
            Predicate::After(col, ts) => Expr::col(col.clone()).gt(*ts),
            Predicate::AtOrBefore(col, ts) => Expr::col(col.clone()).lte(*ts),
        }
    }
}

/// Escape LIKE wildcards so filter text only ever matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Ordered set of active filter predicates, ANDed together.
///
/// The builder methods take optional criteria and skip anything unset
/// (`None`, or an empty string), so callers can map a filter struct
/// field-by-field without branching.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    predicates: Vec<Predicate>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Substring filter on a text column; skipped when `None` or empty.
    pub fn contains(mut self, col: impl IntoColumnRef, value: Option<&str>) -> Self {
        if let Some(value) = value
            && !value.is_empty()
        {
            self.predicates
                .push(Predicate::Contains(col.into_column_ref(), value.to_string()));
        }
        self
    }

    /// Exact-match filter on a text column; skipped when `None` or empty.
    pub fn matches(mut self, col: impl IntoColumnRef, value: Option<&str>) -> Self {
        if let Some(value) = value
            && !value.is_empty()
        {
            self.predicates
                .push(Predicate::Matches(col.into_column_ref(), value.to_string()));
        }
        self
    }

    /// Tri-state boolean filter: `Some(false)` renders `= FALSE`, which is
    /// distinct from `None` (no predicate).
    pub fn active(mut self, col: impl IntoColumnRef, value: Option<bool>) -> Self {
        if let Some(value) = value {
            self.predicates
                .push(Predicate::Active(col.into_column_ref(), value));
        }
        self
    }

    /// Lower time bound, exclusive.
    pub fn after(mut self, col: impl IntoColumnRef, ts: Option<DateTime<Utc>>) -> Self {
        if let Some(ts) = ts {
            self.predicates
                .push(Predicate::After(col.into_column_ref(), ts));
        }
        self
    }

    /// Upper time bound, inclusive.
    pub fn at_or_before(mut self, col: impl IntoColumnRef, ts: Option<DateTime<Utc>>) -> Self {
        if let Some(ts) = ts {
            self.predicates
                .push(Predicate::AtOrBefore(col.into_column_ref(), ts));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// AND every active predicate onto `stmt`. An empty set leaves the
    /// statement without a WHERE clause.
    pub fn apply(&self, stmt: &mut SelectStatement) {
        for predicate in &self.predicates {
            stmt.and_where(predicate.to_expr());
        }
    }
}

/// Ordered multi-key sort.
///
/// Keys are collected in the order the entity declares its sortable
/// fields, which fixes the tie-break precedence regardless of how the
/// caller constructed the sort struct.
#[derive(Debug, Clone, Default)]
pub struct SortSet {
    keys: Vec<(ColumnRef, Order)>,
}

impl SortSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sort key; skipped when the direction is unspecified.
    pub fn key(mut self, col: impl IntoColumnRef, direction: Option<SortDirection>) -> Self {
        if let Some(direction) = direction {
            self.keys.push((col.into_column_ref(), direction.order()));
        }
        self
    }

    /// Emit the ORDER BY clause, falling back to `default_col DESC`
    /// (most recent rows first) when no key was specified.
    pub fn apply(self, stmt: &mut SelectStatement, default_col: impl IntoColumnRef) {
        if self.keys.is_empty() {
            stmt.order_by(default_col.into_column_ref(), Order::Desc);
        } else {
            for (col, order) in self.keys {
                stmt.order_by(col, order);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use sea_query::{Alias, PostgresQueryBuilder, Query};

    use super::*;

    fn base_select() -> SelectStatement {
        let mut stmt = Query::select();
        stmt.column(Alias::new("id")).from(Alias::new("things"));
        stmt
    }

    #[test]
    fn empty_filter_emits_no_where_clause() {
        let mut stmt = base_select();
        FilterSet::new()
            .contains(Alias::new("name"), None)
            .active(Alias::new("active"), None)
            .apply(&mut stmt);

        let sql = stmt.to_string(PostgresQueryBuilder);
        assert_eq!(sql, r#"SELECT "id" FROM "things""#);
    }

    #[test]
    fn empty_string_is_treated_as_unset() {
        let mut stmt = base_select();
        FilterSet::new()
            .contains(Alias::new("name"), Some(""))
            .matches(Alias::new("kind"), Some(""))
            .apply(&mut stmt);

        assert!(
            !stmt
                .to_string(PostgresQueryBuilder)
                .contains("WHERE")
        );
    }

    #[test]
    fn contains_renders_wrapped_like() {
        let mut stmt = base_select();
        FilterSet::new()
            .contains(Alias::new("name"), Some("bunch"))
            .apply(&mut stmt);

        let sql = stmt.to_string(PostgresQueryBuilder);
        assert_eq!(
            sql,
            r#"SELECT "id" FROM "things" WHERE "name" LIKE '%bunch%'"#
        );
    }

    #[test]
    fn contains_escapes_like_wildcards() {
        let mut stmt = base_select();
        FilterSet::new()
            .contains(Alias::new("name"), Some("50%_off"))
            .apply(&mut stmt);

        let sql = stmt.to_string(PostgresQueryBuilder);
        // The user's % and _ must arrive escaped, wrapped by the real
        // wildcards on the outside.
        assert!(sql.contains(r"%50\%\_off%"), "unexpected sql: {sql}");
    }

    #[test]
    fn tri_state_false_is_distinct_from_unset() {
        let mut set_false = base_select();
        FilterSet::new()
            .active(Alias::new("active"), Some(false))
            .apply(&mut set_false);
        assert_eq!(
            set_false.to_string(PostgresQueryBuilder),
            r#"SELECT "id" FROM "things" WHERE "active" = FALSE"#
        );

        let mut unset = base_select();
        FilterSet::new()
            .active(Alias::new("active"), None)
            .apply(&mut unset);
        assert_eq!(
            unset.to_string(PostgresQueryBuilder),
            r#"SELECT "id" FROM "things""#
        );
    }

    #[test]
    fn time_range_bounds_are_asymmetric() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single();
        let to = Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).single();

        let mut stmt = base_select();
        FilterSet::new()
            .after(Alias::new("updated_at"), from)
            .at_or_before(Alias::new("updated_at"), to)
            .apply(&mut stmt);

        let sql = stmt.to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#""updated_at" > "#), "unexpected sql: {sql}");
        assert!(sql.contains(r#""updated_at" <= "#), "unexpected sql: {sql}");
    }

    #[test]
    fn predicates_join_with_and_in_build_order() {
        let mut stmt = base_select();
        FilterSet::new()
            .contains(Alias::new("name"), Some("a"))
            .active(Alias::new("active"), Some(true))
            .apply(&mut stmt);

        let sql = stmt.to_string(PostgresQueryBuilder);
        assert_eq!(
            sql,
            r#"SELECT "id" FROM "things" WHERE "name" LIKE '%a%' AND "active" = TRUE"#
        );
    }

    #[test]
    fn sort_falls_back_to_id_descending() {
        let mut stmt = base_select();
        SortSet::new()
            .key(Alias::new("name"), None)
            .apply(&mut stmt, Alias::new("id"));

        assert_eq!(
            stmt.to_string(PostgresQueryBuilder),
            r#"SELECT "id" FROM "things" ORDER BY "id" DESC"#
        );
    }

    #[test]
    fn sort_keys_keep_declaration_order() {
        let mut stmt = base_select();
        SortSet::new()
            .key(Alias::new("name"), Some(SortDirection::Descending))
            .key(Alias::new("updated_at"), Some(SortDirection::Ascending))
            .apply(&mut stmt, Alias::new("id"));

        assert_eq!(
            stmt.to_string(PostgresQueryBuilder),
            r#"SELECT "id" FROM "things" ORDER BY "name" DESC, "updated_at" ASC"#
        );
    }

    #[test]
    fn same_filter_applies_to_select_and_count() {
        let filters = FilterSet::new().contains(Alias::new("name"), Some("x"));

        let mut select = base_select();
        let mut count = base_select();
        filters.apply(&mut select);
        filters.apply(&mut count);

        let where_clause = r#"WHERE "name" LIKE '%x%'"#;
        assert!(select.to_string(PostgresQueryBuilder).contains(where_clause));
        assert!(count.to_string(PostgresQueryBuilder).contains(where_clause));
    }
}
