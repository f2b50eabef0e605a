//! CTE (WITH clause) composition.
//!
//! [`WithQb`] accumulates named CTE definitions by value and hands them to
//! the statement started from it.
//!
//! # Example
//! ```ignore
//! use counters::qb;
//!
//! let query = qb::with_recursive("date_range", &["d"], spine)
//!     .with("completed", completed)
//!     .select("date_range")
//!     .column(func::count().alias("total"));
//! // WITH RECURSIVE date_range(d) AS (...), completed AS (...) SELECT count(*) AS total FROM "date_range"
//! ```

use crate::qb::param::ParamList;
use crate::qb::select::SelectQb;

/// Internal representation of a single CTE definition.
#[derive(Clone, Debug)]
pub(crate) struct CteDefinition {
    name: String,
    columns: Vec<String>,
    query: SelectQb,
    recursive: bool,
}

impl CteDefinition {
    fn build(&self, params: &mut ParamList) -> String {
        let body = self.query.build_into(params);
        if self.columns.is_empty() {
            format!("{} AS ({})", self.name, body)
        } else {
            format!("{}({}) AS ({})", self.name, self.columns.join(","), body)
        }
    }
}

/// Builder for statements prefixed with a WITH clause.
///
/// Every registration consumes the builder and returns one whose list is the
/// previous list plus the new entry.
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct WithQb {
    ctes: Vec<CteDefinition>,
}

impl WithQb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a non-recursive CTE.
    pub fn with(self, name: &str, query: SelectQb) -> Self {
        self.push(name, &[], query, false)
    }

    /// Register a recursive CTE with an explicit column list.
    pub fn with_recursive(self, name: &str, columns: &[&str], query: SelectQb) -> Self {
        self.push(name, columns, query, true)
    }

    fn push(mut self, name: &str, columns: &[&str], mut query: SelectQb, recursive: bool) -> Self {
        // CTEs the body already carries are hoisted so that WITH only ever
        // appears once, at the top of the statement.
        merge_ctes(&mut self.ctes, query.take_ctes());
        merge_ctes(&mut self.ctes, vec![CteDefinition {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            query,
            recursive,
        }]);
        self
    }

    /// Whether the WITH clause needs the `RECURSIVE` keyword.
    pub fn is_recursive(&self) -> bool {
        is_recursive(&self.ctes)
    }

    /// Names of the registered CTEs, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.ctes.iter().map(|cte| cte.name.as_str()).collect()
    }

    /// Start a SELECT over a table or registered CTE.
    pub fn select(self, table: &str) -> SelectQb {
        SelectQb::new(table).with_ctes(self.ctes)
    }

    /// Start a SELECT over a subquery.
    pub fn select_from(self, query: SelectQb) -> SelectQb {
        SelectQb::from_subquery(query).with_ctes(self.ctes)
    }

    /// Start a SELECT with no FROM clause.
    pub fn select_row(self) -> SelectQb {
        SelectQb::without_from().with_ctes(self.ctes)
    }
}

/// Append `incoming` to `ctes`, skipping names already registered.
///
/// The first definition of a name wins.
pub(crate) fn merge_ctes(ctes: &mut Vec<CteDefinition>, incoming: Vec<CteDefinition>) {
    for cte in incoming {
        if !ctes.iter().any(|existing| existing.name == cte.name) {
            ctes.push(cte);
        }
    }
}

pub(crate) fn is_recursive(ctes: &[CteDefinition]) -> bool {
    ctes.iter().any(|cte| cte.recursive)
}

/// Render `WITH [RECURSIVE] a AS (...), b AS (...) ` including the trailing space.
pub(crate) fn build_with(ctes: &[CteDefinition], params: &mut ParamList) -> String {
    if ctes.is_empty() {
        return String::new();
    }

    let mut sql = String::from("WITH ");
    if is_recursive(ctes) {
        sql.push_str("RECURSIVE ");
    }
    let parts: Vec<String> = ctes.iter().map(|cte| cte.build(params)).collect();
    sql.push_str(&parts.join(", "));
    sql.push(' ');
    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qb::expr::Cmp;
    use crate::qb::traits::SqlQb;
    use crate::qb::{self, param::Value};

    #[test]
    fn test_single_recursive_governs_whole_clause() {
        let query = WithQb::new()
            .with("plain", qb::select("entries").where_("counter_id", Cmp::Eq, 1))
            .with_recursive("seq", &["d"], qb::select("plain"))
            .select("seq")
            .build()
            .unwrap();

        assert!(query.sql.starts_with("WITH RECURSIVE plain AS ("));
        assert_eq!(query.sql.matches("RECURSIVE").count(), 1);
        assert!(query.sql.contains(", seq(d) AS (SELECT * FROM \"plain\")"));
        assert!(query.sql.ends_with(" SELECT * FROM \"seq\""));
        assert_eq!(query.params, vec![Value::Integer(1)]);
    }

    #[test]
    fn test_non_recursive_has_no_keyword() {
        let query = qb::with("a", qb::select("entries"))
            .select("a")
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "WITH a AS (SELECT * FROM \"entries\") SELECT * FROM \"a\""
        );
    }

    #[test]
    fn test_registration_is_append_only() {
        let base = qb::with("a", qb::select("entries"));
        let extended = base.clone().with("b", qb::select("a"));
        assert_eq!(base.names(), vec!["a"]);
        assert_eq!(extended.names(), vec!["a", "b"]);
        assert!(!extended.is_recursive());
    }

    #[test]
    fn test_nested_ctes_are_hoisted() {
        let inner = qb::with("a", qb::select("entries")).select("a");
        let outer = qb::with("b", inner).select("b");
        let built = outer.build().unwrap();
        assert_eq!(built.sql.matches("WITH").count(), 1);
        assert_eq!(
            built.sql,
            "WITH a AS (SELECT * FROM \"entries\"), b AS (SELECT * FROM \"a\") SELECT * FROM \"b\""
        );
    }

    #[test]
    fn test_shared_cte_is_hoisted_once() {
        let left = qb::with("a", qb::select("entries").where_("id", Cmp::Eq, 1)).select("a");
        let right = qb::with("a", qb::select("entries").where_("id", Cmp::Eq, 2)).select("a");
        let built = left.union_all(right).build().unwrap();
        assert_eq!(
            built.sql,
            "WITH a AS (SELECT * FROM \"entries\" WHERE \"id\"=?) \
             SELECT * FROM \"a\" UNION ALL SELECT * FROM \"a\""
        );
        assert_eq!(built.params, vec![Value::Integer(1)]);
    }
}
