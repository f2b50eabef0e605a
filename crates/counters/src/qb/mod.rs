//! Query builder (QB) for the counters SQLite schema.
//!
//! Builders compile to a SQL string with `?` placeholders plus the params in
//! placeholder order. Compilation is pure; execution goes through
//! [`Executor`](crate::client::Executor) or
//! [`AsyncExecutor`](crate::client::AsyncExecutor).
//!
//! # Usage
//!
//! ```ignore
//! use counters::qb::{self, Cmp, MutationQb, SqlQb};
//! use counters::qb::expr::func;
//!
//! // SELECT * FROM "counters" WHERE "interval"=?
//! let rows = qb::select("counters").where_("interval", Cmp::Eq, 0).query(&db)?;
//!
//! // INSERT INTO "entries" ("counter_id","created") VALUES (?,?)
//! let res = qb::insert("entries")
//!     .values([("counter_id", 1), ("created", 1_700_000_000)])
//!     .execute(&db)?;
//!
//! // Chained aggregation through subqueries
//! let completed = qb::select("entries")
//!     .column(func::count().alias("c"))
//!     .group_by("d")
//!     .having("c", Cmp::Gte, goal)
//!     .select()
//!     .column(func::count().alias("completed"));
//! ```

pub mod condition;
mod cte;
mod delete;
pub mod expr;
pub mod inline;
mod insert;
pub mod modifier;
pub mod param;
mod select;
mod traits;
mod update;

pub use condition::Condition;
pub use cte::WithQb;
pub use delete::DeleteQb;
pub use expr::{Aliased, Cmp, Fragment, Operator, ex, func, val};
pub use insert::{InsertQb, InsertRow};
pub use modifier::{DateModifier, DateUnit, TimeValue};
pub use param::{ParamList, Value};
pub use select::{SelectColumn, SelectQb};
pub use traits::{BuiltQuery, MutationQb, SqlQb};
pub use update::UpdateQb;

/// Create a SELECT query builder for the given table.
///
/// # Example
/// ```ignore
/// let qb = counters::qb::select("entries").where_("counter_id", Cmp::Eq, 1);
/// ```
pub fn select(table: &str) -> SelectQb {
    SelectQb::new(table)
}

/// Create a SELECT query builder reading from a subquery.
pub fn select_from(query: SelectQb) -> SelectQb {
    SelectQb::from_subquery(query)
}

/// Create a SELECT query builder with no FROM clause.
pub fn select_row() -> SelectQb {
    SelectQb::without_from()
}

/// Create an INSERT query builder for the given table.
pub fn insert(table: &str) -> InsertQb {
    InsertQb::new(table)
}

/// Create an UPDATE query builder for the given table.
pub fn update(table: &str) -> UpdateQb {
    UpdateQb::new(table)
}

/// Create a DELETE query builder for the given table.
pub fn delete(table: &str) -> DeleteQb {
    DeleteQb::new(table)
}

/// Start a statement with one non-recursive CTE.
pub fn with(name: &str, query: SelectQb) -> WithQb {
    WithQb::new().with(name, query)
}

/// Start a statement with one recursive CTE.
pub fn with_recursive(name: &str, columns: &[&str], query: SelectQb) -> WithQb {
    WithQb::new().with_recursive(name, columns, query)
}
