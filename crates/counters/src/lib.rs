//! # counters
//!
//! Storage core for a habit counter: a typed SQLite query builder plus the
//! interval analytics built on it.
//!
//! ## Features
//!
//! - **Pure compilation**: builders compile to SQL with `?` placeholders and
//!   ordered params, with no I/O
//! - **Two execution surfaces**: blocking [`Executor`] and future-based
//!   [`AsyncExecutor`], fed the same `(sql, params)` pair
//! - **CTE composition**: recursive and plain CTEs hoisted into a single `WITH`
//! - **Interval analytics**: date spine, paged history, streaks, completion rate
//! - **Query logging**: every statement is traced with timing and row counts
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use counters::qb::{self, Cmp, MutationQb, SqlQb};
//!
//! // SELECT
//! let daily = qb::select("counters")
//!     .where_("interval", Cmp::Eq, 0)
//!     .fetch_all::<Counter>(&db)?;
//!
//! // INSERT
//! qb::insert("entries")
//!     .values([("counter_id", 1), ("created", 1_700_000_000)])
//!     .execute(&db)?;
//!
//! // UPDATE
//! qb::update("counters")
//!     .set("goal", 3)
//!     .where_("id", Cmp::Eq, 1)
//!     .execute(&db)?;
//!
//! // DELETE
//! qb::delete("entries")
//!     .where_("counter_id", Cmp::Eq, 1)
//!     .execute(&db)?;
//! ```
//!
//! ## Models
//!
//! ```ignore
//! use counters::{Counter, Database, Interval, NewCounter};
//!
//! let db = Database::open_in_memory()?;
//! let counter = Counter::create(&db, &[NewCounter::new("Run", 1, Interval::Daily)])?;
//! counter.increase(&db)?;
//! let summary = counter.streak_summary(&db)?;
//! ```

pub mod analytics;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod migrate;
pub mod models;
pub mod monitor;
pub mod qb;
pub mod row;

pub use analytics::{Completions, HistoryPoint, Streak, StreakSummary};
pub use client::{AsyncExecutor, Executor, NonSelectResult, Params};
pub use config::{DatabaseConfig, DatabaseLocation, LogConfig};
pub use database::Database;
pub use error::{StoreError, StoreResult};
pub use models::{Counter, CounterChanges, Entry, Interval, NewCounter, NewEntry};
pub use monitor::{QueryContext, QueryType, TracingSqlHook};
pub use row::{FromRow, FromValue, Row};

// Re-export qb entry points for easy access
pub use qb::{
    DeleteQb, InsertQb, MutationQb, SelectQb, SqlQb, UpdateQb, WithQb, delete, insert, select,
    update, with, with_recursive,
};
