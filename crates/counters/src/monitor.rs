//! SQL statement logging over `tracing`.
//!
//! Events go to the `counters.sql` target; filter with
//! `RUST_LOG=counters.sql=debug` or equivalent.

use std::time::Duration;

use tracing::Level;

use crate::client::Params;
use crate::config::LogConfig;
use crate::qb::inline::{inline_named, inline_positional};

/// The type of SQL operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// DDL, pragmas and anything else.
    Other,
}

impl QueryType {
    /// Detect query type from SQL string.
    ///
    /// For `WITH ...` statements, looks past the CTE definitions to the
    /// statement keyword that follows the last top-level parenthesis.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = sql.trim_start();
        if starts_with_keyword(trimmed, "WITH") {
            return Self::from_keyword(after_ctes(trimmed));
        }
        Self::from_keyword(trimmed)
    }

    fn from_keyword(sql: &str) -> Self {
        if starts_with_keyword(sql, "SELECT") {
            QueryType::Select
        } else if starts_with_keyword(sql, "INSERT") {
            QueryType::Insert
        } else if starts_with_keyword(sql, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(sql, "DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}

fn starts_with_keyword(sql: &str, keyword: &str) -> bool {
    sql.get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
        && sql[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_alphanumeric() && c != '_')
}

fn after_ctes(sql: &str) -> &str {
    let mut depth: i32 = 0;
    let mut last_top_level = 0;
    let mut quote: Option<u8> = None;
    for (i, b) in sql.bytes().enumerate() {
        match (quote, b) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, b'\'' | b'"') => quote = Some(b),
            (None, b'(') => depth += 1,
            (None, b')') => {
                depth -= 1;
                if depth == 0 {
                    last_top_level = i + 1;
                }
            }
            _ => {}
        }
    }
    sql[last_top_level..].trim_start()
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// What the hook knows about one finished statement.
#[derive(Debug, Clone)]
pub struct QueryContext<'a> {
    pub sql: &'a str,
    pub params: &'a Params,
    pub query_type: QueryType,
    pub elapsed: Duration,
    /// Rows returned (SELECT) or changed (everything else); `None` on failure.
    pub rows: Option<u64>,
}

impl<'a> QueryContext<'a> {
    pub fn new(sql: &'a str, params: &'a Params) -> Self {
        Self {
            sql,
            params,
            query_type: QueryType::from_sql(sql),
            elapsed: Duration::ZERO,
            rows: None,
        }
    }
}

/// A `tracing`-based hook that logs executed statements.
#[derive(Debug, Clone)]
pub struct TracingSqlHook {
    config: LogConfig,
}

impl Default for TracingSqlHook {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

impl TracingSqlHook {
    pub fn new(config: LogConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.config.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    fn is_slow(&self, elapsed: Duration) -> bool {
        self.config
            .slow_query_threshold
            .is_some_and(|threshold| elapsed >= threshold)
    }

    /// Render the statement with params inlined, if configured.
    fn inlined(&self, ctx: &QueryContext<'_>) -> Option<String> {
        if !self.config.inline_params || ctx.params.is_empty() {
            return None;
        }
        let sql = match ctx.params {
            Params::Positional(values) => inline_positional(ctx.sql, values),
            Params::Named(pairs) => inline_named(ctx.sql, pairs),
        };
        Some(self.truncate_sql(&sql))
    }

    /// Log a finished statement.
    pub fn after_query(&self, ctx: &QueryContext<'_>) {
        if !self.config.enabled {
            return;
        }

        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let slow = self.is_slow(ctx.elapsed);
        let level = if slow { Level::WARN } else { self.config.level };
        let sql = self.truncate_sql(ctx.sql);
        let elapsed_ms = ctx.elapsed.as_secs_f64() * 1000.0;
        let rows = ctx.rows.map_or(-1, |rows| rows as i64);
        let message = if slow { "slow query" } else { "query" };

        match self.inlined(ctx) {
            Some(inlined) => emit_at_level!(
                level,
                target: "counters.sql",
                query_type = ?ctx.query_type,
                param_count = ctx.params.len(),
                rows,
                elapsed_ms,
                sql = %sql,
                inlined = %inlined,
                "{message}"
            ),
            None => emit_at_level!(
                level,
                target: "counters.sql",
                query_type = ?ctx.query_type,
                param_count = ctx.params.len(),
                rows,
                elapsed_ms,
                sql = %sql,
                "{message}"
            ),
        }
    }
}
