//! Storage collaborator traits.
//!
//! Builders hand a finished SQL string plus params to an [`Executor`] (blocking)
//! or an [`AsyncExecutor`] (future-returning). Both surfaces take the same
//! inputs and return the same shapes.

use crate::error::StoreResult;
use crate::qb::param::Value;
use crate::row::Row;

/// Params for one statement.
///
/// A statement uses one placeholder style: `?` for positional params or
/// `:name` for named ones. Builders only produce positional params.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Positional(Vec<Value>),
    Named(Vec<(String, Value)>),
}

impl Params {
    /// No params.
    pub fn none() -> Self {
        Params::Positional(Vec::new())
    }

    /// Named params from `(name, value)` pairs. A leading `:` is optional.
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Params::Named(
            pairs
                .into_iter()
                .map(|(name, value)| {
                    let name = name.into();
                    let name = name.strip_prefix(':').map(str::to_string).unwrap_or(name);
                    (name, value.into())
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::none()
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Positional(values)
    }
}

/// Outcome of INSERT/UPDATE/DELETE/DDL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonSelectResult {
    /// Rowid of the most recent successful INSERT on the connection.
    pub last_insert_id: i64,
    /// Rows inserted, updated or deleted by this statement.
    pub rows_changed: u64,
}

/// Blocking execution surface.
pub trait Executor {
    /// Execute a statement that returns rows.
    fn execute_select(&self, sql: &str, params: &Params) -> StoreResult<Vec<Row>>;

    /// Execute a statement that returns no rows.
    fn execute_non_select(&self, sql: &str, params: &Params) -> StoreResult<NonSelectResult>;
}

/// Future-returning execution surface.
///
/// No ordering is guaranteed between independently issued calls.
pub trait AsyncExecutor: Send + Sync {
    /// Execute a statement that returns rows.
    fn execute_select_async(
        &self,
        sql: String,
        params: Params,
    ) -> impl std::future::Future<Output = StoreResult<Vec<Row>>> + Send;

    /// Execute a statement that returns no rows.
    fn execute_non_select_async(
        &self,
        sql: String,
        params: Params,
    ) -> impl std::future::Future<Output = StoreResult<NonSelectResult>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_strips_colon() {
        let params = Params::named([(":days", 127), ("id", 1)]);
        assert_eq!(
            params,
            Params::Named(vec![
                ("days".to_string(), Value::Integer(127)),
                ("id".to_string(), Value::Integer(1)),
            ])
        );
        assert_eq!(params.len(), 2);
    }
}
