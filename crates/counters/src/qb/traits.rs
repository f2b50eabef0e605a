//! Trait definitions for query builders.

use crate::client::{AsyncExecutor, Executor, NonSelectResult, Params};
use crate::error::{StoreError, StoreResult};
use crate::qb::param::{ParamList, Value};
use crate::row::{FromRow, Row};

/// Base trait for all query builders.
///
/// Provides compilation to SQL and execution against either storage surface.
/// Both surfaces receive the identical `(sql, params)` pair.
pub trait SqlQb: Sync {
    /// Compile to SQL plus positional params.
    ///
    /// Fails with [`StoreError::Validation`] when the builder is incomplete.
    fn build(&self) -> StoreResult<BuiltQuery>;

    /// Alias for `build`.
    fn to_sql(&self) -> StoreResult<BuiltQuery> {
        self.build()
    }

    /// Execute query and return all rows.
    fn query(&self, db: &impl Executor) -> StoreResult<Vec<Row>> {
        let BuiltQuery { sql, params } = self.build()?;
        db.execute_select(&sql, &Params::Positional(params))
    }

    /// Execute query and map all rows to `T`.
    fn fetch_all<T: FromRow>(&self, db: &impl Executor) -> StoreResult<Vec<T>> {
        self.query(db)?.iter().map(T::from_row).collect()
    }

    /// Execute query and map the first row, if any, to `T`.
    fn fetch_opt<T: FromRow>(&self, db: &impl Executor) -> StoreResult<Option<T>> {
        let rows = self.query(db)?;
        rows.first().map(T::from_row).transpose()
    }

    /// Execute query and map the first row to `T`.
    ///
    /// Returns [`StoreError::NotFound`] on an empty result.
    fn fetch_one<T: FromRow>(&self, db: &impl Executor) -> StoreResult<T> {
        self.fetch_opt(db)?
            .ok_or_else(|| StoreError::not_found("Expected 1 row, got 0"))
    }

    /// Execute query on the async surface and return all rows.
    fn query_async(
        &self,
        db: &impl AsyncExecutor,
    ) -> impl std::future::Future<Output = StoreResult<Vec<Row>>> + Send {
        let built = self.build();
        async move {
            let BuiltQuery { sql, params } = built?;
            db.execute_select_async(sql, Params::Positional(params)).await
        }
    }

    /// Execute query on the async surface and map all rows to `T`.
    fn fetch_all_async<T: FromRow>(
        &self,
        db: &impl AsyncExecutor,
    ) -> impl std::future::Future<Output = StoreResult<Vec<T>>> + Send {
        let rows = self.query_async(db);
        async move { rows.await?.iter().map(T::from_row).collect() }
    }
}

/// Trait for mutation builders (INSERT/UPDATE/DELETE).
pub trait MutationQb: SqlQb {
    /// Execute and return the last insert id and changed row count.
    fn execute(&self, db: &impl Executor) -> StoreResult<NonSelectResult> {
        let BuiltQuery { sql, params } = self.build()?;
        db.execute_non_select(&sql, &Params::Positional(params))
    }

    /// Async counterpart of `execute`.
    fn execute_async(
        &self,
        db: &impl AsyncExecutor,
    ) -> impl std::future::Future<Output = StoreResult<NonSelectResult>> + Send {
        let built = self.build();
        async move {
            let BuiltQuery { sql, params } = built?;
            db.execute_non_select_async(sql, Params::Positional(params))
                .await
        }
    }
}

/// The result of building a query.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl BuiltQuery {
    /// Create a new built query.
    pub fn new(sql: String, params: ParamList) -> Self {
        Self {
            sql,
            params: params.into_vec(),
        }
    }

    /// Number of `?` placeholders in the SQL text, ignoring quoted sections.
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        let mut quote: Option<char> = None;
        for ch in self.sql.chars() {
            match (quote, ch) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(ch),
                (None, '?') => count += 1,
                _ => {}
            }
        }
        count
    }

    /// Positional params for the storage collaborator.
    pub fn into_params(self) -> Params {
        Params::Positional(self.params)
    }
}
