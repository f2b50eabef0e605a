//! DELETE query builder.

use crate::error::StoreResult;
use crate::qb::condition::{Condition, build_conditions};
use crate::qb::expr::{Cmp, quote_ident};
use crate::qb::param::{ParamList, Value};
use crate::qb::traits::{BuiltQuery, MutationQb, SqlQb};

/// DELETE query builder.
///
/// Without any WHERE condition every row of the table is deleted.
#[derive(Clone, Debug)]
#[must_use]
pub struct DeleteQb {
    table: String,
    wheres: Vec<Condition>,
}

impl DeleteQb {
    /// Create a new DELETE query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            wheres: Vec::new(),
        }
    }

    /// Add WHERE: "column" op ?
    pub fn where_(mut self, column: &str, op: Cmp, value: impl Into<Value>) -> Self {
        self.wheres.push(Condition::column(column, op, value));
        self
    }
}

impl SqlQb for DeleteQb {
    fn build(&self) -> StoreResult<BuiltQuery> {
        let mut params = ParamList::new();
        let mut sql = format!("DELETE FROM {}", quote_ident(&self.table));
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&build_conditions(&self.wheres, &mut params));
        }
        Ok(BuiltQuery::new(sql, params))
    }
}

impl MutationQb for DeleteQb {}
