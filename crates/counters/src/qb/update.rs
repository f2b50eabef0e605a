//! UPDATE query builder.

use crate::error::{StoreError, StoreResult};
use crate::qb::condition::{Condition, build_conditions};
use crate::qb::expr::{Cmp, quote_ident};
use crate::qb::param::{ParamList, Value};
use crate::qb::traits::{BuiltQuery, MutationQb, SqlQb};

/// UPDATE query builder.
#[derive(Clone, Debug)]
#[must_use]
pub struct UpdateQb {
    table: String,
    set_fields: Vec<(String, Value)>,
    wheres: Vec<Condition>,
}

impl UpdateQb {
    /// Create a new UPDATE query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            set_fields: Vec::new(),
            wheres: Vec::new(),
        }
    }

    /// Add SET: "column"=?
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set_fields.push((column.to_string(), value.into()));
        self
    }

    /// Add every pair of a change set.
    pub fn set_all<I, K, V>(mut self, changes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.set_fields.extend(
            changes
                .into_iter()
                .map(|(column, value)| (column.into(), value.into())),
        );
        self
    }

    /// Add WHERE: "column" op ?
    pub fn where_(mut self, column: &str, op: Cmp, value: impl Into<Value>) -> Self {
        self.wheres.push(Condition::column(column, op, value));
        self
    }
}

impl SqlQb for UpdateQb {
    fn build(&self) -> StoreResult<BuiltQuery> {
        if self.set_fields.is_empty() {
            return Err(StoreError::validation("Incomplete input in UPDATE"));
        }

        let mut params = ParamList::new();
        let sets: Vec<String> = self
            .set_fields
            .iter()
            .map(|(column, value)| {
                params.push(value.clone());
                format!("{}=?", quote_ident(column))
            })
            .collect();

        let mut sql = format!("UPDATE {} SET {}", quote_ident(&self.table), sets.join(","));
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&build_conditions(&self.wheres, &mut params));
        }
        Ok(BuiltQuery::new(sql, params))
    }
}

impl MutationQb for UpdateQb {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_where_params() {
        let built = UpdateQb::new("counters")
            .set("title", "Run")
            .set("goal", 3)
            .where_("id", Cmp::Eq, 7)
            .build()
            .unwrap();
        assert_eq!(
            built.sql,
            "UPDATE \"counters\" SET \"title\"=?,\"goal\"=? WHERE \"id\"=?"
        );
        assert_eq!(
            built.params,
            vec![Value::from("Run"), Value::Integer(3), Value::Integer(7)]
        );
    }

    #[test]
    fn test_null_value() {
        let built = UpdateQb::new("counters")
            .set("days", None::<i64>)
            .build()
            .unwrap();
        assert_eq!(built.params, vec![Value::Null]);
    }

    #[test]
    fn test_no_set_is_validation_error() {
        let err = UpdateQb::new("counters")
            .where_("id", Cmp::Eq, 1)
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Incomplete input in UPDATE");
    }
}
