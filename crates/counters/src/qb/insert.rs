//! INSERT query builder.

use crate::error::{StoreError, StoreResult};
use crate::qb::expr::quote_ident;
use crate::qb::param::{ParamList, Value};
use crate::qb::traits::{BuiltQuery, MutationQb, SqlQb};

/// One queued row: column name and value pairs, in column order.
pub type InsertRow = Vec<(String, Value)>;

/// Multi-row INSERT builder.
///
/// The column list is taken from the first queued row. Later rows are not
/// checked against it; a row with different keys yields SQL the driver
/// rejects or misbinds.
#[derive(Clone, Debug)]
#[must_use]
pub struct InsertQb {
    table: String,
    rows: Vec<InsertRow>,
}

impl InsertQb {
    /// Create a new INSERT query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            rows: Vec::new(),
        }
    }

    /// Queue one row.
    pub fn values<I, K, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.rows.push(
            row.into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Number of queued rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl SqlQb for InsertQb {
    fn build(&self) -> StoreResult<BuiltQuery> {
        let Some(first) = self.rows.first() else {
            return Err(StoreError::validation("Incomplete input in INSERT"));
        };

        let columns: Vec<String> = first.iter().map(|(column, _)| quote_ident(column)).collect();
        let placeholders = format!("({})", vec!["?"; columns.len()].join(","));

        let mut params = ParamList::new();
        for row in &self.rows {
            for (_, value) in row {
                params.push(value.clone());
            }
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            quote_ident(&self.table),
            columns.join(","),
            vec![placeholders; self.rows.len()].join(",")
        );
        Ok(BuiltQuery::new(sql, params))
    }
}

impl MutationQb for InsertQb {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_row() {
        let built = InsertQb::new("counters")
            .values([
                ("title", Value::from("A")),
                ("goal", Value::from(1)),
                ("interval", Value::from(0)),
            ])
            .build()
            .unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO \"counters\" (\"title\",\"goal\",\"interval\") VALUES (?,?,?)"
        );
        assert_eq!(
            built.params,
            vec![Value::from("A"), Value::Integer(1), Value::Integer(0)]
        );
    }

    #[test]
    fn test_multi_row() {
        let built = InsertQb::new("entries")
            .values([("counter_id", 1), ("created", 100)])
            .values([("counter_id", 1), ("created", 200)])
            .build()
            .unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO \"entries\" (\"counter_id\",\"created\") VALUES (?,?),(?,?)"
        );
        assert_eq!(built.params.len(), 4);
        assert_eq!(built.placeholder_count(), 4);
    }

    #[test]
    fn test_no_rows_is_validation_error() {
        let err = InsertQb::new("entries").build().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Validation error: Incomplete input in INSERT");
    }
}
