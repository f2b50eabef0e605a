//! Row mapping traits and utilities

use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::qb::param::Value;

/// One result row: column names (shared across a result set) and values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in result order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of a column, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|name| name == column)
            .and_then(|idx| self.values.get(idx))
    }

    /// Typed value of a column.
    pub fn try_get<T: FromValue>(&self, column: &str) -> StoreResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| StoreError::decode(column, "column not found"))?;
        T::from_value(value).map_err(|message| StoreError::decode(column, message))
    }
}

/// Conversion from a single column value.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, String>;
}

fn mismatch(expected: &str, value: &Value) -> String {
    format!("expected {expected}, got {value:?}")
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        value.as_i64().ok_or_else(|| mismatch("integer", value))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        value.as_f64().ok_or_else(|| mismatch("number", value))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        value
            .as_i64()
            .map(|i| i != 0)
            .ok_or_else(|| mismatch("boolean", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("text", value))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

/// Trait for types that can be constructed from a result row.
pub trait FromRow: Sized {
    /// Construct an instance from a row.
    fn from_row(row: &Row) -> StoreResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::new(
            Arc::from(vec!["id".to_string(), "title".to_string(), "days".to_string()]),
            vec![Value::Integer(1), Value::from("Run"), Value::Null],
        )
    }

    #[test]
    fn typed_access() {
        let row = row();
        assert_eq!(row.try_get::<i64>("id").unwrap(), 1);
        assert_eq!(row.try_get::<String>("title").unwrap(), "Run");
        assert_eq!(row.try_get::<Option<i64>>("days").unwrap(), None);
    }

    #[test]
    fn decode_errors_name_the_column() {
        let row = row();
        let err = row.try_get::<i64>("title").unwrap_err();
        assert!(matches!(err, StoreError::Decode { ref column, .. } if column == "title"));

        let err = row.try_get::<i64>("missing").unwrap_err();
        assert!(err.to_string().contains("column not found"));
    }
}
