//! WHERE/HAVING predicates built from `(left, operator, right)` triples.
//!
//! A clause is a flat conjunction: every triple is joined with `AND`.

use crate::qb::expr::{Cmp, Fragment, Operand};
use crate::qb::param::{ParamList, Value};

/// A single comparison.
///
/// # Example
/// ```ignore
/// use counters::qb::condition::Condition;
/// use counters::qb::expr::Cmp;
///
/// // "interval"=?
/// Condition::column("interval", Cmp::Eq, 0);
/// ```
#[derive(Clone, Debug)]
pub struct Condition {
    left: Operand,
    op: Cmp,
    right: Operand,
}

impl Condition {
    pub fn new(left: impl Into<Operand>, op: Cmp, right: impl Into<Operand>) -> Self {
        Self {
            left: left.into(),
            op,
            right: right.into(),
        }
    }

    /// `"column" op ?`
    pub fn column(column: &str, op: Cmp, value: impl Into<Value>) -> Self {
        Self::new(Operand::column(column), op, Operand::Value(value.into()))
    }

    /// `"column" op <fragment>`
    pub fn column_fragment(column: &str, op: Cmp, fragment: impl Into<Fragment>) -> Self {
        Self::new(
            Operand::column(column),
            op,
            Operand::Fragment(fragment.into()),
        )
    }

    /// `<fragment> op ?`
    pub fn fragment(fragment: impl Into<Fragment>, op: Cmp, value: impl Into<Value>) -> Self {
        Self::new(
            Operand::Fragment(fragment.into()),
            op,
            Operand::Value(value.into()),
        )
    }

    /// Render as `left op right` with no surrounding whitespace.
    pub fn build(&self, params: &mut ParamList) -> String {
        let left = self.left.build(params);
        let right = self.right.build(params);
        format!("{}{}{}", left, self.op.as_str(), right)
    }
}

/// Render a conjunction. Params are appended left to right, top to bottom.
pub fn build_conditions(conditions: &[Condition], params: &mut ParamList) -> String {
    conditions
        .iter()
        .map(|condition| condition.build(params))
        .collect::<Vec<_>>()
        .join(" AND ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qb::expr::func;

    #[test]
    fn test_column_value() {
        let mut params = ParamList::new();
        let sql = Condition::column("interval", Cmp::Eq, 0).build(&mut params);
        assert_eq!(sql, "\"interval\"=?");
        assert_eq!(params.as_slice(), &[Value::Integer(0)]);
    }

    #[test]
    fn test_conjunction_param_order() {
        let conditions = vec![
            Condition::column("counter_id", Cmp::Eq, 3),
            Condition::column("created", Cmp::Gte, 100),
            Condition::column("created", Cmp::Lt, 200),
        ];
        let mut params = ParamList::new();
        let sql = build_conditions(&conditions, &mut params);
        assert_eq!(sql, "\"counter_id\"=? AND \"created\">=? AND \"created\"<?");
        assert_eq!(
            params.into_vec(),
            vec![Value::Integer(3), Value::Integer(100), Value::Integer(200)]
        );
    }

    #[test]
    fn test_fragment_sides() {
        let mut params = ParamList::new();
        let sql = Condition::fragment(func::max("number"), Cmp::Gt, 0).build(&mut params);
        assert_eq!(sql, "max(\"number\")>?");

        let sql = Condition::column_fragment("created", Cmp::Gte, func::count()).build(&mut params);
        assert_eq!(sql, "\"created\">=count(*)");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_empty_conjunction() {
        let mut params = ParamList::new();
        assert_eq!(build_conditions(&[], &mut params), "");
        assert!(params.is_empty());
    }
}
