//! Fragment layer: literals, function calls, window functions and binary
//! expressions that render themselves into SQL plus positional params.
//!
//! Rendering is pure: `build()` only appends to the `ParamList` it is given,
//! so the same fragment can be embedded several times in one statement and
//! always yields the same SQL.
//!
//! ```ignore
//! use counters::qb::expr::{ex, func, val, Operator};
//!
//! // (pow(?,strftime('%w',"d",'unixepoch','localtime'))&?)
//! let mask = ex(
//!     func::pow(val(2), func::strftime("%w", "d", &[DateModifier::UnixEpoch, DateModifier::LocalTime])),
//!     Operator::BitAnd,
//!     127,
//! );
//! ```

use crate::qb::modifier::{DateModifier, TimeValue};
use crate::qb::param::{ParamList, Value};
use crate::qb::traits::BuiltQuery;

/// Quote an identifier: `name` -> `"name"`.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal: `text` -> `'text'`.
pub(crate) fn quote_text(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Any binary operator usable inside an expression fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    Shl,
    Cmp(Cmp),
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Rem => "%",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::Shl => "<<",
            Operator::Cmp(cmp) => cmp.as_str(),
        }
    }
}

/// Comparison operators, the only ones allowed in WHERE/HAVING triples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    Ne,
}

impl Cmp {
    pub fn as_str(self) -> &'static str {
        match self {
            Cmp::Eq => "=",
            Cmp::Gt => ">",
            Cmp::Lt => "<",
            Cmp::Gte => ">=",
            Cmp::Lte => "<=",
            Cmp::Ne => "!=",
        }
    }
}

impl From<Cmp> for Operator {
    fn from(cmp: Cmp) -> Self {
        Operator::Cmp(cmp)
    }
}

/// One side of a binary expression or condition.
#[derive(Clone, Debug)]
pub enum Operand {
    /// Column name, rendered as a quoted identifier.
    Column(String),
    /// Bound value, rendered as `?`.
    Value(Value),
    /// Nested fragment, rendered inline.
    Fragment(Fragment),
}

impl Operand {
    pub fn column(name: impl Into<String>) -> Self {
        Operand::Column(name.into())
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Operand::Value(value.into())
    }

    pub(crate) fn build(&self, params: &mut ParamList) -> String {
        match self {
            Operand::Column(name) => quote_ident(name),
            Operand::Value(value) => {
                params.push(value.clone());
                "?".to_string()
            }
            Operand::Fragment(fragment) => fragment.build(params),
        }
    }
}

impl From<&str> for Operand {
    fn from(name: &str) -> Self {
        Operand::Column(name.to_string())
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Value(Value::Integer(value))
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Value(Value::from(value))
    }
}

macro_rules! impl_from_fragment {
    ($target:ident, $variant:ident) => {
        impl From<Fragment> for $target {
            fn from(fragment: Fragment) -> Self {
                $target::$variant(fragment)
            }
        }

        impl From<Function> for $target {
            fn from(function: Function) -> Self {
                $target::$variant(Fragment::Function(function))
            }
        }

        impl From<WindowFunction> for $target {
            fn from(window: WindowFunction) -> Self {
                $target::$variant(Fragment::Window(window))
            }
        }
    };
}

impl_from_fragment!(Operand, Fragment);

/// A function argument.
#[derive(Clone, Debug)]
pub enum Arg {
    /// Column name, rendered as a quoted identifier.
    Column(String),
    /// The bare `*` of `count(*)`.
    Star,
    /// Integer literal, rendered as raw text.
    Integer(i64),
    /// Real literal, rendered as raw text.
    Real(f64),
    /// String literal (formats, modifiers, `'now'`).
    Text(String),
    /// Nested fragment; its params are spliced in at this position.
    Fragment(Fragment),
}

impl Arg {
    pub fn column(name: impl Into<String>) -> Self {
        Arg::Column(name.into())
    }

    fn build(&self, params: &mut ParamList) -> String {
        match self {
            Arg::Column(name) => quote_ident(name),
            Arg::Star => "*".to_string(),
            Arg::Integer(i) => i.to_string(),
            Arg::Real(r) => r.to_string(),
            Arg::Text(text) => quote_text(text),
            Arg::Fragment(fragment) => fragment.build(params),
        }
    }
}

impl From<&str> for Arg {
    fn from(name: &str) -> Self {
        if name == "*" {
            Arg::Star
        } else {
            Arg::Column(name.to_string())
        }
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Integer(value)
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Arg::Integer(i64::from(value))
    }
}

impl From<TimeValue> for Arg {
    fn from(time: TimeValue) -> Self {
        match time {
            TimeValue::Now => Arg::Text("now".to_string()),
            TimeValue::Column(name) => Arg::Column(name),
        }
    }
}

impl From<DateModifier> for Arg {
    fn from(modifier: DateModifier) -> Self {
        Arg::Text(modifier.to_string())
    }
}

impl_from_fragment!(Arg, Fragment);

/// A plain function call: `name(arg1,arg2,...)`.
#[derive(Clone, Debug)]
pub struct Function {
    name: &'static str,
    args: Vec<Arg>,
}

impl Function {
    pub fn new(name: &'static str, args: Vec<Arg>) -> Self {
        Self { name, args }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    fn build(&self, params: &mut ParamList) -> String {
        let args: Vec<String> = self.args.iter().map(|arg| arg.build(params)).collect();
        format!("{}({})", self.name, args.join(","))
    }

    /// Attach an alias; the rendered SQL gains `AS <alias>`.
    pub fn alias(self, alias: impl Into<String>) -> Aliased {
        Fragment::from(self).alias(alias)
    }
}

/// `ORDER BY` clause of a window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Over {
    pub column: String,
    pub desc: bool,
}

/// A function that may be evaluated over a window:
/// `name(args) OVER(ORDER BY column [DESC])`.
#[derive(Clone, Debug)]
pub struct WindowFunction {
    function: Function,
    over: Option<Over>,
}

impl WindowFunction {
    pub fn new(name: &'static str, args: Vec<Arg>) -> Self {
        Self {
            function: Function::new(name, args),
            over: None,
        }
    }

    /// Evaluate over a window ordered by `column`.
    pub fn over(mut self, column: impl Into<String>, desc: bool) -> Self {
        self.over = Some(Over {
            column: column.into(),
            desc,
        });
        self
    }

    fn build(&self, params: &mut ParamList) -> String {
        let mut sql = self.function.build(params);
        if let Some(over) = &self.over {
            sql.push_str(" OVER(ORDER BY ");
            sql.push_str(&over.column);
            if over.desc {
                sql.push_str(" DESC");
            }
            sql.push(')');
        }
        sql
    }

    /// Attach an alias; the rendered SQL gains `AS <alias>`.
    pub fn alias(self, alias: impl Into<String>) -> Aliased {
        Fragment::from(self).alias(alias)
    }
}

/// `(left op right)`.
#[derive(Clone, Debug)]
pub struct Binary {
    left: Operand,
    op: Operator,
    right: Operand,
}

impl Binary {
    fn build(&self, params: &mut ParamList) -> String {
        let left = self.left.build(params);
        let right = self.right.build(params);
        format!("({}{}{})", left, self.op.as_str(), right)
    }
}

/// A composable SQL-emitting expression node.
#[derive(Clone, Debug)]
pub enum Fragment {
    /// Bound scalar, rendered as `?`.
    Value(Value),
    Function(Function),
    Window(WindowFunction),
    Binary(Box<Binary>),
}

impl Fragment {
    /// Render into SQL, appending params in placeholder order.
    pub fn build(&self, params: &mut ParamList) -> String {
        match self {
            Fragment::Value(value) => {
                params.push(value.clone());
                "?".to_string()
            }
            Fragment::Function(function) => function.build(params),
            Fragment::Window(window) => window.build(params),
            Fragment::Binary(binary) => binary.build(params),
        }
    }

    /// Render standalone.
    pub fn to_sql(&self) -> BuiltQuery {
        let mut params = ParamList::new();
        let sql = self.build(&mut params);
        BuiltQuery::new(sql, params)
    }

    /// Attach an alias; the rendered SQL gains `AS <alias>`.
    pub fn alias(self, alias: impl Into<String>) -> Aliased {
        Aliased {
            fragment: self,
            alias: alias.into(),
        }
    }
}

impl From<Function> for Fragment {
    fn from(function: Function) -> Self {
        Fragment::Function(function)
    }
}

impl From<WindowFunction> for Fragment {
    fn from(window: WindowFunction) -> Self {
        Fragment::Window(window)
    }
}

impl From<Binary> for Fragment {
    fn from(binary: Binary) -> Self {
        Fragment::Binary(Box::new(binary))
    }
}

/// A fragment with its output column name.
#[derive(Clone, Debug)]
pub struct Aliased {
    fragment: Fragment,
    alias: String,
}

impl Aliased {
    /// The output column name.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    pub fn build(&self, params: &mut ParamList) -> String {
        format!("{} AS {}", self.fragment.build(params), self.alias)
    }

    pub fn to_sql(&self) -> BuiltQuery {
        let mut params = ParamList::new();
        let sql = self.build(&mut params);
        BuiltQuery::new(sql, params)
    }
}

/// A bound value: `?`.
pub fn val(value: impl Into<Value>) -> Fragment {
    Fragment::Value(value.into())
}

/// A binary expression: `(left op right)`.
pub fn ex(left: impl Into<Operand>, op: impl Into<Operator>, right: impl Into<Operand>) -> Fragment {
    Fragment::from(Binary {
        left: left.into(),
        op: op.into(),
        right: right.into(),
    })
}

/// SQL function catalogue.
pub mod func {
    use super::{Arg, Function, WindowFunction};
    use crate::qb::modifier::{DateModifier, TimeValue};

    fn time_args(time: TimeValue, modifiers: &[DateModifier]) -> Vec<Arg> {
        let mut args = vec![Arg::from(time)];
        args.extend(modifiers.iter().copied().map(Arg::from));
        args
    }

    /// `count(*)`
    pub fn count() -> Function {
        Function::new("count", vec![Arg::Star])
    }

    /// `count("column")`
    pub fn count_column(column: &str) -> Function {
        Function::new("count", vec![Arg::column(column)])
    }

    /// `unixepoch(time, modifiers...)`
    pub fn unixepoch(time: impl Into<TimeValue>, modifiers: &[DateModifier]) -> Function {
        Function::new("unixepoch", time_args(time.into(), modifiers))
    }

    /// `date(time, modifiers...)`
    pub fn date(time: impl Into<TimeValue>, modifiers: &[DateModifier]) -> Function {
        Function::new("date", time_args(time.into(), modifiers))
    }

    /// `pow(x, y)`
    pub fn pow(x: impl Into<Arg>, y: impl Into<Arg>) -> Function {
        Function::new("pow", vec![x.into(), y.into()])
    }

    /// `strftime(format, time, modifiers...)`
    pub fn strftime(
        format: &str,
        time: impl Into<TimeValue>,
        modifiers: &[DateModifier],
    ) -> Function {
        let mut args = vec![Arg::Text(format.to_string())];
        args.extend(time_args(time.into(), modifiers));
        Function::new("strftime", args)
    }

    /// `max("column")`
    pub fn max(column: &str) -> Function {
        Function::new("max", vec![Arg::column(column)])
    }

    /// `min("column")`
    pub fn min(column: &str) -> Function {
        Function::new("min", vec![Arg::column(column)])
    }

    /// `sum("column")`, optionally windowed.
    pub fn sum(column: &str) -> WindowFunction {
        WindowFunction::new("sum", vec![Arg::column(column)])
    }

    /// `row_number()`, meant to be windowed.
    pub fn row_number() -> WindowFunction {
        WindowFunction::new("row_number", Vec::new())
    }

    /// `lag("expression", offset, "default")`, meant to be windowed.
    pub fn lag(expression: &str, offset: i64, default: &str) -> WindowFunction {
        WindowFunction::new(
            "lag",
            vec![Arg::column(expression), Arg::Integer(offset), Arg::column(default)],
        )
    }
}
