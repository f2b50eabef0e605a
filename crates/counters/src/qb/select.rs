//! SELECT query builder.
//!
//! Clause-appending methods consume and return the same builder.
//! [`SelectQb::select`] is scope-narrowing: it returns a new builder that
//! reads from the current one as a FROM-subquery.

use crate::error::StoreResult;
use crate::qb::condition::{Condition, build_conditions};
use crate::qb::cte::{CteDefinition, build_with, merge_ctes};
use crate::qb::expr::{Aliased, Cmp, Fragment, quote_ident};
use crate::qb::param::{ParamList, Value};
use crate::qb::traits::{BuiltQuery, SqlQb};

/// FROM source of a SELECT.
#[derive(Clone, Debug)]
enum FromSource {
    Table(String),
    Subquery(Box<SelectQb>),
}

/// One entry of the projection list.
#[derive(Clone, Debug)]
pub enum SelectColumn {
    /// Bare column name (or `*`), emitted as written.
    Name(String),
    /// Aliased fragment; its params are appended at this position.
    Expr(Aliased),
}

impl SelectColumn {
    /// Output name of the column.
    pub fn name(&self) -> &str {
        match self {
            SelectColumn::Name(name) => name,
            SelectColumn::Expr(aliased) => aliased.alias(),
        }
    }

    fn build(&self, params: &mut ParamList) -> String {
        match self {
            SelectColumn::Name(name) => name.clone(),
            SelectColumn::Expr(aliased) => aliased.build(params),
        }
    }
}

impl From<&str> for SelectColumn {
    fn from(name: &str) -> Self {
        SelectColumn::Name(name.to_string())
    }
}

impl From<Aliased> for SelectColumn {
    fn from(aliased: Aliased) -> Self {
        SelectColumn::Expr(aliased)
    }
}

#[derive(Clone, Debug)]
struct UnionPart {
    all: bool,
    query: SelectQb,
}

/// SELECT query builder.
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct SelectQb {
    ctes: Vec<CteDefinition>,
    from: Option<FromSource>,
    columns: Vec<SelectColumn>,
    wheres: Vec<Condition>,
    group_by: Option<String>,
    having: Vec<Condition>,
    order_by: Option<(String, bool)>,
    /// 0 means no LIMIT clause.
    limit: i64,
    /// 0 means no OFFSET clause.
    offset: i64,
    unions: Vec<UnionPart>,
}

impl SelectQb {
    /// Create a new SELECT over a table (or CTE name).
    pub fn new(table: &str) -> Self {
        Self {
            from: Some(FromSource::Table(table.to_string())),
            ..Self::default()
        }
    }

    /// Create a new SELECT reading from a subquery.
    pub fn from_subquery(mut query: SelectQb) -> Self {
        let ctes = query.take_ctes();
        Self {
            ctes,
            from: Some(FromSource::Subquery(Box::new(query))),
            ..Self::default()
        }
    }

    /// Create a SELECT with no FROM clause, e.g. `SELECT unixepoch('now') AS d`.
    pub fn without_from() -> Self {
        Self::default()
    }

    /// Prepend CTEs registered ahead of this statement.
    pub(crate) fn with_ctes(mut self, mut ctes: Vec<CteDefinition>) -> Self {
        merge_ctes(&mut ctes, self.take_ctes());
        self.ctes = ctes;
        self
    }

    pub(crate) fn take_ctes(&mut self) -> Vec<CteDefinition> {
        std::mem::take(&mut self.ctes)
    }

    // ==================== Projection ====================

    /// Append bare column names.
    pub fn columns(mut self, names: &[&str]) -> Self {
        self.columns
            .extend(names.iter().map(|name| SelectColumn::from(*name)));
        self
    }

    /// Append one column: a bare name or an aliased fragment.
    pub fn column(mut self, column: impl Into<SelectColumn>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Output column names, in projection order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(SelectColumn::name).collect()
    }

    // ==================== WHERE ====================

    /// Add WHERE: "column" op ?
    pub fn where_(mut self, column: &str, op: Cmp, value: impl Into<Value>) -> Self {
        self.wheres.push(Condition::column(column, op, value));
        self
    }

    /// Add WHERE: "column" op <fragment>
    pub fn where_fragment(mut self, column: &str, op: Cmp, fragment: impl Into<Fragment>) -> Self {
        self.wheres
            .push(Condition::column_fragment(column, op, fragment));
        self
    }

    /// Add WHERE: <fragment> op ?
    pub fn where_expr(mut self, fragment: impl Into<Fragment>, op: Cmp, value: impl Into<Value>) -> Self {
        self.wheres.push(Condition::fragment(fragment, op, value));
        self
    }

    /// Add a prebuilt WHERE condition.
    pub fn where_condition(mut self, condition: Condition) -> Self {
        self.wheres.push(condition);
        self
    }

    // ==================== GROUP BY / HAVING ====================

    /// Set GROUP BY column.
    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by = Some(column.to_string());
        self
    }

    /// Add HAVING: "column" op ?
    ///
    /// Only emitted when a GROUP BY column is set.
    pub fn having(mut self, column: &str, op: Cmp, value: impl Into<Value>) -> Self {
        self.having.push(Condition::column(column, op, value));
        self
    }

    /// Add HAVING: <fragment> op ?
    pub fn having_expr(mut self, fragment: impl Into<Fragment>, op: Cmp, value: impl Into<Value>) -> Self {
        self.having.push(Condition::fragment(fragment, op, value));
        self
    }

    // ==================== ORDER / LIMIT ====================

    /// Set ORDER BY column and direction.
    pub fn order_by(mut self, column: &str, asc: bool) -> Self {
        self.order_by = Some((column.to_string(), asc));
        self
    }

    /// Set LIMIT. A limit of 0 emits no LIMIT clause.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set OFFSET. An offset of 0 emits no OFFSET clause.
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    // ==================== Composition ====================

    /// Append `UNION <query>`.
    pub fn union(self, query: SelectQb) -> Self {
        self.push_union(query, false)
    }

    /// Append `UNION ALL <query>`.
    pub fn union_all(self, query: SelectQb) -> Self {
        self.push_union(query, true)
    }

    /// CTEs carried by `query` are hoisted; one whose name is already
    /// registered here is dropped in favour of the existing definition.
    fn push_union(mut self, mut query: SelectQb, all: bool) -> Self {
        merge_ctes(&mut self.ctes, query.take_ctes());
        self.unions.push(UnionPart { all, query });
        self
    }

    /// Wrap this query as the FROM-subquery of a new SELECT.
    ///
    /// Registered CTEs move to the new outer builder.
    pub fn select(self) -> SelectQb {
        SelectQb::from_subquery(self)
    }

    pub(crate) fn build_into(&self, params: &mut ParamList) -> String {
        let mut sql = build_with(&self.ctes, params);

        sql.push_str("SELECT ");
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            let cols: Vec<String> = self.columns.iter().map(|c| c.build(params)).collect();
            sql.push_str(&cols.join(","));
        }

        match &self.from {
            Some(FromSource::Table(table)) => {
                sql.push_str(" FROM ");
                sql.push_str(&quote_ident(table));
            }
            Some(FromSource::Subquery(query)) => {
                let inner = query.build_into(params);
                sql.push_str(" FROM (");
                sql.push_str(&inner);
                sql.push(')');
            }
            None => {}
        }

        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&build_conditions(&self.wheres, params));
        }

        if let Some(group) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group);
            if !self.having.is_empty() {
                sql.push_str(" HAVING ");
                sql.push_str(&build_conditions(&self.having, params));
            }
        }

        if let Some((column, asc)) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(column);
            sql.push_str(if *asc { " ASC" } else { " DESC" });
        }

        if self.limit != 0 {
            sql.push_str(" LIMIT ?");
            params.push(self.limit);
        }

        if self.offset != 0 {
            sql.push_str(" OFFSET ?");
            params.push(self.offset);
        }

        for part in &self.unions {
            sql.push_str(if part.all { " UNION ALL " } else { " UNION " });
            sql.push_str(&part.query.build_into(params));
        }

        sql
    }
}

impl SqlQb for SelectQb {
    fn build(&self) -> StoreResult<BuiltQuery> {
        let mut params = ParamList::new();
        let sql = self.build_into(&mut params);
        Ok(BuiltQuery::new(sql, params))
    }
}
