//! Predicate building and SQL rendering.
//!
//! A [`Condition`] is plain data. An [`SqlBuilder`] collects conditions for
//! one base table plus its joins and renders them into a [`Query`]: the SQL
//! text and the named parameters it references. Values only ever travel as
//! parameters. Identifiers only ever come from [`Entity`] registrations.
//!
//! Parameter names are `:p0`, `:p1`, ... drawn from a counter that lives for
//! one render, so two queries rendered from the same builder are independent.

use std::fmt::Write as _;
use std::rc::Rc;

use rusqlite::types::{ToSql, Value};
use rusqlite::{Connection, Rows};

use crate::error::BuildError;
use crate::mapping::{ColumnRef, Entity, Field};
use crate::paging::{SortDirection, Window};

// ── Conditions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterOrEqual,
    LessThan,
    In,
    /// The column contains the bound text, ignoring ASCII case. Wildcard
    /// characters in the text are literal.
    Contains,
    /// The bound text contains the column.
    SubstringOf,
    Between,
    IsNull,
    IsNotNull,
}

/// One bound comparison against a mapped column.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub op: Operator,
    pub column: ColumnRef,
    pub values: Vec<Value>,
}

/// A boolean condition over mapped columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Predicate(Predicate),
    /// Every member holds. Empty is true.
    All(Vec<Condition>),
    /// At least one member holds. Empty is false.
    Any(Vec<Condition>),
}

impl Condition {
    fn predicate<T: Entity>(
        op: Operator,
        field: Field<T>,
        values: Vec<Value>,
    ) -> Result<Self, BuildError> {
        Ok(Self::Predicate(Predicate {
            op,
            column: field.column()?,
            values,
        }))
    }

    pub fn equal<T: Entity>(field: Field<T>, value: impl Into<Value>) -> Result<Self, BuildError> {
        Self::predicate(Operator::Equal, field, vec![value.into()])
    }

    pub fn not_equal<T: Entity>(
        field: Field<T>,
        value: impl Into<Value>,
    ) -> Result<Self, BuildError> {
        Self::predicate(Operator::NotEqual, field, vec![value.into()])
    }

    pub fn greater_or_equal<T: Entity>(
        field: Field<T>,
        value: impl Into<Value>,
    ) -> Result<Self, BuildError> {
        Self::predicate(Operator::GreaterOrEqual, field, vec![value.into()])
    }

    pub fn less_than<T: Entity>(
        field: Field<T>,
        value: impl Into<Value>,
    ) -> Result<Self, BuildError> {
        Self::predicate(Operator::LessThan, field, vec![value.into()])
    }

    /// Set membership. An empty set matches nothing.
    pub fn in_set<T: Entity, V: Into<Value>>(
        field: Field<T>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self, BuildError> {
        Self::predicate(
            Operator::In,
            field,
            values.into_iter().map(Into::into).collect(),
        )
    }

    pub fn contains<T: Entity>(
        field: Field<T>,
        substring: impl Into<String>,
    ) -> Result<Self, BuildError> {
        Self::predicate(
            Operator::Contains,
            field,
            vec![Value::Text(substring.into())],
        )
    }

    pub fn substring_of<T: Entity>(
        field: Field<T>,
        haystack: impl Into<String>,
    ) -> Result<Self, BuildError> {
        Self::predicate(
            Operator::SubstringOf,
            field,
            vec![Value::Text(haystack.into())],
        )
    }

    /// Inclusive range.
    pub fn between<T: Entity>(
        field: Field<T>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Result<Self, BuildError> {
        Self::predicate(Operator::Between, field, vec![lower.into(), upper.into()])
    }

    pub fn is_null<T: Entity>(field: Field<T>) -> Result<Self, BuildError> {
        Self::predicate(Operator::IsNull, field, Vec::new())
    }

    pub fn is_not_null<T: Entity>(field: Field<T>) -> Result<Self, BuildError> {
        Self::predicate(Operator::IsNotNull, field, Vec::new())
    }

    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Any(conditions.into_iter().collect())
    }

    /// Tables referenced anywhere in this condition.
    pub fn tables(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        self.collect_tables(&mut out);
        out
    }

    fn collect_tables(&self, out: &mut Vec<&'static str>) {
        match self {
            Self::Predicate(p) => {
                if !out.contains(&p.column.table) {
                    out.push(p.column.table);
                }
            }
            Self::All(members) | Self::Any(members) => {
                for member in members {
                    member.collect_tables(out);
                }
            }
        }
    }

    fn render(&self, names: &mut ParamNames) -> String {
        match self {
            Self::Predicate(p) => p.render(names),
            Self::All(members) => render_group(members, " AND ", "1", names),
            Self::Any(members) => render_group(members, " OR ", "0", names),
        }
    }
}

fn render_group(
    members: &[Condition],
    joiner: &str,
    empty: &str,
    names: &mut ParamNames,
) -> String {
    match members {
        [] => empty.to_string(),
        [single] => single.render(names),
        _ => {
            let parts: Vec<String> = members.iter().map(|m| m.render(names)).collect();
            format!("({})", parts.join(joiner))
        }
    }
}

impl Predicate {
    fn value(&self, idx: usize) -> Value {
        self.values.get(idx).cloned().unwrap_or(Value::Null)
    }

    fn render(&self, names: &mut ParamNames) -> String {
        let col = self.column;
        match self.op {
            Operator::Equal => format!("{col} = {}", names.bind(self.value(0))),
            Operator::NotEqual => format!("{col} <> {}", names.bind(self.value(0))),
            Operator::GreaterOrEqual => format!("{col} >= {}", names.bind(self.value(0))),
            Operator::LessThan => format!("{col} < {}", names.bind(self.value(0))),
            Operator::In => format!(
                "{col} IN rarray({})",
                names.bind_set(self.values.clone())
            ),
            Operator::Contains => format!(
                "instr(lower({col}), lower({})) > 0",
                names.bind(self.value(0))
            ),
            Operator::SubstringOf => {
                format!("instr({}, {col}) > 0", names.bind(self.value(0)))
            }
            Operator::Between => {
                let lower = names.bind(self.value(0));
                let upper = names.bind(self.value(1));
                format!("{col} BETWEEN {lower} AND {upper}")
            }
            Operator::IsNull => format!("{col} IS NULL"),
            Operator::IsNotNull => format!("{col} IS NOT NULL"),
        }
    }
}

// ── Parameters ──────────────────────────────────────────────────────────────

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Value(Value),
    /// A whole set, read by `rarray()`.
    Set(Vec<Value>),
}

/// Per-render parameter allocator.
#[derive(Debug, Default)]
pub struct ParamNames {
    next: usize,
    params: Vec<(String, Param)>,
}

impl ParamNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, value: Value) -> String {
        self.push(Param::Value(value))
    }

    pub fn bind_set(&mut self, values: Vec<Value>) -> String {
        self.push(Param::Set(values))
    }

    fn push(&mut self, param: Param) -> String {
        let name = format!(":p{}", self.next);
        self.next += 1;
        self.params.push((name.clone(), param));
        name
    }

    pub fn finish(self, sql: String) -> Query {
        Query {
            sql,
            params: self.params,
        }
    }
}

// ── Builder ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    table: &'static str,
    columns: &'static [&'static str],
    on: &'static str,
}

/// Conditions against one base table and its joins.
#[derive(Debug, Clone)]
pub struct SqlBuilder {
    table: &'static str,
    columns: &'static [&'static str],
    joins: Vec<Join>,
    and: Vec<Condition>,
    or: Vec<Condition>,
}

impl SqlBuilder {
    pub fn new<T: Entity>() -> Self {
        Self {
            table: T::TABLE,
            columns: T::COLUMNS,
            joins: Vec::new(),
            and: Vec::new(),
            or: Vec::new(),
        }
    }

    /// Inner join `J` using a static ON clause.
    pub fn join<J: Entity>(self, on: &'static str) -> Self {
        self.push_join::<J>(JoinKind::Inner, on)
    }

    pub fn left_join<J: Entity>(self, on: &'static str) -> Self {
        self.push_join::<J>(JoinKind::Left, on)
    }

    fn push_join<J: Entity>(mut self, kind: JoinKind, on: &'static str) -> Self {
        self.joins.push(Join {
            kind,
            table: J::TABLE,
            columns: J::COLUMNS,
            on,
        });
        self
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    fn id_column(&self) -> ColumnRef {
        ColumnRef {
            table: self.table,
            column: "id",
        }
    }

    fn check_tables(&self, condition: &Condition) -> Result<(), BuildError> {
        for table in condition.tables() {
            if table != self.table && !self.joins.iter().any(|j| j.table == table) {
                let mut available = vec![self.table];
                available.extend(self.joins.iter().map(|j| j.table));
                return Err(BuildError::TableNotInQuery {
                    table,
                    available: available.join(", "),
                });
            }
        }
        Ok(())
    }

    /// Add a condition to the conjunctive list.
    pub fn and_where(mut self, condition: Condition) -> Result<Self, BuildError> {
        self.check_tables(&condition)?;
        self.and.push(condition);
        Ok(self)
    }

    /// Add a condition to the single disjunctive group.
    pub fn or_where(mut self, condition: Condition) -> Result<Self, BuildError> {
        self.check_tables(&condition)?;
        self.or.push(condition);
        Ok(self)
    }

    pub fn equal<T: Entity>(self, field: Field<T>, value: impl Into<Value>) -> Result<Self, BuildError> {
        self.and_where(Condition::equal(field, value)?)
    }

    pub fn not_equal<T: Entity>(
        self,
        field: Field<T>,
        value: impl Into<Value>,
    ) -> Result<Self, BuildError> {
        self.and_where(Condition::not_equal(field, value)?)
    }

    pub fn greater_or_equal<T: Entity>(
        self,
        field: Field<T>,
        value: impl Into<Value>,
    ) -> Result<Self, BuildError> {
        self.and_where(Condition::greater_or_equal(field, value)?)
    }

    pub fn less_than<T: Entity>(
        self,
        field: Field<T>,
        value: impl Into<Value>,
    ) -> Result<Self, BuildError> {
        self.and_where(Condition::less_than(field, value)?)
    }

    pub fn in_set<T: Entity, V: Into<Value>>(
        self,
        field: Field<T>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self, BuildError> {
        self.and_where(Condition::in_set(field, values)?)
    }

    pub fn or_in_set<T: Entity, V: Into<Value>>(
        self,
        field: Field<T>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self, BuildError> {
        self.or_where(Condition::in_set(field, values)?)
    }

    pub fn contains<T: Entity>(
        self,
        field: Field<T>,
        substring: impl Into<String>,
    ) -> Result<Self, BuildError> {
        self.and_where(Condition::contains(field, substring)?)
    }

    pub fn substring_of<T: Entity>(
        self,
        field: Field<T>,
        haystack: impl Into<String>,
    ) -> Result<Self, BuildError> {
        self.and_where(Condition::substring_of(field, haystack)?)
    }

    pub fn between<T: Entity>(
        self,
        field: Field<T>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Result<Self, BuildError> {
        self.and_where(Condition::between(field, lower, upper)?)
    }

    pub fn or_between<T: Entity>(
        self,
        field: Field<T>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Result<Self, BuildError> {
        self.or_where(Condition::between(field, lower, upper)?)
    }

    pub fn is_null<T: Entity>(self, field: Field<T>) -> Result<Self, BuildError> {
        self.and_where(Condition::is_null(field)?)
    }

    pub fn is_not_null<T: Entity>(self, field: Field<T>) -> Result<Self, BuildError> {
        self.and_where(Condition::is_not_null(field)?)
    }

    /// Resolve a caller supplied sort key, `column` on the base table or
    /// `table.column` on any table in the query.
    pub fn resolve_sort_key(&self, key: &str) -> Result<ColumnRef, BuildError> {
        let resolved = match key.split_once('.') {
            Some((table, column)) if table == self.table => {
                ColumnRef::resolve(self.table, self.columns, column)
            }
            Some((table, column)) => self
                .joins
                .iter()
                .find(|j| j.table == table)
                .and_then(|j| ColumnRef::resolve(j.table, j.columns, column)),
            None => ColumnRef::resolve(self.table, self.columns, key),
        };
        resolved.ok_or_else(|| BuildError::UnknownSortKey(key.to_string()))
    }

    // ── Rendering ───────────────────────────────────────────────────────────

    fn from_clause(&self) -> String {
        let mut sql = format!("\"{}\"", self.table);
        for join in &self.joins {
            let kind = match join.kind {
                JoinKind::Inner => "INNER JOIN",
                JoinKind::Left => "LEFT JOIN",
            };
            let _ = write!(sql, " {} \"{}\" ON {}", kind, join.table, join.on);
        }
        sql
    }

    fn where_clause(&self, names: &mut ParamNames) -> String {
        let mut parts: Vec<String> = self.and.iter().map(|c| c.render(names)).collect();
        if !self.or.is_empty() {
            let group: Vec<String> = self.or.iter().map(|c| c.render(names)).collect();
            parts.push(format!("({})", group.join(" OR ")));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", parts.join(" AND "))
        }
    }

    fn order_clause(&self, order: Option<(ColumnRef, SortDirection)>) -> String {
        let id = self.id_column();
        match order {
            Some((key, dir)) if key != id => format!(" ORDER BY {} {}, {} ASC", key, dir.sql(), id),
            Some((_, dir)) => format!(" ORDER BY {} {}", id, dir.sql()),
            None => format!(" ORDER BY {} ASC", id),
        }
    }

    fn limit_clause(window: Option<Window>, names: &mut ParamNames) -> String {
        match window {
            Some(w) => {
                let limit = names.bind(Value::Integer(i64::from(w.limit)));
                let offset = names.bind(Value::Integer(
                    i64::try_from(w.offset).unwrap_or(i64::MAX),
                ));
                format!(" LIMIT {limit} OFFSET {offset}")
            }
            None => String::new(),
        }
    }

    /// Every matching row, ordered by base id.
    pub fn select(&self, columns: &str) -> Query {
        self.select_page(columns, None, None)
    }

    /// Rows of one page.
    ///
    /// Without joins the window applies to rows directly. With joins it
    /// applies to distinct base ids, and every joined row of each selected id
    /// is returned, adjacent and in page order. A sort column that can hold
    /// several values per id is reduced to its smallest value when ascending
    /// and its largest when descending.
    pub fn select_page(
        &self,
        columns: &str,
        order: Option<(ColumnRef, SortDirection)>,
        window: Option<Window>,
    ) -> Query {
        let mut names = ParamNames::new();
        let from = self.from_clause();
        let sql = if self.joins.is_empty() {
            let order_by = self.order_clause(order);
            let filter = self.where_clause(&mut names);
            let limit = Self::limit_clause(window, &mut names);
            format!("SELECT {columns} FROM {from}{filter}{order_by}{limit}")
        } else {
            let id = self.id_column();
            let (key, dir) = match order {
                Some((key, dir)) if key != id => {
                    let agg = match dir {
                        SortDirection::Descending => "MAX",
                        SortDirection::Default | SortDirection::Ascending => "MIN",
                    };
                    (format!("{agg}({key})"), dir)
                }
                Some((_, dir)) => (id.to_string(), dir),
                None => (id.to_string(), SortDirection::Ascending),
            };
            let dir = dir.sql();
            let filter = self.where_clause(&mut names);
            let limit = Self::limit_clause(window, &mut names);
            format!(
                "SELECT {columns} FROM {from} INNER JOIN \
                 (SELECT {id} AS page_id, {key} AS page_key FROM {from}{filter} \
                 GROUP BY {id} ORDER BY page_key {dir}, page_id ASC{limit}) AS \"page\" \
                 ON {id} = \"page\".page_id \
                 ORDER BY \"page\".page_key {dir}, \"page\".page_id ASC"
            )
        };
        names.finish(sql)
    }

    /// Number of distinct base rows matching the conditions.
    pub fn select_count(&self) -> Query {
        let mut names = ParamNames::new();
        let from = self.from_clause();
        let filter = self.where_clause(&mut names);
        let sql = format!("SELECT COUNT(DISTINCT {}) FROM {from}{filter}", self.id_column());
        names.finish(sql)
    }

    pub fn delete(&self) -> Result<Query, BuildError> {
        if self.has_joins() {
            return Err(BuildError::JoinedWrite(self.table));
        }
        let mut names = ParamNames::new();
        let filter = self.where_clause(&mut names);
        let sql = format!("DELETE FROM \"{}\"{filter}", self.table);
        Ok(names.finish(sql))
    }

    /// Assign columns of the base table on every matching row.
    pub fn update(&self, assignments: &[(ColumnRef, Value)]) -> Result<Query, BuildError> {
        if self.has_joins() {
            return Err(BuildError::JoinedWrite(self.table));
        }
        let mut names = ParamNames::new();
        let mut sets = Vec::with_capacity(assignments.len());
        for (column, value) in assignments {
            if column.table != self.table {
                return Err(BuildError::TableNotInQuery {
                    table: column.table,
                    available: self.table.to_string(),
                });
            }
            sets.push(format!("\"{}\" = {}", column.column, names.bind(value.clone())));
        }
        let filter = self.where_clause(&mut names);
        let sql = format!("UPDATE \"{}\" SET {}{filter}", self.table, sets.join(", "));
        Ok(names.finish(sql))
    }
}

// ── Rendered Queries ────────────────────────────────────────────────────────

/// Rendered SQL and its named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub params: Vec<(String, Param)>,
}

impl Query {
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    /// Human readable dump for logs. Never executed.
    pub fn trace(&self) -> String {
        let mut out = self.sql.clone();
        for (name, param) in &self.params {
            let _ = write!(out, "\n  {name} = {param:?}");
        }
        out
    }

    fn bound(&self) -> Vec<(&str, Box<dyn ToSql>)> {
        self.params
            .iter()
            .map(|(name, param)| {
                let value: Box<dyn ToSql> = match param {
                    Param::Value(v) => Box::new(v.clone()),
                    Param::Set(vs) => Box::new(Rc::new(vs.clone())),
                };
                (name.as_str(), value)
            })
            .collect()
    }

    /// Run a statement, returning the number of changed rows.
    pub fn execute(&self, conn: &Connection) -> rusqlite::Result<usize> {
        log::debug!("{} ({} params)", self.sql, self.params.len());
        let owned = self.bound();
        let params: Vec<(&str, &dyn ToSql)> = owned.iter().map(|(n, v)| (*n, v.as_ref())).collect();
        conn.execute(&self.sql, params.as_slice())
    }

    /// Run a query and hand its rows to `f`.
    pub fn read<R>(
        &self,
        conn: &Connection,
        f: impl FnOnce(&mut Rows<'_>) -> rusqlite::Result<R>,
    ) -> rusqlite::Result<R> {
        log::debug!("{} ({} params)", self.sql, self.params.len());
        let owned = self.bound();
        let params: Vec<(&str, &dyn ToSql)> = owned.iter().map(|(n, v)| (*n, v.as_ref())).collect();
        let mut stmt = conn.prepare(&self.sql)?;
        let mut rows = stmt.query(params.as_slice())?;
        f(&mut rows)
    }

    /// Run a single-value integer query such as a count.
    pub fn scalar(&self, conn: &Connection) -> rusqlite::Result<i64> {
        self.read(conn, |rows| match rows.next()? {
            Some(row) => row.get(0),
            None => Err(rusqlite::Error::QueryReturnedNoRows),
        })
    }
}
