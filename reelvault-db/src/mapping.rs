//! Entity-to-table mapping.
//!
//! Every persisted type registers its table name and column list through the
//! [`Entity`] trait. Predicates reference columns through typed [`Field`]
//! constants, which are checked against that registry when a condition is
//! built, so a misspelled column never reaches SQLite.

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, NaiveDateTime, Utc};
use reelvault_catalog::QualityModel;
use rusqlite::Row;
use rusqlite::types::{Type, Value};

use crate::error::BuildError;

/// A type persisted as one row of one table.
pub trait Entity: Sized {
    /// Table name.
    const TABLE: &'static str;

    /// Column names. `id` comes first, followed by the persisted attributes
    /// in the order produced by [`Entity::to_values`].
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Build an entity from `COLUMNS.len()` columns starting at `offset`.
    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self>;

    /// Values for `COLUMNS[1..]`, in order.
    fn to_values(&self) -> rusqlite::Result<Vec<Value>>;
}

/// Position of `column` within `T::COLUMNS`.
pub fn column_index<T: Entity>(column: &str) -> Option<usize> {
    T::COLUMNS.iter().position(|c| *c == column)
}

/// A fully qualified column reference. Both parts always come from an
/// [`Entity`] registration, never from caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: &'static str,
    pub column: &'static str,
}

impl ColumnRef {
    /// Resolve `column` against a registered column list.
    pub fn resolve(
        table: &'static str,
        columns: &'static [&'static str],
        column: &str,
    ) -> Option<ColumnRef> {
        columns
            .iter()
            .find(|c| **c == column)
            .map(|c| ColumnRef { table, column: *c })
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\".\"{}\"", self.table, self.column)
    }
}

// ── Field Selectors ─────────────────────────────────────────────────────────

/// A typed reference to one attribute of entity `T`.
pub struct Field<T> {
    name: &'static str,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

impl<T: Entity> Field<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _entity: PhantomData,
        }
    }

    /// The identity column of `T`.
    pub const fn id() -> Self {
        Self::new("id")
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Resolve to a column reference, failing if `T` does not map the field.
    pub fn column(&self) -> Result<ColumnRef, BuildError> {
        ColumnRef::resolve(T::TABLE, T::COLUMNS, self.name).ok_or(BuildError::UnmappedField {
            table: T::TABLE,
            field: self.name,
        })
    }
}

/// Comma separated, qualified select list for every column of `T`.
pub fn select_list<T: Entity>() -> String {
    T::COLUMNS
        .iter()
        .map(|c| format!("\"{}\".\"{}\"", T::TABLE, c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read an entity from a LEFT JOIN, returning `None` when its id is NULL.
pub fn from_row_opt<T: Entity>(row: &Row<'_>, offset: usize) -> rusqlite::Result<Option<T>> {
    match row.get::<_, Option<i64>>(offset)? {
        Some(_) => T::from_row(row, offset).map(Some),
        None => Ok(None),
    }
}

// ── Value Helpers ───────────────────────────────────────────────────────────

/// Fixed-width UTC layout; lexical order equals chronological order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn timestamp_value(dt: &DateTime<Utc>) -> Value {
    Value::Text(dt.format(TIMESTAMP_FORMAT).to_string())
}

pub fn opt_timestamp_value(dt: Option<&DateTime<Utc>>) -> Value {
    dt.map(timestamp_value).unwrap_or(Value::Null)
}

pub fn text_value(s: &str) -> Value {
    Value::Text(s.to_string())
}

pub fn opt_text_value(s: Option<&str>) -> Value {
    s.map(text_value).unwrap_or(Value::Null)
}

pub fn read_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_timestamp(&text, idx)
}

pub fn read_opt_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(text) => parse_timestamp(&text, idx).map(Some),
        None => Ok(None),
    }
}

fn parse_timestamp(text: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_PARSE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Serialize a quality for storage.
pub fn quality_value(quality: Option<&QualityModel>) -> rusqlite::Result<Value> {
    match quality {
        Some(q) => q
            .to_blob()
            .map(Value::Text)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e))),
        None => Ok(Value::Null),
    }
}

/// Read a stored quality blob.
///
/// A blob that does not decode is logged and read as `None` so one damaged
/// row cannot fail a whole listing.
pub fn read_quality(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<QualityModel>> {
    let Some(blob) = row.get::<_, Option<String>>(idx)? else {
        return Ok(None);
    };
    match QualityModel::from_blob(&blob) {
        Ok(quality) => Ok(Some(quality)),
        Err(e) => {
            log::warn!("Ignoring unreadable quality in column {}: {}", idx, e);
            Ok(None)
        }
    }
}

/// Serialize any JSON-able document for a text column.
pub fn json_value<S: serde::Serialize>(doc: &S) -> rusqlite::Result<Value> {
    serde_json::to_string(doc)
        .map(Value::Text)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub fn read_json<D: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<D> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
