//! The generic repository shared by every entity type.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{Row, Rows};

use crate::builder::{ParamNames, Query, SqlBuilder};
use crate::datastore::Database;
use crate::error::OperationError;
use crate::events::{EventSink, ModelAction, ModelEvent, NullSink};
use crate::mapping::{ColumnRef, Entity, Field, column_index, select_list};
use crate::paging::{PagingSpec, SortDirection, Window};

// ── Projections ─────────────────────────────────────────────────────────────

/// How a repository reads its entities: the base query with any joins, the
/// select list, and the reduction of result rows into entities.
pub trait Projection<T>: Send + Sync {
    fn builder(&self) -> SqlBuilder;

    fn columns(&self) -> String;

    fn read(&self, rows: &mut Rows<'_>) -> rusqlite::Result<Vec<T>>;
}

/// One row per entity, no joins.
pub struct FlatProjection<T>(PhantomData<fn() -> T>);

impl<T> Default for FlatProjection<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T: Entity> Projection<T> for FlatProjection<T> {
    fn builder(&self) -> SqlBuilder {
        SqlBuilder::new::<T>()
    }

    fn columns(&self) -> String {
        select_list::<T>()
    }

    fn read(&self, rows: &mut Rows<'_>) -> rusqlite::Result<Vec<T>> {
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(T::from_row(row, 0)?);
        }
        Ok(out)
    }
}

/// Fold joined rows into one entity per base id, in first-seen order.
///
/// The base entity's columns must come first in each row; `merge` picks the
/// joined columns out of every row, including the first.
pub fn reduce_rows<T: Entity>(
    rows: &mut Rows<'_>,
    mut merge: impl FnMut(&mut T, &Row<'_>) -> rusqlite::Result<()>,
) -> rusqlite::Result<Vec<T>> {
    let mut out: Vec<T> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();
    while let Some(row) = rows.next()? {
        let id: i64 = row.get(0)?;
        let pos = match index.get(&id) {
            Some(&pos) => pos,
            None => {
                out.push(T::from_row(row, 0)?);
                index.insert(id, out.len() - 1);
                out.len() - 1
            }
        };
        merge(&mut out[pos], row)?;
    }
    Ok(out)
}

// ── Repository ──────────────────────────────────────────────────────────────

/// CRUD and paged listing for entity `T`.
///
/// Each call checks out its own connection and is its own atomic unit.
pub struct BasicRepository<T> {
    db: Database,
    events: Arc<dyn EventSink>,
    projection: Arc<dyn Projection<T>>,
    paged: Arc<dyn Projection<T>>,
}

impl<T> Clone for BasicRepository<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            events: Arc::clone(&self.events),
            projection: Arc::clone(&self.projection),
            paged: Arc::clone(&self.paged),
        }
    }
}

impl<T: Entity + 'static> BasicRepository<T> {
    pub fn new(db: Database) -> Self {
        let flat: Arc<dyn Projection<T>> = Arc::new(FlatProjection::<T>::default());
        Self {
            db,
            events: Arc::new(NullSink),
            projection: Arc::clone(&flat),
            paged: flat,
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Read through `projection` everywhere, paged listings included.
    pub fn with_projection(mut self, projection: impl Projection<T> + 'static) -> Self {
        let projection: Arc<dyn Projection<T>> = Arc::new(projection);
        self.projection = Arc::clone(&projection);
        self.paged = projection;
        self
    }

    /// Read paged listings through `projection`.
    pub fn with_paged_projection(mut self, projection: impl Projection<T> + 'static) -> Self {
        self.paged = Arc::new(projection);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Base query of the default projection.
    pub fn builder(&self) -> SqlBuilder {
        self.projection.builder()
    }

    /// Base query of the paged projection.
    pub fn paged_builder(&self) -> SqlBuilder {
        self.paged.builder()
    }

    fn publish(&self, id: i64, action: ModelAction) {
        self.events.publish(ModelEvent {
            table: T::TABLE,
            id,
            action,
        });
    }

    // ── Reads ───────────────────────────────────────────────────────────────

    /// Every entity matching `builder`, which must come from [`Self::builder`].
    pub fn query(&self, builder: SqlBuilder) -> Result<Vec<T>, OperationError> {
        let query = builder.select(&self.projection.columns());
        let conn = self.db.connection()?;
        Ok(query.read(&conn, |rows| self.projection.read(rows))?)
    }

    /// Like [`Self::query`], ordered by `sort` and optionally truncated.
    pub fn query_sorted(
        &self,
        builder: SqlBuilder,
        sort: Field<T>,
        direction: SortDirection,
        limit: Option<u32>,
    ) -> Result<Vec<T>, OperationError> {
        let window = limit.map(|limit| Window { limit, offset: 0 });
        let query = builder.select_page(
            &self.projection.columns(),
            Some((sort.column()?, direction)),
            window,
        );
        let conn = self.db.connection()?;
        Ok(query.read(&conn, |rows| self.projection.read(rows))?)
    }

    pub fn find(&self, id: i64) -> Result<Option<T>, OperationError> {
        let builder = self.builder().equal(Field::<T>::id(), id)?;
        Ok(self.query(builder)?.into_iter().next())
    }

    pub fn get(&self, id: i64) -> Result<T, OperationError> {
        self.find(id)?
            .ok_or_else(|| OperationError::not_found(T::TABLE, id))
    }

    /// Entities for `ids`, silently skipping ids that do not exist.
    pub fn get_many(&self, ids: &[i64]) -> Result<Vec<T>, OperationError> {
        let builder = self.builder().in_set(Field::<T>::id(), ids.iter().copied())?;
        self.query(builder)
    }

    pub fn all(&self) -> Result<Vec<T>, OperationError> {
        self.query(self.builder())
    }

    pub fn count(&self) -> Result<u64, OperationError> {
        self.count_where(SqlBuilder::new::<T>())
    }

    pub fn count_where(&self, builder: SqlBuilder) -> Result<u64, OperationError> {
        let conn = self.db.connection()?;
        let count = builder.select_count().scalar(&conn)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    pub fn has_items(&self) -> Result<bool, OperationError> {
        Ok(self.count()? > 0)
    }

    // ── Writes ──────────────────────────────────────────────────────────────

    /// Insert a new entity and return it with its assigned id.
    pub fn insert(&self, mut entity: T) -> Result<T, OperationError> {
        check_new(&entity)?;
        let query = insert_query(&entity)?;
        let id = {
            let conn = self.db.connection()?;
            query.execute(&conn)?;
            conn.last_insert_rowid()
        };
        entity.set_id(id);
        self.publish(id, ModelAction::Created);
        Ok(entity)
    }

    /// Insert several entities in one transaction.
    pub fn insert_many(&self, entities: Vec<T>) -> Result<Vec<T>, OperationError> {
        for entity in &entities {
            check_new(entity)?;
        }
        let inserted = self.db.with_transaction(|tx| {
            let mut out = Vec::with_capacity(entities.len());
            for mut entity in entities {
                insert_query(&entity)?.execute(tx)?;
                entity.set_id(tx.last_insert_rowid());
                out.push(entity);
            }
            Ok(out)
        })?;
        for entity in &inserted {
            self.publish(entity.id(), ModelAction::Created);
        }
        Ok(inserted)
    }

    /// Write every column of a persisted entity.
    pub fn update(&self, entity: &T) -> Result<(), OperationError> {
        let id = check_persisted(entity)?;
        let values = entity.to_values()?;
        let assignments: Vec<(ColumnRef, Value)> = T::COLUMNS[1..]
            .iter()
            .zip(values)
            .map(|(column, value)| {
                (
                    ColumnRef {
                        table: T::TABLE,
                        column: *column,
                    },
                    value,
                )
            })
            .collect();
        self.update_by_id(id, &assignments)?;
        self.publish(id, ModelAction::Updated);
        Ok(())
    }

    /// Insert when the entity has no id yet, otherwise update it.
    pub fn upsert(&self, entity: T) -> Result<T, OperationError> {
        if entity.id() == 0 {
            self.insert(entity)
        } else {
            self.update(&entity)?;
            Ok(entity)
        }
    }

    /// Write only the named attributes of a persisted entity. Other columns
    /// keep whatever the store currently holds.
    pub fn set_fields(&self, entity: &T, fields: &[Field<T>]) -> Result<(), OperationError> {
        let id = check_persisted(entity)?;
        let values = entity.to_values()?;
        let mut assignments = Vec::with_capacity(fields.len());
        for field in fields {
            let column = field.column()?;
            // The id never changes once assigned.
            let Some(idx) = column_index::<T>(column.column).filter(|&i| i > 0) else {
                continue;
            };
            assignments.push((column, values[idx - 1].clone()));
        }
        if assignments.is_empty() {
            return Ok(());
        }
        self.update_by_id(id, &assignments)?;
        self.publish(id, ModelAction::Updated);
        Ok(())
    }

    /// Assign values on every row matching `builder`. Publishes no events.
    pub fn set_fields_where(
        &self,
        builder: SqlBuilder,
        assignments: &[(Field<T>, Value)],
    ) -> Result<usize, OperationError> {
        let mut columns = Vec::with_capacity(assignments.len());
        for (field, value) in assignments {
            columns.push((field.column()?, value.clone()));
        }
        let query = builder.update(&columns)?;
        let conn = self.db.connection()?;
        Ok(query.execute(&conn)?)
    }

    fn update_by_id(&self, id: i64, assignments: &[(ColumnRef, Value)]) -> Result<(), OperationError> {
        let query = SqlBuilder::new::<T>()
            .equal(Field::<T>::id(), id)?
            .update(assignments)?;
        let conn = self.db.connection()?;
        if query.execute(&conn)? == 0 {
            return Err(OperationError::not_found(T::TABLE, id));
        }
        Ok(())
    }

    /// Delete one entity. Returns whether it existed.
    pub fn delete(&self, id: i64) -> Result<bool, OperationError> {
        let query = SqlBuilder::new::<T>().equal(Field::<T>::id(), id)?.delete()?;
        let removed = {
            let conn = self.db.connection()?;
            query.execute(&conn)? > 0
        };
        if removed {
            self.publish(id, ModelAction::Deleted);
        }
        Ok(removed)
    }

    /// Bulk delete by id. Publishes no events.
    pub fn delete_many(&self, ids: &[i64]) -> Result<usize, OperationError> {
        self.delete_where(SqlBuilder::new::<T>().in_set(Field::<T>::id(), ids.iter().copied())?)
    }

    /// Delete every row matching a join-free builder. Publishes no events.
    pub fn delete_where(&self, builder: SqlBuilder) -> Result<usize, OperationError> {
        let query = builder.delete()?;
        let conn = self.db.connection()?;
        Ok(query.execute(&conn)?)
    }

    /// Delete every row of the table.
    pub fn purge(&self) -> Result<usize, OperationError> {
        self.delete_where(SqlBuilder::new::<T>())
    }

    // ── Paging ──────────────────────────────────────────────────────────────

    /// Fill one page of `spec` using the paged projection.
    pub fn list(&self, spec: PagingSpec<T>) -> Result<PagingSpec<T>, OperationError> {
        self.list_with(spec, self.paged.builder())
    }

    /// Fill one page of `spec`, starting from `base`, which must come from
    /// [`Self::paged_builder`].
    ///
    /// The row query and the count query are rendered separately from the
    /// same conditions. They run back to back on one connection but not in
    /// one snapshot, so a concurrent write can leave the count stale.
    pub fn list_with(
        &self,
        mut spec: PagingSpec<T>,
        base: SqlBuilder,
    ) -> Result<PagingSpec<T>, OperationError> {
        let mut builder = base;
        for filter in &spec.filters {
            builder = builder.and_where(filter.clone())?;
        }
        let order = match &spec.sort_key {
            Some(key) => Some((builder.resolve_sort_key(key)?, spec.sort_direction)),
            None => None,
        };
        let page = builder.select_page(&self.paged.columns(), order, spec.window());
        let count = builder.select_count();

        let conn = self.db.connection()?;
        spec.records = page.read(&conn, |rows| self.paged.read(rows))?;
        spec.total_records = u64::try_from(count.scalar(&conn)?).unwrap_or(0);
        Ok(spec)
    }
}

fn check_new<T: Entity>(entity: &T) -> Result<(), OperationError> {
    if entity.id() != 0 {
        return Err(OperationError::AlreadyPersisted {
            entity_type: T::TABLE.to_string(),
            id: entity.id(),
        });
    }
    Ok(())
}

fn check_persisted<T: Entity>(entity: &T) -> Result<i64, OperationError> {
    match entity.id() {
        0 => Err(OperationError::NotPersisted {
            entity_type: T::TABLE.to_string(),
        }),
        id => Ok(id),
    }
}

fn insert_query<T: Entity>(entity: &T) -> rusqlite::Result<Query> {
    let mut names = ParamNames::new();
    let placeholders: Vec<String> = entity
        .to_values()?
        .into_iter()
        .map(|value| names.bind(value))
        .collect();
    let columns: Vec<String> = T::COLUMNS[1..].iter().map(|c| format!("\"{c}\"")).collect();
    let sql = format!(
        "INSERT INTO \"{}\" ({}) VALUES ({})",
        T::TABLE,
        columns.join(", "),
        placeholders.join(", ")
    );
    Ok(names.finish(sql))
}

