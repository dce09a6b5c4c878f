//! Paging, sorting and filtering for listing operations.

use rusqlite::types::Value;

use crate::builder::Condition;
use crate::error::BuildError;
use crate::mapping::{Entity, Field};

/// Requested ordering of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Whatever the store returns for an ascending sort.
    #[default]
    Default,
    Ascending,
    Descending,
}

impl SortDirection {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Self::Descending => "DESC",
            Self::Default | Self::Ascending => "ASC",
        }
    }
}

/// LIMIT/OFFSET window of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u32,
    pub offset: u64,
}

/// One page request and, once a repository has run it, its result.
///
/// Filters accumulate conjunctively. After `list` returns,
/// `total_records >= records.len()` and `records.len() <= page_size` unless
/// the page size is [`PagingSpec::UNBOUNDED`].
#[derive(Debug, Clone)]
pub struct PagingSpec<T> {
    /// 1-based page number; 0 is read as 1.
    pub page: u32,
    pub page_size: u32,
    /// Column name, or `table.column` for a joined table.
    pub sort_key: Option<String>,
    pub sort_direction: SortDirection,
    pub filters: Vec<Condition>,
    pub total_records: u64,
    pub records: Vec<T>,
}

impl<T> Default for PagingSpec<T> {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PAGE_SIZE)
    }
}

impl<T> PagingSpec<T> {
    /// Page size sentinel meaning "every matching record".
    pub const UNBOUNDED: u32 = 0;

    pub const DEFAULT_PAGE_SIZE: u32 = 10;

    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            sort_key: None,
            sort_direction: SortDirection::Default,
            filters: Vec::new(),
            total_records: 0,
            records: Vec::new(),
        }
    }

    /// A spec returning everything in one page.
    pub fn unbounded() -> Self {
        Self::new(1, Self::UNBOUNDED)
    }

    pub fn sorted_by(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_key = Some(key.into());
        self.sort_direction = direction;
        self
    }

    pub fn with_filter(mut self, condition: Condition) -> Self {
        self.filters.push(condition);
        self
    }

    /// Add an equality filter on a field of the listed entity.
    pub fn filter_equal(self, field: Field<T>, value: impl Into<Value>) -> Result<Self, BuildError>
    where
        T: Entity,
    {
        Ok(self.with_filter(Condition::equal(field, value)?))
    }

    /// Add a set-membership filter on a field of the listed entity.
    pub fn filter_in<V: Into<Value>>(
        self,
        field: Field<T>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self, BuildError>
    where
        T: Entity,
    {
        Ok(self.with_filter(Condition::in_set(field, values)?))
    }

    pub fn is_unbounded(&self) -> bool {
        self.page_size == Self::UNBOUNDED
    }

    pub fn window(&self) -> Option<Window> {
        if self.is_unbounded() {
            return None;
        }
        let page = u64::from(self.page.max(1));
        Some(Window {
            limit: self.page_size,
            offset: (page - 1) * u64::from(self.page_size),
        })
    }

    /// Number of pages needed for `total_records`.
    pub fn total_pages(&self) -> u64 {
        if self.is_unbounded() {
            return u64::from(self.total_records > 0);
        }
        self.total_records.div_ceil(u64::from(self.page_size))
    }
}
