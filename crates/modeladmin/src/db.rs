//! Admin database engines.
//!
//! The [`Engine`] trait is the persistence handle the admin site is given.
//! It works with [`Record`]s rather than typed models, because the admin is
//! generic over every registered model; the [`ModelMeta`] passed with each
//! call tells the engine which table, primary key, and columns to use.
//!
//! [`InMemoryEngine`] keeps everything in process and is what the tests and
//! demos use when no database is configured. The SQLite engine lives in
//! [`crate::sqlite`].
//!
//! # Example
//!
//! ```
//! use modeladmin::db::{InMemoryEngine, ListParams};
//!
//! let engine = InMemoryEngine::new();
//! let params = ListParams::new().page_size(25).search("ann", vec!["name".to_string()]);
//! assert_eq!(params.page_size, 25);
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use modeladmin_core::{AdminError, AdminResult};

use crate::model::{value_to_string, ModelMeta, Record};

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

/// Parameters for a list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// The page number (1-indexed).
    pub page: usize,
    /// The number of rows per page.
    pub page_size: usize,
    /// Optional search term.
    pub search: Option<String>,
    /// Fields the search term is matched against.
    pub search_fields: Vec<String>,
    /// Optional field to sort by.
    pub sort_by: Option<String>,
    /// Direction for `sort_by`.
    pub direction: SortDirection,
}

impl Default for ListParams {
    fn default() -> Self {
        Self::new()
    }
}

impl ListParams {
    /// Creates list parameters for the first page of 10 rows.
    pub const fn new() -> Self {
        Self {
            page: 1,
            page_size: 10,
            search: None,
            search_fields: Vec::new(),
            sort_by: None,
            direction: SortDirection::Asc,
        }
    }

    /// Sets the page number.
    #[must_use]
    pub const fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the search term and the fields it applies to.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>, fields: Vec<String>) -> Self {
        self.search = Some(term.into());
        self.search_fields = fields;
        self
    }

    /// Sets the sort field and direction.
    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = Some(field.into());
        self.direction = direction;
        self
    }

    /// Returns the search term if it is non-empty and there is something to search.
    pub fn effective_search(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !self.search_fields.is_empty())
    }
}

/// One page of list results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// The rows on this page.
    pub rows: Vec<Record>,
    /// Total number of matching rows (across all pages).
    pub count: usize,
    /// The current page number (1-indexed).
    pub page: usize,
    /// The number of rows per page.
    pub page_size: usize,
    /// Total number of pages, at least 1.
    pub total_pages: usize,
    /// Whether there is a next page.
    pub has_next: bool,
    /// Whether there is a previous page.
    pub has_previous: bool,
}

impl Page {
    /// Computes pagination metadata for `count` rows.
    ///
    /// Returns the page and the offset of its first row. The requested page is
    /// clamped to the available range and a zero page size is treated as 1.
    pub fn layout(count: usize, page: usize, page_size: usize) -> (Self, usize) {
        let page_size = page_size.max(1);
        let total_pages = count.div_ceil(page_size).max(1);
        let page = page.clamp(1, total_pages);
        let offset = (page - 1) * page_size;
        (
            Self {
                rows: Vec::new(),
                count,
                page,
                page_size,
                total_pages,
                has_next: page < total_pages,
                has_previous: page > 1,
            },
            offset,
        )
    }

    /// Paginates a full result set.
    pub fn paginate(all_rows: &[Record], page: usize, page_size: usize) -> Self {
        let (mut result, offset) = Self::layout(all_rows.len(), page, page_size);
        let end = (offset + result.page_size).min(all_rows.len());
        if offset < all_rows.len() {
            result.rows = all_rows[offset..end].to_vec();
        }
        result
    }
}

/// The persistence handle used by the admin site.
///
/// `pk` arguments are object identifiers as produced by
/// [`object_identifier`](crate::model::object_identifier).
#[async_trait]
pub trait Engine: Send + Sync {
    /// Lists rows with pagination, search, and ordering.
    async fn list(&self, meta: &ModelMeta, params: &ListParams) -> AdminResult<Page>;

    /// Fetches a single row by identifier.
    async fn get(&self, meta: &ModelMeta, pk: &str) -> AdminResult<Option<Record>>;

    /// Inserts a row and returns it with generated values filled in.
    async fn insert(&self, meta: &ModelMeta, record: Record) -> AdminResult<Record>;

    /// Updates the row identified by `pk` and returns the stored row.
    async fn update(&self, meta: &ModelMeta, pk: &str, record: Record) -> AdminResult<Record>;

    /// Deletes a row. Returns `true` if it existed.
    async fn delete(&self, meta: &ModelMeta, pk: &str) -> AdminResult<bool>;
}

#[derive(Debug, Clone, Default)]
struct Table {
    rows: Vec<Record>,
    next_id: i64,
}

/// In-memory implementation of [`Engine`].
///
/// Each table is a `Vec<Record>`; integer auto-increment keys start at 1.
/// Cloning shares the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEngine {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl InMemoryEngine {
    /// Creates a new empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of rows in a table.
    pub fn count(&self, table: &str) -> usize {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.get(table).map_or(0, |t| t.rows.len())
    }

    /// Returns every row of a table in insertion order.
    pub fn all_rows(&self, table: &str) -> Vec<Record> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.get(table).map_or_else(Vec::new, |t| t.rows.clone())
    }

    /// Clears every table.
    pub fn clear(&self) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

fn row_identifier(meta: &ModelMeta, row: &Record) -> String {
    meta.pk_fields()
        .iter()
        .map(|f| row.get(&f.name).map(value_to_string).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(";")
}

/// Keeps rows where any search field contains the term (case-insensitive).
fn apply_search(rows: Vec<Record>, fields: &[String], term: &str) -> Vec<Record> {
    let term = term.to_lowercase();
    rows.into_iter()
        .filter(|row| {
            fields.iter().any(|field| {
                row.get(field)
                    .is_some_and(|v| value_to_string(v).to_lowercase().contains(&term))
            })
        })
        .collect()
}

fn apply_ordering(mut rows: Vec<Record>, field: &str, direction: SortDirection) -> Vec<Record> {
    rows.sort_by(|a, b| {
        let cmp = compare_json_values(a.get(field), b.get(field));
        match direction {
            SortDirection::Asc => cmp,
            SortDirection::Desc => cmp.reverse(),
        }
    });
    rows
}

/// Compares two optional JSON values for ordering. Missing and null sort first.
pub(crate) fn compare_json_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
                x.cmp(y)
            } else if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            } else if let (Some(x), Some(y)) = (a.as_bool(), b.as_bool()) {
                x.cmp(&y)
            } else {
                a.to_string().cmp(&b.to_string())
            }
        }
    }
}

#[async_trait]
impl Engine for InMemoryEngine {
    async fn list(&self, meta: &ModelMeta, params: &ListParams) -> AdminResult<Page> {
        let mut rows = self.all_rows(&meta.table);

        if let Some(term) = params.effective_search() {
            rows = apply_search(rows, &params.search_fields, term);
        }
        if let Some(field) = &params.sort_by {
            rows = apply_ordering(rows, field, params.direction);
        }

        Ok(Page::paginate(&rows, params.page, params.page_size))
    }

    async fn get(&self, meta: &ModelMeta, pk: &str) -> AdminResult<Option<Record>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.get(&meta.table).and_then(|table| {
            table
                .rows
                .iter()
                .find(|row| row_identifier(meta, row) == pk)
                .cloned()
        }))
    }

    async fn insert(&self, meta: &ModelMeta, mut record: Record) -> AdminResult<Record> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let table = tables.entry(meta.table.clone()).or_default();

        for field in meta.pk_fields() {
            let missing = record.get(&field.name).is_none_or(Value::is_null);
            if missing && !field.auto_increment {
                return Err(AdminError::BadRequest(format!(
                    "Missing value for primary key '{}' of '{}'",
                    field.name, meta.table
                )));
            }
            if field.auto_increment && missing {
                table.next_id += 1;
                record.insert(field.name.clone(), Value::from(table.next_id));
            } else if let Some(id) = record.get(&field.name).and_then(Value::as_i64) {
                table.next_id = table.next_id.max(id);
            }
        }

        let pk = row_identifier(meta, &record);
        if table.rows.iter().any(|row| row_identifier(meta, row) == pk) {
            return Err(AdminError::Database(format!(
                "Duplicate primary key '{pk}' in '{}'",
                meta.table
            )));
        }

        table.rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, meta: &ModelMeta, pk: &str, record: Record) -> AdminResult<Record> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let row = tables
            .get_mut(&meta.table)
            .and_then(|table| {
                table
                    .rows
                    .iter_mut()
                    .find(|row| row_identifier(meta, row) == pk)
            })
            .ok_or_else(|| {
                AdminError::NotFound(format!("Object '{pk}' not found in '{}'", meta.table))
            })?;

        for (key, value) in record {
            row.insert(key, value);
        }
        Ok(row.clone())
    }

    async fn delete(&self, meta: &ModelMeta, pk: &str) -> AdminResult<bool> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let Some(table) = tables.get_mut(&meta.table) else {
            return Ok(false);
        };
        let before = table.rows.len();
        table.rows.retain(|row| row_identifier(meta, row) != pk);
        Ok(table.rows.len() < before)
    }
}
