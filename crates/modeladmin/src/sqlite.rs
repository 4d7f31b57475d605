//! SQLite engine using `rusqlite`.
//!
//! [`SqliteEngine`] implements [`Engine`] over a single `rusqlite`
//! connection guarded by an async mutex. All statements run inside
//! `tokio::task::spawn_blocking`.
//!
//! Identifiers are always quoted and only attributes declared in the
//! [`ModelMeta`] reach the generated SQL; values are bound as parameters.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use tokio::sync::Mutex;

use modeladmin_core::{AdminError, AdminResult};

use crate::db::{Engine, ListParams, Page, SortDirection};
use crate::model::{object_identifier, FieldDef, FieldType, ModelMeta, Record};

/// A SQLite-backed engine.
#[derive(Debug, Clone)]
pub struct SqliteEngine {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

fn db_err(e: rusqlite::Error) -> AdminError {
    AdminError::Database(e.to_string())
}

impl SqliteEngine {
    /// Opens a database at the given path; `:memory:` opens an in-memory one.
    ///
    /// WAL journaling is enabled for file-based databases.
    pub fn open(path: impl Into<PathBuf>) -> AdminResult<Self> {
        let path = path.into();
        let in_memory = path.to_str() == Some(":memory:");
        let conn = if in_memory {
            Connection::open_in_memory()
        } else {
            Connection::open(&path)
        }
        .map_err(|e| AdminError::Database(format!("SQLite open failed: {e}")))?;

        if !in_memory {
            conn.execute_batch("PRAGMA journal_mode=WAL;")
                .map_err(|e| AdminError::Database(format!("Failed to set pragmas: {e}")))?;
        }
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| AdminError::Database(format!("Failed to set pragmas: {e}")))?;

        tracing::debug!(path = %path.display(), "opened sqlite engine");
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database.
    pub fn memory() -> AdminResult<Self> {
        Self::open(":memory:")
    }

    /// Returns the database file path.
    pub const fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Creates the tables for the given models if they do not exist.
    pub async fn create_all(&self, metas: &[&ModelMeta]) -> AdminResult<()> {
        let statements = metas
            .iter()
            .map(|meta| create_table_sql(meta))
            .collect::<Vec<_>>()
            .join(";\n");
        self.run(move |conn| conn.execute_batch(&statements).map_err(db_err))
            .await
    }

    /// Runs raw SQL, for fixtures and migrations outside the admin.
    pub async fn execute_batch(&self, sql: &str) -> AdminResult<()> {
        let sql = sql.to_string();
        self.run(move |conn| conn.execute_batch(&sql).map_err(db_err))
            .await
    }

    async fn run<T, F>(&self, f: F) -> AdminResult<T>
    where
        F: FnOnce(&Connection) -> AdminResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await
        .map_err(|e| AdminError::Database(format!("Task join error: {e}")))?
    }
}

/// Quotes an SQL identifier.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Builds the `CREATE TABLE IF NOT EXISTS` statement for a model.
pub fn create_table_sql(meta: &ModelMeta) -> String {
    let pks = meta.pk_fields();
    let single_auto_pk = pks.len() == 1 && pks[0].auto_increment;

    let mut columns: Vec<String> = meta
        .fields
        .iter()
        .map(|field| {
            let mut column = format!("{} {}", quote_ident(&field.name), field.field_type.sql_type());
            if field.primary_key && single_auto_pk {
                column.push_str(" PRIMARY KEY AUTOINCREMENT");
            } else if !field.nullable {
                column.push_str(" NOT NULL");
            }
            column
        })
        .collect();

    if !pks.is_empty() && !single_auto_pk {
        let names: Vec<String> = pks.iter().map(|f| quote_ident(&f.name)).collect();
        columns.push(format!("PRIMARY KEY ({})", names.join(", ")));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(&meta.table),
        columns.join(", ")
    )
}

fn select_columns(meta: &ModelMeta) -> String {
    meta.fields
        .iter()
        .map(|f| quote_ident(&f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .map_or_else(|| SqlValue::Real(n.as_f64().unwrap_or_default()), SqlValue::Integer),
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql_value(field: &FieldDef, value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) if field.field_type == FieldType::Boolean => Value::Bool(i != 0),
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn read_row(meta: &ModelMeta, row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
    let mut record = Record::new();
    for (i, field) in meta.fields.iter().enumerate() {
        record.insert(field.name.clone(), from_sql_value(field, row.get_ref(i)?));
    }
    Ok(record)
}

/// Builds the `WHERE` clause and parameters selecting one object by identifier.
fn pk_filter(meta: &ModelMeta, pk: &str) -> AdminResult<(String, Vec<SqlValue>)> {
    let fields = meta.pk_fields();
    let parts: Vec<&str> = if fields.len() == 1 {
        vec![pk]
    } else {
        pk.split(';').collect()
    };
    if fields.is_empty() || parts.len() != fields.len() {
        return Err(AdminError::NotFound(format!(
            "Invalid identifier '{pk}' for '{}'",
            meta.name
        )));
    }

    let mut clauses = Vec::with_capacity(fields.len());
    let mut params = Vec::with_capacity(fields.len());
    for (field, part) in fields.iter().zip(parts) {
        clauses.push(format!("{} = ?", quote_ident(&field.name)));
        let value = match field.field_type {
            FieldType::Integer => part.parse::<i64>().map(SqlValue::Integer).map_err(|_| {
                AdminError::NotFound(format!("Invalid identifier '{pk}' for '{}'", meta.name))
            })?,
            _ => SqlValue::Text(part.to_string()),
        };
        params.push(value);
    }
    Ok((clauses.join(" AND "), params))
}

fn fetch_one(
    conn: &Connection,
    meta: &ModelMeta,
    where_sql: &str,
    params: Vec<SqlValue>,
) -> AdminResult<Option<Record>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {where_sql}",
        select_columns(meta),
        quote_ident(&meta.table)
    );
    conn.query_row(&sql, params_from_iter(params), |row| read_row(meta, row))
        .optional()
        .map_err(db_err)
}

/// Escapes `LIKE` wildcards so a search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Keeps only declared attributes, dropping null auto-generated keys.
fn writable_columns(meta: &ModelMeta, record: &Record) -> Vec<(String, SqlValue)> {
    meta.fields
        .iter()
        .filter_map(|field| {
            let value = record.get(&field.name)?;
            if field.auto_increment && value.is_null() {
                return None;
            }
            Some((quote_ident(&field.name), to_sql_value(value)))
        })
        .collect()
}

#[async_trait]
impl Engine for SqliteEngine {
    async fn list(&self, meta: &ModelMeta, params: &ListParams) -> AdminResult<Page> {
        let meta = meta.clone();
        let params = params.clone();
        self.run(move |conn| {
            let mut where_sql = String::new();
            let mut bind: Vec<SqlValue> = Vec::new();
            if let Some(term) = params.effective_search() {
                let pattern = format!("%{}%", escape_like(term));
                let clauses: Vec<String> = params
                    .search_fields
                    .iter()
                    .filter(|f| meta.has_attribute(f))
                    .map(|f| {
                        bind.push(SqlValue::Text(pattern.clone()));
                        format!("CAST({} AS TEXT) LIKE ? ESCAPE '\\'", quote_ident(f))
                    })
                    .collect();
                if !clauses.is_empty() {
                    where_sql = format!(" WHERE {}", clauses.join(" OR "));
                }
            }

            let table = quote_ident(&meta.table);
            let count: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM {table}{where_sql}"),
                    params_from_iter(bind.iter()),
                    |row| row.get(0),
                )
                .map_err(db_err)?;
            let count = usize::try_from(count).unwrap_or_default();

            let (mut page, offset) = Page::layout(count, params.page, params.page_size);

            let order_sql = params
                .sort_by
                .as_deref()
                .filter(|f| meta.has_attribute(f))
                .map(|f| {
                    let dir = match params.direction {
                        SortDirection::Asc => "ASC",
                        SortDirection::Desc => "DESC",
                    };
                    format!(" ORDER BY {} {dir}", quote_ident(f))
                })
                .unwrap_or_default();

            let sql = format!(
                "SELECT {} FROM {table}{where_sql}{order_sql} LIMIT ? OFFSET ?",
                select_columns(&meta)
            );
            bind.push(SqlValue::Integer(i64::try_from(page.page_size).unwrap_or(i64::MAX)));
            bind.push(SqlValue::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));

            let mut stmt = conn.prepare(&sql).map_err(db_err)?;
            page.rows = stmt
                .query_map(params_from_iter(bind), |row| read_row(&meta, row))
                .map_err(db_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(db_err)?;
            Ok(page)
        })
        .await
    }

    async fn get(&self, meta: &ModelMeta, pk: &str) -> AdminResult<Option<Record>> {
        let (where_sql, params) = pk_filter(meta, pk)?;
        let meta = meta.clone();
        self.run(move |conn| fetch_one(conn, &meta, &where_sql, params))
            .await
    }

    async fn insert(&self, meta: &ModelMeta, record: Record) -> AdminResult<Record> {
        let meta = meta.clone();
        self.run(move |conn| {
            let columns = writable_columns(&meta, &record);
            let table = quote_ident(&meta.table);
            let affected = if columns.is_empty() {
                conn.execute(&format!("INSERT INTO {table} DEFAULT VALUES"), [])
            } else {
                let (names, values): (Vec<String>, Vec<SqlValue>) = columns.into_iter().unzip();
                let placeholders = vec!["?"; names.len()].join(", ");
                conn.execute(
                    &format!(
                        "INSERT INTO {table} ({}) VALUES ({placeholders})",
                        names.join(", ")
                    ),
                    params_from_iter(values),
                )
            }
            .map_err(db_err)?;
            tracing::debug!(table = %meta.table, affected, "inserted row");

            let rowid = conn.last_insert_rowid();
            fetch_one(conn, &meta, "rowid = ?", vec![SqlValue::Integer(rowid)])?.ok_or_else(
                || AdminError::Database(format!("Inserted row vanished from '{}'", meta.table)),
            )
        })
        .await
    }

    async fn update(&self, meta: &ModelMeta, pk: &str, record: Record) -> AdminResult<Record> {
        let (where_sql, mut where_params) = pk_filter(meta, pk)?;
        let new_pk = object_identifier(meta, &record).unwrap_or_else(|_| pk.to_string());
        let (fetch_sql, fetch_params) = pk_filter(meta, &new_pk)?;
        let meta = meta.clone();
        let pk = pk.to_string();
        self.run(move |conn| {
            let columns = writable_columns(&meta, &record);
            if !columns.is_empty() {
                let (names, mut values): (Vec<String>, Vec<SqlValue>) =
                    columns.into_iter().unzip();
                let assignments: Vec<String> =
                    names.iter().map(|name| format!("{name} = ?")).collect();
                values.append(&mut where_params);
                let affected = conn
                    .execute(
                        &format!(
                            "UPDATE {} SET {} WHERE {where_sql}",
                            quote_ident(&meta.table),
                            assignments.join(", ")
                        ),
                        params_from_iter(values),
                    )
                    .map_err(db_err)?;
                if affected == 0 {
                    return Err(AdminError::NotFound(format!(
                        "Object '{pk}' not found in '{}'",
                        meta.table
                    )));
                }
            }
            fetch_one(conn, &meta, &fetch_sql, fetch_params)?.ok_or_else(|| {
                AdminError::NotFound(format!("Object '{pk}' not found in '{}'", meta.table))
            })
        })
        .await
    }

    async fn delete(&self, meta: &ModelMeta, pk: &str) -> AdminResult<bool> {
        let (where_sql, params) = pk_filter(meta, pk)?;
        let table = quote_ident(&meta.table);
        self.run(move |conn| {
            conn.execute(&format!("DELETE FROM {table} WHERE {where_sql}"), params_from_iter(params))
                .map(|affected| affected > 0)
                .map_err(db_err)
        })
        .await
    }
}
