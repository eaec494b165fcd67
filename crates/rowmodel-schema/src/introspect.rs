//! Table introspection.
//!
//! Column metadata comes from the connection's `DESCRIBE` facility and is
//! cached per qualified table name until explicitly invalidated.

use rowmodel_core::{ConfigError, Connection, Error, FieldMap, FieldMeta, Result, Row};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Build column metadata from one `DESCRIBE` row.
///
/// Returns `None` when the row lacks a `Field` or `Type` column.
pub fn field_from_describe_row(row: &Row) -> Option<FieldMeta> {
    let name = row.get_named::<String>("Field").ok()?;
    let sql_type = row.get_named::<String>("Type").ok()?;
    let null = row.get_named::<String>("Null").unwrap_or_default();
    let key = row.get_named::<String>("Key").unwrap_or_default();
    let default = row.get_named::<Option<String>>("Default").ok().flatten();
    let extra = row.get_named::<String>("Extra").unwrap_or_default();

    Some(
        FieldMeta::new(name, sql_type)
            .nullable(null.eq_ignore_ascii_case("YES"))
            .key(key)
            .default_value(default)
            .extra(extra),
    )
}

/// Describe a table and collect its columns in table order.
///
/// `table` is the quoted, optionally database-prefixed table name. Any
/// failure, including a table with no columns, is a configuration error.
#[tracing::instrument(level = "debug", skip(conn))]
pub fn describe_table(conn: &dyn Connection, table: &str) -> Result<FieldMap> {
    let rows = conn.describe(table).map_err(|e| {
        Error::Config(ConfigError {
            message: format!("could not introspect {table}: {e}"),
            source: Some(Box::new(e)),
        })
    })?;

    let fields: FieldMap = rows.iter().filter_map(field_from_describe_row).collect();
    if fields.is_empty() {
        return Err(ConfigError::new(format!("could not introspect {table}: no columns reported")).into());
    }
    tracing::debug!(table, columns = fields.len(), "Introspected table");
    Ok(fields)
}

/// Memoized column metadata, keyed by qualified table name.
#[derive(Debug, Default)]
pub struct SchemaCache {
    tables: RwLock<HashMap<String, Arc<FieldMap>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns of `table`, describing it on first use.
    pub fn fields(&self, conn: &dyn Connection, table: &str) -> Result<Arc<FieldMap>> {
        if let Some(fields) = self.cached(table) {
            return Ok(fields);
        }
        let fields = Arc::new(describe_table(conn, table)?);
        let mut tables = self
            .tables
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // Another caller may have described the table meanwhile; first wins.
        Ok(Arc::clone(
            tables.entry(table.to_string()).or_insert(fields),
        ))
    }

    /// Columns of `table` if already known.
    pub fn cached(&self, table: &str) -> Option<Arc<FieldMap>> {
        self.tables
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(table)
            .cloned()
    }

    /// Seed the cache, bypassing introspection.
    pub fn insert(&self, table: impl Into<String>, fields: FieldMap) {
        self.tables
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(table.into(), Arc::new(fields));
    }

    /// Forget one table so the next lookup describes it again.
    pub fn invalidate(&self, table: &str) -> bool {
        self.tables
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(table)
            .is_some()
    }

    pub fn clear(&self) {
        self.tables
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }
}
