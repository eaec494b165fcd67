//! Registry of mapped tables.
//!
//! The registry owns every [`TableDef`], the shared [`Store`] and the
//! per-table column cache. Records are created through it by tag, which is
//! also how associations find the table on the other side.

use crate::record::Record;
use crate::table::TableDef;
use rowmodel_core::{
    AssociationError, ConfigError, Error, FieldMap, LAST_INSERT_ID_SQL, QueryError, Result, Row,
    Store, Value,
};
use rowmodel_schema::SchemaCache;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Tag-addressed table definitions over one store.
pub struct Registry {
    store: Arc<Store>,
    tables: HashMap<String, Arc<TableDef>>,
    schema: SchemaCache,
}

impl Registry {
    pub fn builder(store: Arc<Store>) -> RegistryBuilder {
        RegistryBuilder {
            store,
            tables: Vec::new(),
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn schema(&self) -> &SchemaCache {
        &self.schema
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// The definition registered under `tag`.
    pub fn table(&self, tag: &str) -> Result<Arc<TableDef>> {
        self.tables.get(tag).cloned().ok_or_else(|| {
            Error::Association(AssociationError {
                table: tag.to_string(),
                name: String::new(),
                message: format!("no table registered under tag '{tag}'"),
            })
        })
    }

    /// An empty, new record of table `tag`.
    pub fn record(self: &Arc<Self>, tag: &str) -> Result<Record> {
        Ok(Record::new(Arc::clone(self), self.table(tag)?, BTreeMap::new()))
    }

    /// A new record of table `tag` holding `fields`.
    pub fn record_from<I, K, V>(self: &Arc<Self>, tag: &str, fields: I) -> Result<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Ok(Record::new(Arc::clone(self), self.table(tag)?, fields))
    }

    /// Columns of `table`, introspected on first use.
    pub fn fields(&self, table: &TableDef) -> Result<Arc<FieldMap>> {
        let statement = table.shape().statement();
        if let Some(fields) = self.schema.cached(&statement) {
            return Ok(fields);
        }
        let conn = self.store.connection()?;
        self.schema.fields(&*conn, &statement)
    }

    /// Submit one statement on behalf of table `tag`.
    ///
    /// Every failure surfaces as [`Error::Query`] carrying the statement.
    pub fn execute(&self, tag: &str, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        tracing::debug!(table = tag, sql = sql, params = ?params, "Executing statement");
        let conn = self.store.connection()?;
        conn.query(sql, params).map_err(|e| into_query_error(e, sql))
    }

    /// The key generated by the last INSERT on behalf of table `tag`.
    ///
    /// Logged and error-wrapped like [`execute`](Self::execute).
    pub fn last_insert_id(&self, tag: &str) -> Result<Value> {
        tracing::debug!(table = tag, sql = LAST_INSERT_ID_SQL, "Executing statement");
        let conn = self.store.connection()?;
        conn.last_insert_id().map_err(|e| into_query_error(e, LAST_INSERT_ID_SQL))
    }
}

fn into_query_error(error: Error, sql: &str) -> Error {
    match error {
        Error::Query(mut e) => {
            if e.sql.is_none() {
                e.sql = Some(sql.to_string());
            }
            Error::Query(e)
        }
        other => Error::Query(QueryError {
            sql: Some(sql.to_string()),
            message: other.to_string(),
            source: Some(Box::new(other)),
        }),
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("store", &self.store)
            .field("tables", &self.tags())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Registry`].
#[must_use]
pub struct RegistryBuilder {
    store: Arc<Store>,
    tables: Vec<TableDef>,
}

impl RegistryBuilder {
    pub fn table(mut self, table: TableDef) -> Self {
        self.tables.push(table);
        self
    }

    /// Finish the registry.
    ///
    /// Tables without a database fall back to the store's default database.
    /// Fails on a duplicate tag or an association whose target tag is not
    /// registered.
    pub fn build(self) -> Result<Arc<Registry>> {
        let default_database = self.store.database().map(str::to_string);
        let mut tables: HashMap<String, Arc<TableDef>> = HashMap::with_capacity(self.tables.len());

        for mut table in self.tables {
            if table.shape.database.is_none() {
                table.shape.database.clone_from(&default_database);
            }
            if tables.contains_key(&table.tag) {
                return Err(Error::Config(ConfigError::new(format!(
                    "table tag '{}' registered twice",
                    table.tag
                ))));
            }
            tables.insert(table.tag.clone(), Arc::new(table));
        }

        for table in tables.values() {
            for (name, association) in table.associations() {
                if !tables.contains_key(association.target()) {
                    return Err(Error::Association(AssociationError {
                        table: table.tag().to_string(),
                        name: name.to_string(),
                        message: format!("unknown target tag '{}'", association.target()),
                    }));
                }
            }
        }

        tracing::debug!(tables = tables.len(), "Registry built");
        Ok(Arc::new(Registry {
            store: self.store,
            tables,
            schema: SchemaCache::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmodel_core::{Connection, ConnectionConfig};

    struct Refusing;

    impl Connection for Refusing {
        fn query(&self, _sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
            Err(Error::Custom("server has gone away".into()))
        }
    }

    fn store(database: Option<&str>) -> Arc<Store> {
        let mut config = ConnectionConfig::new("mysql://localhost/test");
        if let Some(db) = database {
            config = config.database(db);
        }
        Arc::new(Store::with_shared_connection(Arc::new(Refusing), config))
    }

    #[test]
    fn test_unknown_tag() {
        let registry = Registry::builder(store(None))
            .table(TableDef::builder("people").build())
            .build()
            .unwrap();
        assert_eq!(registry.tags(), vec!["people"]);
        match registry.record("ghosts") {
            Err(Error::Association(e)) => assert_eq!(e.table, "ghosts"),
            other => panic!("expected association error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_database_applied() {
        let registry = Registry::builder(store(Some("crm")))
            .table(TableDef::builder("people").build())
            .table(TableDef::builder("pets").database("zoo").build())
            .build()
            .unwrap();
        assert_eq!(registry.table("people").unwrap().shape().statement(), "`crm`.`people`");
        assert_eq!(registry.table("pets").unwrap().shape().statement(), "`zoo`.`pets`");
    }

    #[test]
    fn test_build_rejects_bad_definitions() {
        let duplicate = Registry::builder(store(None))
            .table(TableDef::builder("people").build())
            .table(TableDef::builder("people").build())
            .build();
        assert!(matches!(duplicate, Err(Error::Config(_))));

        let dangling = Registry::builder(store(None))
            .table(TableDef::builder("people").has_many("pets", "pets", "owner_id").build())
            .build();
        match dangling {
            Err(Error::Association(e)) => {
                assert_eq!(e.table, "people");
                assert_eq!(e.name, "pets");
            }
            other => panic!("expected association error, got {other:?}"),
        }
    }

    #[test]
    fn test_execute_wraps_failures() {
        let registry = Registry::builder(store(None)).build().unwrap();
        let err = registry.execute("people", "SELECT 1", &[]).unwrap_err();
        assert!(matches!(err, Error::Query(_)));
        assert_eq!(err.sql(), Some("SELECT 1"));
    }

    #[test]
    fn test_last_insert_id_wraps_failures() {
        let registry = Registry::builder(store(None)).build().unwrap();
        let err = registry.last_insert_id("people").unwrap_err();
        assert!(matches!(err, Error::Query(_)));
        assert_eq!(err.sql(), Some(LAST_INSERT_ID_SQL));
    }
}
