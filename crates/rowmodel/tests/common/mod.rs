//! Shared fixtures: a recording in-memory connection and a small schema of
//! people, desks, pets and groups.

#![allow(dead_code)]

use rowmodel::prelude::*;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Answers `DESCRIBE` from a fixed column list, plays back scripted result
/// sets for SELECTs in order, and records every other statement.
pub struct MockDb {
    tables: HashMap<String, Vec<(&'static str, &'static str)>>,
    results: Mutex<VecDeque<Vec<Row>>>,
    log: Mutex<Vec<(String, Vec<Value>)>>,
    next_id: AtomicI64,
}

impl MockDb {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            results: Mutex::new(VecDeque::new()),
            log: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(100),
        }
    }

    /// Declare a table by its quoted name, e.g. `` `people` ``.
    pub fn with_table(mut self, table: &str, columns: Vec<(&'static str, &'static str)>) -> Self {
        self.tables.insert(table.to_string(), columns);
        self
    }

    /// Queue the rows the next SELECT returns.
    pub fn script(&self, rows: Vec<Row>) {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(rows);
    }

    pub fn log(&self) -> Vec<(String, Vec<Value>)> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.log().into_iter().map(|(sql, _)| sql).collect()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Connection for MockDb {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((sql.to_string(), params.to_vec()));
        if sql.starts_with("SELECT") {
            let next = self
                .results
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            return Ok(next.unwrap_or_default());
        }
        Ok(Vec::new())
    }

    fn last_insert_id(&self) -> Result<Value> {
        Ok(Value::BigInt(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    fn describe(&self, table: &str) -> Result<Vec<Row>> {
        let columns = self
            .tables
            .get(table)
            .ok_or_else(|| Error::Custom(format!("Table '{table}' doesn't exist")))?;
        Ok(columns
            .iter()
            .map(|(name, sql_type)| {
                let key = if *name == "id" { "PRI" } else { "" };
                let extra = if *name == "id" { "auto_increment" } else { "" };
                Row::from_pairs([
                    ("Field", Value::from(*name)),
                    ("Type", Value::from(*sql_type)),
                    ("Null", Value::from(if *name == "id" { "NO" } else { "YES" })),
                    ("Key", Value::from(key)),
                    ("Default", Value::Null),
                    ("Extra", Value::from(extra)),
                ])
            })
            .collect())
    }
}

pub fn row(pairs: &[(&str, Value)]) -> Row {
    Row::from_pairs(pairs.iter().map(|(k, v)| (*k, v.clone())))
}

fn require_name(record: &Record, _kind: WriteKind) -> ValidationError {
    let mut errors = ValidationError::new();
    let named = record
        .field("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.is_empty());
    if !named {
        errors.add_required("name");
    }
    errors
}

/// People with a manager, a desk, pets and groups, over a fresh [`MockDb`].
pub fn people_registry() -> (Arc<MockDb>, Arc<Registry>) {
    let db = Arc::new(
        MockDb::new()
            .with_table(
                "`people`",
                vec![
                    ("id", "int(10) unsigned"),
                    ("name", "varchar(64)"),
                    ("state", "char(2)"),
                    ("status", "enum('active','retired')"),
                    ("manager_id", "int(10) unsigned"),
                ],
            )
            .with_table(
                "`pets`",
                vec![
                    ("id", "int(10) unsigned"),
                    ("name", "varchar(64)"),
                    ("owner_id", "int(10) unsigned"),
                    ("updated_at", "datetime"),
                ],
            )
            .with_table(
                "`desks`",
                vec![
                    ("id", "int(10) unsigned"),
                    ("label", "varchar(16)"),
                    ("person_id", "int(10) unsigned"),
                ],
            )
            .with_table("`groups`", vec![("id", "int(10) unsigned"), ("name", "varchar(64)")]),
    );

    let store = Store::with_shared_connection(
        db.clone(),
        ConnectionConfig::new("mysql://localhost/test"),
    );

    let registry = Registry::builder(Arc::new(store))
        .table(
            TableDef::builder("people")
                .scope("active", FindParams::new().field("status", "active"))
                .belongs_to("manager", "people", "manager_id")
                .has_one("desk", "desks", "person_id")
                .has_many("pets", "pets", "owner_id")
                .many_to_many("groups", "groups", "people_groups", "person_id", "group_id")
                .validate(require_name)
                .build(),
        )
        .table(TableDef::builder("pets").validate(require_name).build())
        .table(TableDef::builder("desks").build())
        .table(TableDef::builder("groups").build())
        .build()
        .expect("registry builds");

    (db, registry)
}
