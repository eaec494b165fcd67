//! Records: one row of a mapped table plus the table-level operations
//! reachable from it.
//!
//! Any record doubles as a handle on its table. `find`, `get`, `delete`
//! and friends run against the table, filtered by whatever scope rules the
//! record carries; field access and `save` act on the row itself.

use crate::association::{Association, Related};
use crate::registry::Registry;
use crate::table::TableDef;
use rowmodel_core::{
    AssociationError, Error, FromValue, QueryError, RecordNotFoundError, Result, Row,
    ValidationError, Value, quote_ident,
};
use rowmodel_query::{
    FindParams, ScopeRule, ScopeStack, WriteKind, WriteStatement, delete_sql, truncate_sql,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Where a record stands relative to its stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Never written
    New,
    /// Written before, changed since
    Modified,
    /// Matches what was last written or fetched
    Saved,
}

/// One row of a mapped table.
#[derive(Clone)]
pub struct Record {
    pub(crate) registry: Arc<Registry>,
    pub(crate) table: Arc<TableDef>,
    pub(crate) fields: Arc<BTreeMap<String, Value>>,
    pub(crate) saved: bool,
    pub(crate) is_new: bool,
    pub(crate) scopes: ScopeStack,
    pub(crate) related: HashMap<String, Related>,
    pub(crate) errors: ValidationError,
}

impl Record {
    pub(crate) fn new(
        registry: Arc<Registry>,
        table: Arc<TableDef>,
        fields: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            registry,
            table,
            fields: Arc::new(fields),
            saved: false,
            is_new: true,
            scopes: ScopeStack::new(),
            related: HashMap::new(),
            errors: ValidationError::new(),
        }
    }

    pub(crate) fn with_scopes(mut self, scopes: ScopeStack) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn table(&self) -> &TableDef {
        &self.table
    }

    pub fn scope_stack(&self) -> &ScopeStack {
        &self.scopes
    }

    // ------------------------------------------------------------------
    // Field access
    // ------------------------------------------------------------------

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Typed field access; a missing field reads as NULL.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self.fields.get(name).unwrap_or(&Value::Null);
        T::from_value(value).map_err(|e| match e {
            Error::Type(mut te) => {
                te.column = Some(name.to_string());
                Error::Type(te)
            }
            e => e,
        })
    }

    /// Assign a field and mark the record unsaved.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        Arc::make_mut(&mut self.fields).insert(name.into(), value.into());
        self.saved = false;
    }

    /// Remove a field, returning its value.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        let removed = Arc::make_mut(&mut self.fields).remove(name);
        if removed.is_some() {
            self.saved = false;
        }
        removed
    }

    /// Assign several fields at once.
    pub fn merge<I, K, V>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let map = Arc::make_mut(&mut self.fields);
        for (k, v) in fields {
            map.insert(k.into(), v.into());
        }
        self.saved = false;
    }

    /// Primary key value, when present.
    pub fn id(&self) -> Option<&Value> {
        self.fields.get(self.table.primary_key())
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn to_map(&self) -> BTreeMap<String, Value> {
        (*self.fields).clone()
    }

    /// The field map as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn state(&self) -> RecordState {
        if self.is_new {
            RecordState::New
        } else if self.saved {
            RecordState::Saved
        } else {
            RecordState::Modified
        }
    }

    /// Errors recorded by the last refused save.
    pub fn errors(&self) -> &ValidationError {
        &self.errors
    }

    // ------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------

    /// A copy of this record filtered by one more rule.
    ///
    /// The copy shares field data with `self`, starts with an empty
    /// association cache and leaves `self` untouched. Later scopes take
    /// precedence for `limit` and `callback`.
    #[must_use]
    pub fn scope(&self, rule: impl Into<ScopeRule>) -> Record {
        Record {
            registry: Arc::clone(&self.registry),
            table: Arc::clone(&self.table),
            fields: Arc::clone(&self.fields),
            saved: self.saved,
            is_new: self.is_new,
            scopes: self.scopes.push(rule),
            related: HashMap::new(),
            errors: self.errors.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Build a fetched record from `row`, running the after-fetch hook when
    /// asked to and the table has one.
    pub fn instantiate(&self, row: Row, run_hook: bool) -> Record {
        let mut record = Record::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.table),
            row.into_pairs().collect(),
        );
        record.is_new = false;

        if run_hook {
            if let Some(hook) = self.table.after_fetch.clone() {
                hook.after_fetch(&mut record);
            }
        }
        record.saved = true;
        record
    }

    /// Fetch the rows matching `params` under this record's scopes.
    #[tracing::instrument(level = "debug", skip(self, params), fields(table = %self.table.tag()))]
    pub fn find(&self, params: FindParams) -> Result<Vec<Record>> {
        let fields = self.registry.fields(&self.table)?;
        let (sql, condensed) = self.scopes.resolve(&params, self.table.shape(), &fields)?;
        let rows = self.registry.execute(self.table.tag(), &sql, &condensed.params)?;

        let run_hook = condensed.runs_callback();
        let limit = if params.first { 1 } else { rows.len() };
        let records: Vec<Record> = rows
            .into_iter()
            .take(limit)
            .map(|row| self.instantiate(row, run_hook))
            .collect();
        tracing::debug!(count = records.len(), "Fetched records");
        Ok(records)
    }

    /// The first row matching `params`, if any.
    pub fn find_one(&self, params: FindParams) -> Result<Option<Record>> {
        Ok(self.find(params.first())?.into_iter().next())
    }

    /// The row whose primary key is `id`.
    pub fn get(&self, id: impl Into<Value>) -> Result<Record> {
        let id = id.into();
        let params = FindParams::new().field(self.table.primary_key(), id.clone());
        self.find_one(params)?.ok_or_else(|| {
            Error::RecordNotFound(RecordNotFoundError {
                table: self.table.name().to_string(),
                id: id.to_string(),
            })
        })
    }

    /// Number of rows matching an optional WHERE clause under this
    /// record's scopes.
    pub fn row_count(&self, where_clause: Option<&str>, params: Vec<Value>) -> Result<u64> {
        let fields = self.registry.fields(&self.table)?;
        let (sql, params) =
            self.scopes
                .resolve_count(where_clause, params, self.table.shape(), &fields)?;
        let rows = self.registry.execute(self.table.tag(), &sql, &params)?;
        rows.first()
            .and_then(|row| row.get_by_name("count"))
            .and_then(Value::as_i64)
            .map(|n| u64::try_from(n).unwrap_or(0))
            .ok_or_else(|| Error::Query(QueryError::new("count query returned no count").with_sql(sql)))
    }

    pub fn exists(&self, id: impl Into<Value>) -> Result<bool> {
        let clause = format!("{} = ?", self.primary_key_column());
        Ok(self.row_count(Some(&clause), vec![id.into()])? > 0)
    }

    /// Refetch this record's row, discarding unsaved changes and the
    /// association cache.
    pub fn reload(&mut self) -> Result<()> {
        let id = self.id().filter(|v| !v.is_null()).cloned().ok_or_else(|| {
            Error::RecordNotFound(RecordNotFoundError {
                table: self.table.name().to_string(),
                id: Value::Null.to_string(),
            })
        })?;
        let fresh = self.get(id)?;
        self.fields = fresh.fields;
        self.saved = true;
        self.is_new = false;
        self.related.clear();
        Ok(())
    }

    /// Run a raw statement and return its rows.
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.registry.execute(self.table.tag(), sql, params)
    }

    // ------------------------------------------------------------------
    // Table-level writes (no validation, no cascades)
    // ------------------------------------------------------------------

    pub fn delete(&self, id: impl Into<Value>) -> Result<()> {
        let clause = format!("{} = ?", self.primary_key_column());
        self.delete_all_by_sql(Some(&clause), vec![id.into()])
    }

    pub fn delete_all_by_sql(&self, where_clause: Option<&str>, params: Vec<Value>) -> Result<()> {
        let sql = delete_sql(&self.table.shape().statement(), where_clause);
        self.registry.execute(self.table.tag(), &sql, &params)?;
        Ok(())
    }

    pub fn truncate(&self) -> Result<()> {
        let sql = truncate_sql(&self.table.shape().statement());
        self.registry.execute(self.table.tag(), &sql, &[])?;
        Ok(())
    }

    /// Update the row `id` with the table's columns found in `data`.
    pub fn update<I, K, V>(&self, data: I, id: impl Into<Value>) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let clause = format!("{} = ?", self.primary_key_column());
        self.update_all_by_sql(data, Some(&clause), vec![id.into()])
    }

    /// Update every row matching `where_clause` (all rows when `None`).
    pub fn update_all_by_sql<I, K, V>(
        &self,
        data: I,
        where_clause: Option<&str>,
        params: Vec<Value>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let data = collect_data(data);
        let statement = self
            .write_statement(WriteKind::Update, &data)?
            .map(|stmt| match where_clause {
                Some(clause) => stmt.filter(clause, params),
                None => stmt,
            });
        self.submit(statement)
    }

    /// Write a full row with REPLACE INTO; protected fields are accepted.
    pub fn replace<I, K, V>(&self, data: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let data = collect_data(data);
        let statement = self.write_statement(WriteKind::Replace, &data)?;
        self.submit(statement)
    }

    pub(crate) fn write_statement(
        &self,
        kind: WriteKind,
        data: &BTreeMap<String, Value>,
    ) -> Result<Option<WriteStatement>> {
        let fields = self.registry.fields(&self.table)?;
        Ok(WriteStatement::for_data(kind, data, self.table.shape(), &fields))
    }

    pub(crate) fn submit(&self, statement: Option<WriteStatement>) -> Result<()> {
        let Some(statement) = statement else {
            tracing::trace!(table = self.table.tag(), "Nothing to write");
            return Ok(());
        };
        let (sql, params) = statement.build();
        self.registry.execute(self.table.tag(), &sql, &params)?;
        Ok(())
    }

    pub(crate) fn primary_key_column(&self) -> String {
        quote_ident(self.table.primary_key())
    }

    // ------------------------------------------------------------------
    // Associations
    // ------------------------------------------------------------------

    /// The records related through association `name`, fetched on first
    /// access and cached on this record.
    pub fn related(&mut self, name: &str) -> Result<&Related> {
        if !self.related.contains_key(name) {
            let association = self.association(name)?.clone();
            let related = association.fetch(self)?;
            self.related.insert(name.to_string(), related);
        }
        self.related
            .get(name)
            .ok_or_else(|| self.association_error(name, "association cache is empty"))
    }

    /// The cached records of association `name`, without fetching.
    pub fn related_cached(&self, name: &str) -> Option<&Related> {
        self.related.get(name)
    }

    pub fn related_cached_mut(&mut self, name: &str) -> Option<&mut Related> {
        self.related.get_mut(name)
    }

    /// Attach one record to association `name`, replacing what was cached.
    pub fn attach(&mut self, name: &str, record: Record) -> Result<()> {
        let association = self.association(name)?;
        if record.table.tag() != association.target() {
            return Err(self.association_error(
                name,
                &format!(
                    "expected a '{}' record, got '{}'",
                    association.target(),
                    record.table.tag()
                ),
            ));
        }
        let related = if association.is_single() {
            Related::One(record)
        } else {
            Related::Many(vec![record])
        };
        self.related.insert(name.to_string(), related);
        Ok(())
    }

    /// Attach a list of records to a to-many association `name`.
    pub fn attach_many(&mut self, name: &str, records: Vec<Record>) -> Result<()> {
        let association = self.association(name)?;
        if association.is_single() {
            return Err(self.association_error(name, "cannot attach many records to a single association"));
        }
        if let Some(stray) = records.iter().find(|r| r.table.tag() != association.target()) {
            return Err(self.association_error(
                name,
                &format!(
                    "expected '{}' records, got '{}'",
                    association.target(),
                    stray.table.tag()
                ),
            ));
        }
        self.related.insert(name.to_string(), Related::Many(records));
        Ok(())
    }

    /// Drop the cached records of association `name`.
    pub fn detach(&mut self, name: &str) -> Option<Related> {
        self.related.remove(name)
    }

    fn association(&self, name: &str) -> Result<&Association> {
        self.table
            .association(name)
            .ok_or_else(|| self.association_error(name, "no such association"))
    }

    fn association_error(&self, name: &str, message: &str) -> Error {
        Error::Association(AssociationError {
            table: self.table.tag().to_string(),
            name: name.to_string(),
            message: message.to_string(),
        })
    }
}

fn collect_data<I, K, V>(data: I) -> BTreeMap<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    data.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.table.tag())
            .field("fields", &self.fields)
            .field("state", &self.state())
            .field("scopes", &self.scopes)
            .field("related", &self.related)
            .finish_non_exhaustive()
    }
}
