//! INSERT / UPDATE / REPLACE / DELETE / TRUNCATE assembly.

use crate::table::TableShape;
use rowmodel_core::{FieldMap, Value, quote_ident};
use std::collections::BTreeMap;

/// The kind of row write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Insert,
    Update,
    /// Full-row replacement by primary key; protected fields are accepted
    Replace,
}

impl WriteKind {
    pub const fn as_sql(self) -> &'static str {
        match self {
            WriteKind::Insert => "INSERT INTO",
            WriteKind::Update => "UPDATE",
            WriteKind::Replace => "REPLACE INTO",
        }
    }
}

/// Right-hand side of one `SET` assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    /// `` `col` = ? ``
    Bind(Value),
    /// `` `col` = NOW() ``
    Now,
    /// `` `col` = TEMPLATE(?) ``, the template holding one placeholder
    Wrapped { template: String, value: Value },
    /// `` `col` = DEFAULT ``
    Default,
}

/// A single-table write built from `SET` assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteStatement {
    pub kind: WriteKind,
    pub table: String,
    pub assignments: Vec<(String, Assignment)>,
    pub where_clause: Option<String>,
    pub where_params: Vec<Value>,
}

impl WriteStatement {
    /// Assemble the write for `data` against `shape`.
    ///
    /// Only columns the table has are written. Protected columns are
    /// skipped unless replacing, UPDATE never sets the primary key, and
    /// timestamp columns the caller did not supply get `NOW()` (created-style
    /// ones only when not updating). Returns `None` when there is nothing
    /// to assign, except that an INSERT then writes the primary key's
    /// default.
    pub fn for_data(
        kind: WriteKind,
        data: &BTreeMap<String, Value>,
        shape: &TableShape,
        fields: &FieldMap,
    ) -> Option<Self> {
        let mut assignments: Vec<(String, Assignment)> = Vec::new();

        for (field, value) in data {
            if !fields.contains(field) {
                continue;
            }
            if kind == WriteKind::Update && *field == shape.primary_key {
                continue;
            }
            if let Some(template) = shape.wrapper_fields.get(field) {
                assignments.push((
                    field.clone(),
                    Assignment::Wrapped {
                        template: template.clone(),
                        value: value.clone(),
                    },
                ));
            } else if kind == WriteKind::Replace || !shape.is_protected(field) {
                assignments.push((field.clone(), Assignment::Bind(value.clone())));
            }
        }

        let created = shape
            .created_fields
            .iter()
            .filter(|_| kind != WriteKind::Update);
        for field in created.chain(shape.updated_fields.iter()) {
            if fields.contains(field) && !assignments.iter().any(|(f, _)| f == field) {
                assignments.push((field.clone(), Assignment::Now));
            }
        }

        if assignments.is_empty() {
            if kind != WriteKind::Insert {
                return None;
            }
            assignments.push((shape.primary_key.clone(), Assignment::Default));
        }

        Some(Self {
            kind,
            table: shape.statement(),
            assignments,
            where_clause: None,
            where_params: Vec::new(),
        })
    }

    /// Restrict the write with a WHERE clause (UPDATE only).
    #[must_use]
    pub fn filter(mut self, clause: impl Into<String>, params: Vec<Value>) -> Self {
        self.where_clause = Some(clause.into());
        self.where_params = params;
        self
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|(f, _)| f.as_str())
    }

    /// Build the SQL and parameters.
    pub fn build(&self) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let pairs: Vec<String> = self
            .assignments
            .iter()
            .map(|(field, assignment)| {
                let column = quote_ident(field);
                match assignment {
                    Assignment::Bind(value) => {
                        params.push(value.clone());
                        format!("{column} = ?")
                    }
                    Assignment::Now => format!("{column} = NOW()"),
                    Assignment::Wrapped { template, value } => {
                        params.push(value.clone());
                        format!("{column} = {template}")
                    }
                    Assignment::Default => format!("{column} = DEFAULT"),
                }
            })
            .collect();

        let mut sql = format!("{} {} SET {}", self.kind.as_sql(), self.table, pairs.join(", "));
        if self.kind == WriteKind::Update {
            if let Some(clause) = &self.where_clause {
                sql.push_str("\nWHERE ");
                sql.push_str(clause);
                params.extend(self.where_params.iter().cloned());
            }
        }
        (sql, params)
    }
}

/// `DELETE FROM table [WHERE ...]`.
pub fn delete_sql(table_statement: &str, where_clause: Option<&str>) -> String {
    match where_clause {
        Some(clause) => format!("DELETE FROM {table_statement} WHERE {clause}"),
        None => format!("DELETE FROM {table_statement}"),
    }
}

/// `TRUNCATE table`.
pub fn truncate_sql(table_statement: &str) -> String {
    format!("TRUNCATE {table_statement}")
}

/// Unlink every remote row from one owner in a join table.
pub fn unlink_all_sql(join_table: &str, local_key: &str) -> String {
    format!(
        "DELETE FROM {} WHERE {} = ?",
        quote_ident(join_table),
        quote_ident(local_key)
    )
}

/// Link an owner to one remote row in a join table.
pub fn link_sql(join_table: &str, local_key: &str, remote_key: &str) -> String {
    format!(
        "REPLACE INTO {} SET {} = ?, {} = ?",
        quote_ident(join_table),
        quote_ident(local_key),
        quote_ident(remote_key)
    )
}
