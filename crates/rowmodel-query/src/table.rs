//! Static shape of a table as query assembly sees it.

use crate::params::{FindParams, OneOrMany};
use rowmodel_core::{qualified_table, quote_ident};
use std::collections::BTreeMap;

pub const DEFAULT_CREATED_FIELDS: [&str; 3] = ["created", "created_on", "created_at"];
pub const DEFAULT_UPDATED_FIELDS: [&str; 3] = ["updated", "updated_on", "updated_at"];

/// Ordering applied when neither the call nor any scope supplies one.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DefaultOrder {
    #[default]
    None,
    /// Verbatim ORDER BY clause
    OrderBy(String),
    /// Sort fields and directions, sanitized like `sort_fields`
    Sort {
        fields: OneOrMany<String>,
        directions: Option<OneOrMany<String>>,
    },
}

/// Everything statement assembly needs to know about a table apart from its
/// introspected columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TableShape {
    pub name: String,
    pub database: Option<String>,
    pub primary_key: String,
    /// Never written from caller data, except by REPLACE
    pub protected_fields: Vec<String>,
    /// Set to `NOW()` on insert
    pub created_fields: Vec<String>,
    /// Set to `NOW()` on every write
    pub updated_fields: Vec<String>,
    /// Column -> SQL template with one `?`, e.g. `PASSWORD(?)`
    pub wrapper_fields: BTreeMap<String, String>,
    pub scopes: BTreeMap<String, FindParams>,
    pub default_order: DefaultOrder,
}

impl TableShape {
    pub fn new(name: impl Into<String>) -> Self {
        let created: Vec<String> = DEFAULT_CREATED_FIELDS.iter().map(|s| (*s).to_string()).collect();
        let updated: Vec<String> = DEFAULT_UPDATED_FIELDS.iter().map(|s| (*s).to_string()).collect();
        Self {
            name: name.into(),
            database: None,
            primary_key: "id".to_string(),
            protected_fields: created.iter().chain(updated.iter()).cloned().collect(),
            created_fields: created,
            updated_fields: updated,
            wrapper_fields: BTreeMap::new(),
            scopes: BTreeMap::new(),
            default_order: DefaultOrder::None,
        }
    }

    /// Quoted, optionally database-prefixed table name.
    pub fn statement(&self) -> String {
        qualified_table(self.database.as_deref(), &self.name)
    }

    /// A column of this table, qualified the same way as [`statement`](Self::statement).
    pub fn column(&self, field: &str) -> String {
        format!("{}.{}", self.statement(), quote_ident(field))
    }

    pub fn is_protected(&self, field: &str) -> bool {
        self.protected_fields.iter().any(|f| f == field)
    }

    /// Created-style then updated-style field names.
    pub fn timestamp_fields(&self) -> impl Iterator<Item = &str> {
        self.created_fields
            .iter()
            .chain(self.updated_fields.iter())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let shape = TableShape::new("people");
        assert_eq!(shape.primary_key, "id");
        assert!(shape.is_protected("created_at"));
        assert!(shape.is_protected("updated"));
        assert!(!shape.is_protected("name"));
        assert_eq!(shape.timestamp_fields().count(), 6);
    }

    #[test]
    fn test_statement_with_database() {
        let mut shape = TableShape::new("people");
        assert_eq!(shape.column("state"), "`people`.`state`");
        shape.database = Some("crm".into());
        assert_eq!(shape.statement(), "`crm`.`people`");
        assert_eq!(shape.column("state"), "`crm`.`people`.`state`");
    }
}
