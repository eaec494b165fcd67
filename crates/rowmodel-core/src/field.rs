//! Column metadata as reported by the store.

use std::collections::HashMap;

/// Parsed SQL type with extracted metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSqlType {
    /// Base type name (e.g., VARCHAR, INTEGER, DECIMAL)
    pub base_type: String,
    /// Length for character types (e.g., VARCHAR(255) -> 255)
    pub length: Option<u32>,
    /// Precision for numeric types (e.g., DECIMAL(10,2) -> 10)
    pub precision: Option<u32>,
    /// Scale for numeric types (e.g., DECIMAL(10,2) -> 2)
    pub scale: Option<u32>,
    /// Whether the type is unsigned
    pub unsigned: bool,
}

impl ParsedSqlType {
    /// Parse a SQL type string into structured metadata.
    ///
    /// # Examples
    /// - `varchar(255)` -> base_type: "VARCHAR", length: 255
    /// - `decimal(10,2)` -> base_type: "DECIMAL", precision: 10, scale: 2
    /// - `int(10) unsigned` -> base_type: "INT", length: 10, unsigned: true
    pub fn parse(type_str: &str) -> Self {
        let upper = type_str.trim().to_uppercase();

        // DESCRIBE may also report ZEROFILL after UNSIGNED
        let upper = upper.trim_end_matches(" ZEROFILL");
        let (type_str, unsigned) = match upper.strip_suffix(" UNSIGNED") {
            Some(rest) => (rest.trim_end(), true),
            None => (upper, false),
        };

        let mut parsed = Self {
            base_type: type_str.to_string(),
            unsigned,
            ..Self::default()
        };

        let Some(paren_start) = type_str.find('(') else {
            return parsed;
        };
        parsed.base_type = type_str[..paren_start].trim().to_string();
        let params = type_str[paren_start + 1..].trim_end_matches(')');

        // ENUM('a','b') and SET(...) carry values, not sizes
        if matches!(parsed.base_type.as_str(), "ENUM" | "SET") {
            return parsed;
        }

        if let Some((precision, scale)) = params.split_once(',') {
            parsed.precision = precision.trim().parse().ok();
            parsed.scale = scale.trim().parse().ok();
        } else {
            parsed.length = params.trim().parse().ok();
        }
        parsed
    }

    /// Check if this is a text/string type.
    pub fn is_text(&self) -> bool {
        matches!(
            self.base_type.as_str(),
            "VARCHAR" | "CHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET"
        )
    }

    /// Check if this is a numeric type.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.base_type.as_str(),
            "INT"
                | "INTEGER"
                | "BIGINT"
                | "SMALLINT"
                | "TINYINT"
                | "MEDIUMINT"
                | "DECIMAL"
                | "NUMERIC"
                | "FLOAT"
                | "DOUBLE"
                | "REAL"
        )
    }

    /// Check if this is a date/time type.
    pub fn is_datetime(&self) -> bool {
        matches!(
            self.base_type.as_str(),
            "DATE" | "TIME" | "DATETIME" | "TIMESTAMP" | "YEAR"
        )
    }
}

/// Metadata about one column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Column name
    pub name: String,
    /// Type exactly as the store reported it (e.g. `varchar(64)`)
    pub sql_type: String,
    pub parsed_type: ParsedSqlType,
    pub nullable: bool,
    /// Key flag (`PRI`, `UNI`, `MUL` or empty)
    pub key: String,
    /// Default value expression, `None` for no default
    pub default: Option<String>,
    /// Extra attributes (`auto_increment`, `on update CURRENT_TIMESTAMP`)
    pub extra: String,
}

impl FieldMeta {
    /// Create metadata for a column with the given reported type.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        let sql_type = sql_type.into();
        Self {
            name: name.into(),
            parsed_type: ParsedSqlType::parse(&sql_type),
            sql_type,
            nullable: true,
            key: String::new(),
            default: None,
            extra: String::new(),
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn default_value(mut self, default: Option<String>) -> Self {
        self.default = default;
        self
    }

    pub fn extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.key.eq_ignore_ascii_case("PRI")
    }

    pub fn is_auto_increment(&self) -> bool {
        self.extra.to_ascii_lowercase().contains("auto_increment")
    }
}

/// Ordered set of a table's columns, addressable by name.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    fields: Vec<FieldMeta>,
    index: HashMap<String, usize>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column. A column that is already present is replaced in place.
    pub fn insert(&mut self, meta: FieldMeta) {
        match self.index.get(&meta.name) {
            Some(&i) => self.fields[i] = meta,
            None => {
                self.index.insert(meta.name.clone(), self.fields.len());
                self.fields.push(meta);
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldMeta> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldMeta> {
        self.fields.iter()
    }

    /// The column the store reports as the primary key, if exactly one.
    pub fn primary_key(&self) -> Option<&FieldMeta> {
        let mut keys = self.fields.iter().filter(|f| f.is_primary_key());
        match (keys.next(), keys.next()) {
            (Some(pk), None) => Some(pk),
            _ => None,
        }
    }
}

impl FromIterator<FieldMeta> for FieldMap {
    fn from_iter<I: IntoIterator<Item = FieldMeta>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for meta in iter {
            map.insert(meta);
        }
        map
    }
}
