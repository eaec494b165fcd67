//! Core types and traits for rowmodel.
//!
//! This crate provides the foundations the other rowmodel crates build on:
//!
//! - `Value` and `Row` for dynamically-typed field data and result tuples
//! - `FieldMeta`/`FieldMap` for introspected column metadata
//! - the `Error` taxonomy and keyed `ValidationError`s
//! - the blocking `Connection` trait and the lazily-connected `Store`

pub mod connection;
pub mod error;
pub mod field;
pub mod identifiers;
pub mod row;
pub mod value;

pub use connection::{Connection, ConnectionConfig, LAST_INSERT_ID_SQL, Store};
pub use error::{
    AssociationError, ConfigError, Error, FieldValidationError, QueryError, RecordNotFoundError,
    Result, ScopeError, TypeError, ValidationError, ValidationErrorKind,
};
pub use field::{FieldMap, FieldMeta, ParsedSqlType};
pub use identifiers::{qualified_table, quote_ident};
pub use row::{ColumnInfo, FromValue, Row};
pub use value::Value;
