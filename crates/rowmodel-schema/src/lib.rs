//! Schema introspection for rowmodel.
//!
//! Tables are described through [`Connection::describe`](rowmodel_core::Connection::describe)
//! on first use and the resulting [`FieldMap`](rowmodel_core::FieldMap) is
//! cached by [`SchemaCache`].

pub mod introspect;

pub use introspect::{SchemaCache, describe_table, field_from_describe_row};
pub use rowmodel_core::{FieldMap, FieldMeta, ParsedSqlType};
