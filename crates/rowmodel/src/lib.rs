//! rowmodel - active-record style row mapping over MySQL-dialect stores.
//!
//! A table is described once with a [`TableDef`] (scopes, associations,
//! hooks, timestamp columns) and registered under a tag in a [`Registry`].
//! Records are plain field maps with typed accessors; any record also acts
//! as a handle on its table for finds, counts and bulk writes.
//!
//! # Quick Start
//!
//! ```ignore
//! use rowmodel::prelude::*;
//!
//! let store = Store::install_global(Store::new(ConnectionConfig::from_env(), connect))?;
//! let registry = Registry::builder(store)
//!     .table(
//!         TableDef::builder("people")
//!             .scope("active", FindParams::new().field("status", "active"))
//!             .has_many("pets", "pets", "owner_id")
//!             .build(),
//!     )
//!     .table(TableDef::builder("pets").build())
//!     .build()?;
//!
//! let people = registry.record("people")?;
//! let in_la = people.scope("active").find(FindParams::new().field("state", "LA"))?;
//!
//! let mut scott = registry.record_from("people", [("name", "Scott")])?;
//! scott.attach("pets", registry.record_from("pets", [("name", "Rex")])?)?;
//! scott.save()?;
//! ```
//!
//! # Crates
//!
//! - `rowmodel-core`: values, rows, errors, the `Connection` trait and `Store`
//! - `rowmodel-schema`: column introspection and caching
//! - `rowmodel-query`: find parameters, scopes and statement assembly

pub mod association;
pub mod hooks;
pub mod persist;
pub mod record;
pub mod registry;
pub mod table;

pub use association::{Association, Related};
pub use hooks::{AfterFetch, BeforeSave, Validate};
pub use persist::SaveOptions;
pub use record::{Record, RecordState};
pub use registry::{Registry, RegistryBuilder};
pub use table::{DEFAULT_RECURSE, TableDef, TableDefBuilder};

pub use rowmodel_core::{
    AssociationError, ConfigError, Connection, ConnectionConfig, Error, FieldMap, FieldMeta,
    FromValue, QueryError, RecordNotFoundError, Result, Row, ScopeError, Store, TypeError,
    ValidationError, Value,
};
pub use rowmodel_query::{FindParams, OneOrMany, PageRequest, ScopeRule, WriteKind};
pub use rowmodel_schema::{ParsedSqlType, SchemaCache};

/// Everything needed to define tables and work with records.
///
/// ```ignore
/// use rowmodel::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Association, Connection, ConnectionConfig, Error, FindParams, PageRequest, Record,
        RecordState, Registry, Related, Result, Row, SaveOptions, Store, TableDef,
        ValidationError, Value, WriteKind,
    };
}
