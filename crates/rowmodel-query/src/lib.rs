//! Query construction for rowmodel.
//!
//! `rowmodel-query` turns the caller-facing find-parameter dictionary into
//! parameterized MySQL-dialect SQL.
//!
//! # Role In The Architecture
//!
//! - **Condensing**: [`condense`] reduces [`FindParams`] to canonical clause slots.
//! - **Scopes**: [`ScopeStack`] chains literal or named rules and folds them
//!   with [`merge`], outer rules taking precedence for `limit`/`callback`.
//! - **Writes**: [`WriteStatement`] assembles `INSERT`/`UPDATE`/`REPLACE ... SET`.
//!
//! Statements execute through the `Connection` trait from `rowmodel-core`.
//! Most users reach these types through the `rowmodel` facade crate.

pub mod condense;
pub mod merge;
pub mod page;
pub mod params;
pub mod scope;
pub mod table;
pub mod write;

pub use condense::{Condensed, DEFAULT_PER_PAGE, condense, default_order_by, default_select};
pub use merge::merge;
pub use page::PageRequest;
pub use params::{FindParams, OneOrMany};
pub use scope::{ScopeRule, ScopeStack};
pub use table::{DEFAULT_CREATED_FIELDS, DEFAULT_UPDATED_FIELDS, DefaultOrder, TableShape};
pub use write::{
    Assignment, WriteKind, WriteStatement, delete_sql, link_sql, truncate_sql, unlink_all_sql,
};
