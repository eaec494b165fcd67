//! Per-table lifecycle hooks.
//!
//! A table opts into a hook by handing an implementation to its
//! [`TableDefBuilder`](crate::TableDefBuilder); tables without one skip the
//! step entirely. Closures with the matching signature implement each trait.

use crate::record::Record;
use rowmodel_core::ValidationError;
use rowmodel_query::WriteKind;

/// Field-level validation run before a save.
pub trait Validate: Send + Sync {
    /// Inspect `record` about to be written as `kind` and report problems.
    fn validate(&self, record: &Record, kind: WriteKind) -> ValidationError;
}

/// Adjust a record right after it is built from a fetched row.
pub trait AfterFetch: Send + Sync {
    fn after_fetch(&self, record: &mut Record);
}

/// Adjust a record right before its own INSERT or UPDATE.
pub trait BeforeSave: Send + Sync {
    fn before_save(&self, record: &mut Record);
}

impl<F> Validate for F
where
    F: Fn(&Record, WriteKind) -> ValidationError + Send + Sync,
{
    fn validate(&self, record: &Record, kind: WriteKind) -> ValidationError {
        self(record, kind)
    }
}

impl<F> AfterFetch for F
where
    F: Fn(&mut Record) + Send + Sync,
{
    fn after_fetch(&self, record: &mut Record) {
        self(record);
    }
}

impl<F> BeforeSave for F
where
    F: Fn(&mut Record) + Send + Sync,
{
    fn before_save(&self, record: &mut Record) {
        self(record);
    }
}
