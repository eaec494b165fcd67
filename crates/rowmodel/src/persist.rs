//! Validation and cascading saves.
//!
//! A save walks the association graph in a fixed order: belongs-to parents
//! first (their keys land in the owner), then the owner's own row, then
//! has-one, has-many and many-to-many children. Each level down spends one
//! unit of the recurse budget.

use crate::association::Related;
use crate::record::Record;
use rowmodel_core::{Result, ValidationError, Value};
use rowmodel_query::WriteKind;
use std::sync::Arc;

/// How far and how carefully [`Record::save_with`] goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Association depth to cascade into; `None` uses the table default
    pub recurse: Option<u32>,
    /// Run validation before writing anything
    pub validate: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            recurse: None,
            validate: true,
        }
    }
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn recurse(mut self, depth: u32) -> Self {
        self.recurse = Some(depth);
        self
    }

    #[must_use]
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

impl Record {
    /// Run this record's own validation hook.
    pub fn validate(&self) -> ValidationError {
        let kind = if self.is_new {
            WriteKind::Insert
        } else {
            WriteKind::Update
        };
        match self.table.validate.as_ref() {
            Some(hook) => hook.validate(self, kind),
            None => ValidationError::new(),
        }
    }

    /// Validate this record and, `depth` levels down, every cached
    /// association.
    ///
    /// Keys from a single related record are prefixed `{name}_`, keys from
    /// the i-th record of a list `{name}_{i}_`.
    #[tracing::instrument(level = "debug", skip(self), fields(table = %self.table.tag()))]
    pub fn validate_recursive(&self, depth: u32) -> ValidationError {
        let mut errors = self.validate();
        if depth == 0 {
            return errors;
        }

        for (name, _) in self.table.associations() {
            match self.related.get(name) {
                None | Some(Related::Empty) => {}
                Some(Related::One(record)) => {
                    errors.absorb_prefixed(record.validate_recursive(depth - 1), &format!("{name}_"));
                }
                Some(Related::Many(records)) => {
                    for (i, record) in records.iter().enumerate() {
                        errors.absorb_prefixed(
                            record.validate_recursive(depth - 1),
                            &format!("{name}_{i}_"),
                        );
                    }
                }
            }
        }
        errors
    }

    /// Save with default options.
    pub fn save(&mut self) -> Result<bool> {
        self.save_with(SaveOptions::default())
    }

    /// Validate, then write this record and its cached associations.
    ///
    /// Returns `Ok(false)` without touching the store when validation
    /// fails; the errors are kept on the record. A related record whose own
    /// save is refused also yields `Ok(false)`: a refused parent leaves this
    /// record unwritten, a refused child is reported after this record's
    /// row is written. Store failures propagate.
    #[tracing::instrument(level = "debug", skip(self, options), fields(table = %self.table.tag()))]
    pub fn save_with(&mut self, options: SaveOptions) -> Result<bool> {
        let recurse = options.recurse.unwrap_or(self.table.default_recurse);

        if options.validate {
            let errors = self.validate_recursive(recurse);
            if !errors.is_empty() {
                tracing::debug!(errors = %errors, "Save refused by validation");
                self.errors = errors;
                return Ok(false);
            }
        }
        self.errors = ValidationError::new();

        let nested = SaveOptions {
            recurse: Some(recurse.saturating_sub(1)),
            validate: options.validate,
        };
        if recurse > 0 && !self.save_associations(true, nested)? {
            return Ok(false);
        }
        if !self.saved {
            self.write_row()?;
        }
        if recurse > 0 && !self.save_associations(false, nested)? {
            return Ok(false);
        }
        Ok(true)
    }

    /// Cascade into the cached associations on one side of the owner's
    /// write. `Ok(false)` if any related save was refused.
    fn save_associations(&mut self, before_owner: bool, options: SaveOptions) -> Result<bool> {
        let table = Arc::clone(&self.table);
        let mut complete = true;
        for (name, association) in table.associations() {
            if association.saves_before_owner() != before_owner {
                continue;
            }
            let Some(mut related) = self.related.remove(name) else {
                continue;
            };
            let outcome = association.save(self, name, &mut related, options);
            self.related.insert(name.to_string(), related);
            complete &= outcome?;
        }
        Ok(complete)
    }

    /// INSERT a new record or UPDATE an existing one by primary key.
    fn write_row(&mut self) -> Result<()> {
        let kind = if self.is_new {
            WriteKind::Insert
        } else {
            WriteKind::Update
        };

        let table = Arc::clone(&self.table);
        if let Some(hook) = table.before_save.as_ref() {
            hook.before_save(self);
        }

        let id = self.id().filter(|v| !v.is_null()).cloned();
        let mut statement = self.write_statement(kind, &self.fields)?;
        if kind == WriteKind::Update {
            let clause = format!("{} = ?", self.primary_key_column());
            let key = id.clone().unwrap_or(Value::Null);
            statement = statement.map(|stmt| stmt.filter(clause, vec![key]));
        }
        self.submit(statement)?;

        if kind == WriteKind::Insert && id.is_none() {
            let generated = self.registry.last_insert_id(table.tag())?;
            tracing::trace!(table = table.tag(), id = %generated, "Read back generated key");
            Arc::make_mut(&mut self.fields).insert(table.primary_key().to_string(), generated);
        }

        self.saved = true;
        self.is_new = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_options() {
        let defaults = SaveOptions::default();
        assert_eq!(defaults.recurse, None);
        assert!(defaults.validate);

        let custom = SaveOptions::new().recurse(3).validate(false);
        assert_eq!(custom.recurse, Some(3));
        assert!(!custom.validate);
    }
}
