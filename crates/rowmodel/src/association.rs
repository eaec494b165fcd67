//! Associations between tables: how related records are fetched and saved.
//!
//! Targets are registry tags, so tables may refer to each other (or to
//! themselves) without any ordering between their definitions.

use crate::persist::SaveOptions;
use crate::record::Record;
use rowmodel_core::{Result, Value, quote_ident};
use rowmodel_query::{FindParams, link_sql, unlink_all_sql};

/// How one table relates to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Association {
    /// The owner holds the target's primary key in `key`
    BelongsTo { target: String, key: String },
    /// One target row holds the owner's primary key in `key`
    HasOne { target: String, key: String },
    /// Any number of target rows hold the owner's primary key in `key`
    HasMany { target: String, key: String },
    /// Rows of `join_table` pair the owner's key (`local_key`) with the
    /// target's key (`remote_key`)
    ManyToMany {
        target: String,
        join_table: String,
        local_key: String,
        remote_key: String,
    },
}

impl Association {
    pub fn belongs_to(target: impl Into<String>, key: impl Into<String>) -> Self {
        Association::BelongsTo {
            target: target.into(),
            key: key.into(),
        }
    }

    pub fn has_one(target: impl Into<String>, key: impl Into<String>) -> Self {
        Association::HasOne {
            target: target.into(),
            key: key.into(),
        }
    }

    pub fn has_many(target: impl Into<String>, key: impl Into<String>) -> Self {
        Association::HasMany {
            target: target.into(),
            key: key.into(),
        }
    }

    pub fn many_to_many(
        target: impl Into<String>,
        join_table: impl Into<String>,
        local_key: impl Into<String>,
        remote_key: impl Into<String>,
    ) -> Self {
        Association::ManyToMany {
            target: target.into(),
            join_table: join_table.into(),
            local_key: local_key.into(),
            remote_key: remote_key.into(),
        }
    }

    /// Registry tag of the related table.
    pub fn target(&self) -> &str {
        match self {
            Association::BelongsTo { target, .. }
            | Association::HasOne { target, .. }
            | Association::HasMany { target, .. }
            | Association::ManyToMany { target, .. } => target,
        }
    }

    /// Whether at most one record can be attached.
    pub fn is_single(&self) -> bool {
        matches!(
            self,
            Association::BelongsTo { .. } | Association::HasOne { .. }
        )
    }

    /// Whether the related record must be written before its owner.
    pub fn saves_before_owner(&self) -> bool {
        matches!(self, Association::BelongsTo { .. })
    }

    /// Load the related records for `owner`.
    ///
    /// The owner's scope stack is carried over to the target table. An owner
    /// without a key value has nothing related and issues no query.
    pub(crate) fn fetch(&self, owner: &Record) -> Result<Related> {
        let target = owner
            .registry()
            .record(self.target())?
            .with_scopes(owner.scope_stack().clone());

        match self {
            Association::BelongsTo { key, .. } => match owner.field(key) {
                Some(id) if !id.is_null() => Ok(Related::One(target.get(id.clone())?)),
                _ => Ok(Related::Empty),
            },
            Association::HasOne { key, .. } => {
                let Some(id) = owner_id(owner) else {
                    return Ok(Related::Empty);
                };
                let found = target.find_one(FindParams::new().field(key.clone(), id))?;
                Ok(found.map_or(Related::Empty, Related::One))
            }
            Association::HasMany { key, .. } => {
                let Some(id) = owner_id(owner) else {
                    return Ok(Related::Many(Vec::new()));
                };
                Ok(Related::Many(
                    target.find(FindParams::new().field(key.clone(), id))?,
                ))
            }
            Association::ManyToMany {
                join_table,
                local_key,
                remote_key,
                ..
            } => {
                let Some(id) = owner_id(owner) else {
                    return Ok(Related::Many(Vec::new()));
                };
                let shape = target.table().shape();
                let clause = format!(
                    "{} IN (SELECT {} FROM {} WHERE {} = ?)",
                    shape.column(&shape.primary_key),
                    quote_ident(remote_key),
                    quote_ident(join_table),
                    quote_ident(local_key)
                );
                Ok(Related::Many(
                    target.find(FindParams::new().where_sql(clause, vec![id]))?,
                ))
            }
        }
    }

    /// Write the attached records of association `name` for `owner`.
    ///
    /// BelongsTo runs before the owner's own write and copies the parent's
    /// key into the owner; the others run after it and stamp the owner's
    /// key onto each child. Many-to-many links are rebuilt from scratch.
    ///
    /// Returns `Ok(false)` when a related record's own save is refused by
    /// validation; its errors land on the owner under the association's
    /// prefix. A refused parent stops the cascade before its key is copied.
    pub(crate) fn save(
        &self,
        owner: &mut Record,
        name: &str,
        related: &mut Related,
        options: SaveOptions,
    ) -> Result<bool> {
        tracing::trace!(
            table = owner.table().tag(),
            association = name,
            count = related.len(),
            "Cascading save"
        );

        let single = matches!(related, Related::One(_));
        let mut complete = true;
        match self {
            Association::BelongsTo { key, .. } => {
                for (i, parent) in related.as_mut_slice().iter_mut().enumerate() {
                    if !save_nested(parent, owner, &prefix(name, single, i), options)? {
                        return Ok(false);
                    }
                    if let Some(id) = parent.id().filter(|v| !v.is_null()).cloned() {
                        owner.set(key.clone(), id);
                    }
                }
            }
            Association::HasOne { key, .. } | Association::HasMany { key, .. } => {
                let id = owner.id().cloned().unwrap_or(Value::Null);
                for (i, child) in related.as_mut_slice().iter_mut().enumerate() {
                    child.set(key.clone(), id.clone());
                    complete &= save_nested(child, owner, &prefix(name, single, i), options)?;
                }
            }
            Association::ManyToMany {
                join_table,
                local_key,
                remote_key,
                ..
            } => {
                let id = owner.id().cloned().unwrap_or(Value::Null);
                let tag = owner.table().tag().to_string();
                let registry = owner.registry().clone();

                registry.execute(&tag, &unlink_all_sql(join_table, local_key), &[id.clone()])?;
                let link = link_sql(join_table, local_key, remote_key);
                for (i, remote) in related.as_mut_slice().iter_mut().enumerate() {
                    if !save_nested(remote, owner, &prefix(name, single, i), options)? {
                        complete = false;
                        continue;
                    }
                    let remote_id = remote.id().cloned().unwrap_or(Value::Null);
                    registry.execute(&tag, &link, &[id.clone(), remote_id])?;
                }
            }
        }
        Ok(complete)
    }
}

fn owner_id(owner: &Record) -> Option<Value> {
    owner.id().filter(|v| !v.is_null()).cloned()
}

/// Error-key prefix for the `i`-th related record.
fn prefix(name: &str, single: bool, i: usize) -> String {
    if single {
        format!("{name}_")
    } else {
        format!("{name}_{i}_")
    }
}

fn save_nested(
    record: &mut Record,
    owner: &mut Record,
    prefix: &str,
    options: SaveOptions,
) -> Result<bool> {
    if record.save_with(options)? {
        return Ok(true);
    }
    tracing::warn!(
        table = owner.table().tag(),
        related = record.table().tag(),
        errors = %record.errors(),
        "Nested save refused by validation"
    );
    owner.errors.absorb_prefixed(record.errors().clone(), prefix);
    Ok(false)
}

/// The cached result of resolving or attaching an association.
#[derive(Debug, Clone, Default)]
pub enum Related {
    #[default]
    Empty,
    One(Record),
    Many(Vec<Record>),
}

impl Related {
    /// The single record, or the first of many.
    pub fn one(&self) -> Option<&Record> {
        self.as_slice().first()
    }

    pub fn as_slice(&self) -> &[Record] {
        match self {
            Related::Empty => &[],
            Related::One(record) => std::slice::from_ref(record),
            Related::Many(records) => records,
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [Record] {
        match self {
            Related::Empty => &mut [],
            Related::One(record) => std::slice::from_mut(record),
            Related::Many(records) => records,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.as_slice().iter()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn into_vec(self) -> Vec<Record> {
        match self {
            Related::Empty => Vec::new(),
            Related::One(record) => vec![record],
            Related::Many(records) => records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_queries() {
        let manager = Association::belongs_to("people", "manager_id");
        let pets = Association::has_many("pets", "owner_id");
        let groups = Association::many_to_many("groups", "people_groups", "person_id", "group_id");

        assert_eq!(manager.target(), "people");
        assert_eq!(groups.target(), "groups");
        assert!(manager.is_single());
        assert!(Association::has_one("desks", "person_id").is_single());
        assert!(!pets.is_single());
        assert!(manager.saves_before_owner());
        assert!(!pets.saves_before_owner());
        assert!(!groups.saves_before_owner());
    }

    #[test]
    fn test_empty_related() {
        let mut related = Related::default();
        assert!(related.is_empty());
        assert!(related.one().is_none());
        assert!(related.as_mut_slice().is_empty());
        assert!(related.into_vec().is_empty());
    }
}
