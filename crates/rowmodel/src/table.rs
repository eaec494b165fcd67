//! Table definitions and their builder.

use crate::association::Association;
use crate::hooks::{AfterFetch, BeforeSave, Validate};
use rowmodel_query::{DefaultOrder, FindParams, OneOrMany, TableShape};
use std::fmt;
use std::sync::Arc;

/// Default depth for cascading validation and saves.
pub const DEFAULT_RECURSE: u32 = 1;

/// Static definition of one mapped table.
///
/// Built once with [`TableDef::builder`] and handed to a
/// [`Registry`](crate::Registry), which shares it between every record of
/// the table.
#[derive(Clone)]
pub struct TableDef {
    pub(crate) tag: String,
    pub(crate) shape: TableShape,
    pub(crate) associations: Vec<(String, Association)>,
    pub(crate) default_recurse: u32,
    pub(crate) validate: Option<Arc<dyn Validate>>,
    pub(crate) after_fetch: Option<Arc<dyn AfterFetch>>,
    pub(crate) before_save: Option<Arc<dyn BeforeSave>>,
}

impl TableDef {
    /// Start defining table `name`; its registry tag defaults to the name.
    pub fn builder(name: impl Into<String>) -> TableDefBuilder {
        let name = name.into();
        TableDefBuilder {
            def: TableDef {
                tag: name.clone(),
                shape: TableShape::new(name),
                associations: Vec::new(),
                default_recurse: DEFAULT_RECURSE,
                validate: None,
                after_fetch: None,
                before_save: None,
            },
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn name(&self) -> &str {
        &self.shape.name
    }

    pub fn primary_key(&self) -> &str {
        &self.shape.primary_key
    }

    pub fn shape(&self) -> &TableShape {
        &self.shape
    }

    pub fn default_recurse(&self) -> u32 {
        self.default_recurse
    }

    /// Associations in declaration order.
    pub fn associations(&self) -> impl Iterator<Item = (&str, &Association)> {
        self.associations.iter().map(|(n, a)| (n.as_str(), a))
    }

    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    pub fn validate_hook(&self) -> Option<&Arc<dyn Validate>> {
        self.validate.as_ref()
    }

    pub fn after_fetch_hook(&self) -> Option<&Arc<dyn AfterFetch>> {
        self.after_fetch.as_ref()
    }

    pub fn before_save_hook(&self) -> Option<&Arc<dyn BeforeSave>> {
        self.before_save.as_ref()
    }
}

impl fmt::Debug for TableDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableDef")
            .field("tag", &self.tag)
            .field("shape", &self.shape)
            .field("associations", &self.associations)
            .field("default_recurse", &self.default_recurse)
            .field("validate", &self.validate.is_some())
            .field("after_fetch", &self.after_fetch.is_some())
            .field("before_save", &self.before_save.is_some())
            .finish()
    }
}

/// Builder for [`TableDef`].
///
/// # Example
///
/// ```rust,ignore
/// let people = TableDef::builder("people")
///     .scope("active", FindParams::new().field("status", "active"))
///     .belongs_to("manager", "people", "manager_id")
///     .has_many("pets", "pets", "owner_id")
///     .default_sort(["name"], None)
///     .build();
/// ```
#[must_use]
pub struct TableDefBuilder {
    def: TableDef,
}

impl TableDefBuilder {
    /// Registry tag, when it should differ from the table name.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.def.tag = tag.into();
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.def.shape.database = Some(database.into());
        self
    }

    pub fn primary_key(mut self, key: impl Into<String>) -> Self {
        self.def.shape.primary_key = key.into();
        self
    }

    /// Replace the protected field list.
    pub fn protected_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.shape.protected_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the created-style timestamp fields.
    pub fn created_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.shape.created_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the updated-style timestamp fields.
    pub fn updated_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.shape.updated_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Write `field` through an SQL template holding one `?`.
    pub fn wrapper(mut self, field: impl Into<String>, template: impl Into<String>) -> Self {
        self.def
            .shape
            .wrapper_fields
            .insert(field.into(), template.into());
        self
    }

    pub fn scope(mut self, name: impl Into<String>, params: FindParams) -> Self {
        self.def.shape.scopes.insert(name.into(), params);
        self
    }

    /// Declare an association; a later declaration with the same name
    /// replaces the earlier one.
    pub fn association(mut self, name: impl Into<String>, association: Association) -> Self {
        let name = name.into();
        match self.def.associations.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = association,
            None => self.def.associations.push((name, association)),
        }
        self
    }

    pub fn belongs_to(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        self.association(name, Association::belongs_to(target, key))
    }

    pub fn has_one(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        self.association(name, Association::has_one(target, key))
    }

    pub fn has_many(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        self.association(name, Association::has_many(target, key))
    }

    pub fn many_to_many(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        join_table: impl Into<String>,
        local_key: impl Into<String>,
        remote_key: impl Into<String>,
    ) -> Self {
        self.association(
            name,
            Association::many_to_many(target, join_table, local_key, remote_key),
        )
    }

    /// Verbatim ORDER BY used when nothing else orders a find.
    pub fn default_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.def.shape.default_order = DefaultOrder::OrderBy(order_by.into());
        self
    }

    /// Sort fields (and optional directions) used when nothing else orders a find.
    pub fn default_sort(
        mut self,
        fields: impl Into<OneOrMany<String>>,
        directions: Option<OneOrMany<String>>,
    ) -> Self {
        self.def.shape.default_order = DefaultOrder::Sort {
            fields: fields.into(),
            directions,
        };
        self
    }

    pub fn default_recurse(mut self, depth: u32) -> Self {
        self.def.default_recurse = depth;
        self
    }

    pub fn validate(mut self, hook: impl Validate + 'static) -> Self {
        self.def.validate = Some(Arc::new(hook));
        self
    }

    pub fn after_fetch(mut self, hook: impl AfterFetch + 'static) -> Self {
        self.def.after_fetch = Some(Arc::new(hook));
        self
    }

    pub fn before_save(mut self, hook: impl BeforeSave + 'static) -> Self {
        self.def.before_save = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> TableDef {
        self.def
    }
}
