//! Scope rules and the persistent scope stack.
//!
//! A stack is an immutable cons list: pushing returns a new stack that
//! shares its tail with the old one, so deriving a scoped record never
//! disturbs the record it came from.

use crate::condense::{Condensed, condense, default_order_by, default_select};
use crate::merge::merge;
use crate::params::FindParams;
use crate::table::TableShape;
use rowmodel_core::{FieldMap, Result, ScopeError, Value};
use std::fmt;
use std::sync::Arc;

/// One stacked filter: literal parameters or the name of a table scope.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeRule {
    Params(FindParams),
    Named(String),
}

impl ScopeRule {
    /// The literal parameters this rule stands for on `shape`.
    pub fn resolve<'a>(&'a self, shape: &'a TableShape) -> Result<&'a FindParams> {
        match self {
            ScopeRule::Params(params) => Ok(params),
            ScopeRule::Named(name) => shape.scopes.get(name).ok_or_else(|| {
                ScopeError {
                    table: shape.name.clone(),
                    rule: name.clone(),
                }
                .into()
            }),
        }
    }
}

impl From<FindParams> for ScopeRule {
    fn from(params: FindParams) -> Self {
        ScopeRule::Params(params)
    }
}

impl From<&str> for ScopeRule {
    fn from(name: &str) -> Self {
        ScopeRule::Named(name.to_string())
    }
}

impl From<String> for ScopeRule {
    fn from(name: String) -> Self {
        ScopeRule::Named(name)
    }
}

struct Node {
    rule: ScopeRule,
    next: Option<Arc<Node>>,
}

/// Ordered scope rules, most recently pushed first.
#[derive(Clone, Default)]
pub struct ScopeStack {
    head: Option<Arc<Node>>,
    len: usize,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new stack with `rule` in front; `self` is unchanged.
    #[must_use]
    pub fn push(&self, rule: impl Into<ScopeRule>) -> Self {
        Self {
            head: Some(Arc::new(Node {
                rule: rule.into(),
                next: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Rules from the most recent to the oldest.
    pub fn iter(&self) -> impl Iterator<Item = &ScopeRule> {
        std::iter::successors(self.head.as_deref(), |node| node.next.as_deref())
            .map(|node| &node.rule)
    }

    /// Fold every stacked rule into `condensed`, which keeps precedence.
    pub fn fold(&self, condensed: Condensed, shape: &TableShape, fields: &FieldMap) -> Result<Condensed> {
        self.iter().try_fold(condensed, |acc, rule| {
            let params = rule.resolve(shape)?;
            Ok(merge(condense(params, shape, fields), acc))
        })
    }

    /// Build the SELECT for `explicit` under this stack.
    ///
    /// Slots still absent after folding get the table defaults.
    pub fn resolve(
        &self,
        explicit: &FindParams,
        shape: &TableShape,
        fields: &FieldMap,
    ) -> Result<(String, Condensed)> {
        let mut condensed = self.fold(condense(explicit, shape, fields), shape, fields)?;
        if condensed.select.is_none() {
            condensed.select = Some(default_select(shape, fields));
        }
        if condensed.order_by.is_none() {
            condensed.order_by = default_order_by(shape, fields);
        }
        let sql = condensed.to_select_sql(&shape.statement());
        tracing::trace!(table = %shape.name, scopes = self.len, sql = %sql, "Resolved select");
        Ok((sql, condensed))
    }

    /// Build a row count over an optional WHERE clause under this stack.
    pub fn resolve_count(
        &self,
        where_clause: Option<&str>,
        params: Vec<Value>,
        shape: &TableShape,
        fields: &FieldMap,
    ) -> Result<(String, Vec<Value>)> {
        let base = Condensed {
            where_clause: where_clause.map(str::to_string),
            params,
            ..Condensed::default()
        };
        let condensed = self.fold(base, shape, fields)?;

        let mut sql = format!("SELECT COUNT(*) AS `count` FROM {}", shape.statement());
        if let Some(clause) = condensed.where_clause.as_deref().filter(|w| !w.is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }
        Ok((sql, condensed.params))
    }
}

impl fmt::Debug for ScopeStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
