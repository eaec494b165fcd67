//! The caller-facing find-parameter dictionary.

use rowmodel_core::Value;
use std::fmt;

/// A scalar or a list, as accepted by `fields`, `values`, `sort_fields`
/// and `sort_directions`.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Element `i`. A scalar only answers for index 0.
    pub fn get(&self, i: usize) -> Option<&T> {
        match self {
            OneOrMany::One(v) if i == 0 => Some(v),
            OneOrMany::One(_) => None,
            OneOrMany::Many(vs) => vs.get(i),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(vs) => vs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(v: Vec<T>) -> Self {
        OneOrMany::Many(v)
    }
}

impl From<&str> for OneOrMany<String> {
    fn from(v: &str) -> Self {
        OneOrMany::One(v.to_string())
    }
}

impl From<String> for OneOrMany<String> {
    fn from(v: String) -> Self {
        OneOrMany::One(v)
    }
}

impl From<&[&str]> for OneOrMany<String> {
    fn from(v: &[&str]) -> Self {
        OneOrMany::Many(v.iter().map(|s| (*s).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OneOrMany<String> {
    fn from(v: [&str; N]) -> Self {
        OneOrMany::Many(v.iter().map(|s| (*s).to_string()).collect())
    }
}

impl<const N: usize> From<[Value; N]> for OneOrMany<Value> {
    fn from(v: [Value; N]) -> Self {
        OneOrMany::Many(v.into())
    }
}

impl From<Value> for OneOrMany<Value> {
    fn from(v: Value) -> Self {
        OneOrMany::One(v)
    }
}

/// Find parameters.
///
/// Every slot is optional; an absent slot is different from an empty one.
/// Pagination inputs are kept as text because they usually come straight
/// from a request and are sanitized during condensing.
///
/// ```
/// use rowmodel_core::Value;
/// use rowmodel_query::FindParams;
///
/// let params = FindParams::new()
///     .fields(["state"])
///     .values([Value::from("LA")])
///     .sort_fields("name")
///     .page(2)
///     .per_page(10);
/// assert_eq!(params.page.as_deref(), Some("2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindParams {
    pub where_clause: Option<String>,
    pub params: Option<Vec<Value>>,
    pub fields: Option<OneOrMany<String>>,
    pub values: Option<OneOrMany<Value>>,
    pub match_any: bool,
    pub sort_fields: Option<OneOrMany<String>>,
    pub sort_directions: Option<OneOrMany<String>>,
    pub order_by: Option<String>,
    pub per_page: Option<String>,
    pub page: Option<String>,
    pub limit_start: Option<String>,
    pub first: bool,
    /// Run the table's after-fetch hook on results (default: yes)
    pub callback: Option<bool>,
    pub select: Option<String>,
    pub joins: Option<String>,
    pub group_by: Option<String>,
    pub having: Option<String>,
}

impl FindParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw WHERE clause with its bound parameters.
    pub fn where_sql(mut self, clause: impl Into<String>, params: Vec<Value>) -> Self {
        self.where_clause = Some(clause.into());
        self.params = Some(params);
        self
    }

    /// Match a single field against a single value.
    pub fn field(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields(OneOrMany::One(field.into()))
            .values(OneOrMany::One(value.into()))
    }

    pub fn fields(mut self, fields: impl Into<OneOrMany<String>>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn values(mut self, values: impl Into<OneOrMany<Value>>) -> Self {
        self.values = Some(values.into());
        self
    }

    pub fn match_any(mut self) -> Self {
        self.match_any = true;
        self
    }

    pub fn sort_fields(mut self, fields: impl Into<OneOrMany<String>>) -> Self {
        self.sort_fields = Some(fields.into());
        self
    }

    pub fn sort_directions(mut self, directions: impl Into<OneOrMany<String>>) -> Self {
        self.sort_directions = Some(directions.into());
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn per_page(mut self, per_page: impl fmt::Display) -> Self {
        self.per_page = Some(per_page.to_string());
        self
    }

    pub fn page(mut self, page: impl fmt::Display) -> Self {
        self.page = Some(page.to_string());
        self
    }

    pub fn limit_start(mut self, start: impl fmt::Display) -> Self {
        self.limit_start = Some(start.to_string());
        self
    }

    pub fn first(mut self) -> Self {
        self.first = true;
        self
    }

    pub fn callback(mut self, run: bool) -> Self {
        self.callback = Some(run);
        self
    }

    pub fn select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    pub fn joins(mut self, joins: impl Into<String>) -> Self {
        self.joins = Some(joins.into());
        self
    }

    pub fn group_by(mut self, group_by: impl Into<String>) -> Self {
        self.group_by = Some(group_by.into());
        self
    }

    pub fn having(mut self, having: impl Into<String>) -> Self {
        self.having = Some(having.into());
        self
    }

    /// Build find parameters from a JSON object.
    ///
    /// Keys follow the dictionary names (`where`, `params`, `fields`,
    /// `values`, `match_any`, `sort_fields`, `sort_directions`, `order_by`,
    /// `per_page`, `page`, `limit_start`, `first`, `callback`, `select`,
    /// `joins`, `group_by`, `having`). Unrecognized keys are ignored, as is
    /// anything that is not an object.
    pub fn from_json(json: &serde_json::Value) -> Self {
        let Some(obj) = json.as_object() else {
            return Self::default();
        };
        let text = |key: &str| obj.get(key).and_then(json_text);
        let flag = |key: &str| obj.get(key).is_some_and(json_truthy);

        Self {
            where_clause: text("where"),
            params: obj.get("params").map(|p| match p {
                serde_json::Value::Array(items) => items.iter().map(Value::from_json).collect(),
                other => vec![Value::from_json(other)],
            }),
            fields: obj.get("fields").and_then(json_strings),
            values: obj.get("values").and_then(|v| match v {
                serde_json::Value::Null => None,
                serde_json::Value::Array(items) => {
                    Some(OneOrMany::Many(items.iter().map(Value::from_json).collect()))
                }
                other => Some(OneOrMany::One(Value::from_json(other))),
            }),
            match_any: flag("match_any"),
            sort_fields: obj.get("sort_fields").and_then(json_strings),
            sort_directions: obj.get("sort_directions").and_then(json_strings),
            order_by: text("order_by"),
            per_page: text("per_page"),
            page: text("page"),
            limit_start: text("limit_start"),
            first: flag("first"),
            callback: obj.get("callback").and_then(serde_json::Value::as_bool),
            select: text("select"),
            joins: text("joins"),
            group_by: text("group_by"),
            having: text("having"),
        }
    }
}

fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_truthy(value: &serde_json::Value) -> bool {
    !matches!(value, serde_json::Value::Null | serde_json::Value::Bool(false))
}

fn json_strings(value: &serde_json::Value) -> Option<OneOrMany<String>> {
    match value {
        serde_json::Value::Array(items) => Some(OneOrMany::Many(
            items.iter().filter_map(json_text).collect(),
        )),
        other => json_text(other).map(OneOrMany::One),
    }
}
