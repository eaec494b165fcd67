//! Reduce find parameters to canonical clause slots.

use crate::params::{FindParams, OneOrMany};
use crate::table::{DefaultOrder, TableShape};
use regex::Regex;
use rowmodel_core::{FieldMap, Value, quote_ident};
use std::sync::OnceLock;

pub const DEFAULT_PER_PAGE: u64 = 15;

/// Find parameters in canonical form.
///
/// `None` means absent, which is different from an empty clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condensed {
    pub select: Option<String>,
    pub joins: Option<String>,
    pub where_clause: Option<String>,
    /// Bound parameters, in predicate order
    pub params: Vec<Value>,
    pub group_by: Option<String>,
    pub having: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<String>,
    pub callback: Option<bool>,
}

impl Condensed {
    /// Whether fetched rows should run the table's after-fetch hook.
    pub fn runs_callback(&self) -> bool {
        self.callback != Some(false)
    }

    /// Assemble the SELECT statement, one clause per line.
    pub fn to_select_sql(&self, table_statement: &str) -> String {
        let mut sql = format!(
            "SELECT {}\nFROM {}",
            self.select.as_deref().unwrap_or("*"),
            table_statement
        );
        if let Some(joins) = &self.joins {
            sql.push('\n');
            sql.push_str(joins);
        }
        let clauses = [
            ("WHERE", &self.where_clause),
            ("GROUP BY", &self.group_by),
            ("HAVING", &self.having),
            ("ORDER BY", &self.order_by),
            ("LIMIT", &self.limit),
        ];
        for (keyword, clause) in clauses {
            if let Some(clause) = clause {
                sql.push('\n');
                sql.push_str(keyword);
                sql.push(' ');
                sql.push_str(clause);
            }
        }
        sql
    }
}

/// Condense one parameter set against a table's columns.
pub fn condense(params: &FindParams, shape: &TableShape, fields: &FieldMap) -> Condensed {
    let (where_clause, bound) = condense_where(params, shape, fields);
    Condensed {
        select: params.select.clone(),
        joins: params.joins.clone(),
        where_clause,
        params: bound,
        group_by: params.group_by.clone(),
        having: params.having.clone(),
        order_by: condense_order_by(params, shape, fields),
        limit: condense_limit(params),
        callback: params.callback,
    }
}

/// `*` plus an epoch projection of every timestamp-style column the table has.
pub fn default_select(shape: &TableShape, fields: &FieldMap) -> String {
    let mut select = String::from("*");
    for field in shape.timestamp_fields().filter(|f| fields.contains(f)) {
        let quoted = quote_ident(field);
        select.push_str(&format!(", UNIX_TIMESTAMP({quoted}) AS {quoted}"));
    }
    select
}

/// The table's default ordering, if it declares one.
pub fn default_order_by(shape: &TableShape, fields: &FieldMap) -> Option<String> {
    match &shape.default_order {
        DefaultOrder::None => None,
        DefaultOrder::OrderBy(clause) => Some(clause.clone()),
        DefaultOrder::Sort { fields: sort, directions } => {
            sort_clause(sort, directions.as_ref(), shape, fields)
        }
    }
}

fn condense_where(
    params: &FindParams,
    shape: &TableShape,
    fields: &FieldMap,
) -> (Option<String>, Vec<Value>) {
    if let Some(clause) = &params.where_clause {
        return (Some(clause.clone()), params.params.clone().unwrap_or_default());
    }
    let Some(names) = &params.fields else {
        return (None, Vec::new());
    };

    let mut pieces = Vec::new();
    let mut bound = Vec::new();
    for (i, name) in names.iter().enumerate() {
        if !fields.contains(name) {
            continue;
        }
        let value = params
            .values
            .as_ref()
            .and_then(|v| v.get(i))
            .cloned()
            .unwrap_or(Value::Null);
        let op = if value.is_null() { "IS" } else { "=" };
        pieces.push(format!("{} {op} ?", shape.column(name)));
        bound.push(value);
    }

    if pieces.is_empty() {
        return (None, Vec::new());
    }
    let joiner = if params.match_any { " OR " } else { " AND " };
    (Some(pieces.join(joiner)), bound)
}

fn condense_order_by(params: &FindParams, shape: &TableShape, fields: &FieldMap) -> Option<String> {
    if let Some(order_by) = &params.order_by {
        return Some(order_by.clone());
    }
    let sort = params.sort_fields.as_ref()?;
    sort_clause(sort, params.sort_directions.as_ref(), shape, fields)
}

fn sort_clause(
    sort: &OneOrMany<String>,
    directions: Option<&OneOrMany<String>>,
    shape: &TableShape,
    fields: &FieldMap,
) -> Option<String> {
    let pieces: Vec<String> = sort
        .iter()
        .enumerate()
        .filter(|(_, name)| fields.contains(name))
        .map(|(i, name)| {
            let desc = directions
                .and_then(|d| d.get(i))
                .is_some_and(|d| d.eq_ignore_ascii_case("DESC"));
            format!("{} {}", shape.column(name), if desc { "DESC" } else { "ASC" })
        })
        .collect();
    if pieces.is_empty() {
        None
    } else {
        Some(pieces.join(", "))
    }
}

fn digits() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"^[0-9]+$").expect("digit pattern is valid"))
}

/// A non-negative integer input, or `None` when it fails sanitization.
fn sanitized(input: &str) -> Option<u64> {
    if digits().is_match(input) {
        input.parse().ok()
    } else {
        None
    }
}

fn condense_limit(params: &FindParams) -> Option<String> {
    if params.first {
        return Some("0,1".to_string());
    }

    let page = params.page.as_deref().map(|p| sanitized(p).unwrap_or(1));
    let limit_start = params
        .limit_start
        .as_deref()
        .map(|s| sanitized(s).unwrap_or(0));
    let per_page = params
        .per_page
        .as_deref()
        .and_then(sanitized)
        .unwrap_or(DEFAULT_PER_PAGE);

    let start = match (limit_start, page) {
        (Some(start), _) => start,
        (None, Some(page)) => page.saturating_sub(1).saturating_mul(per_page),
        (None, None) => return None,
    };
    Some(format!("{start},{per_page}"))
}
