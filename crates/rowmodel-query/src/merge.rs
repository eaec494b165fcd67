//! Pairwise combination of condensed parameter sets.

use crate::condense::Condensed;

fn concat(left: Option<String>, right: Option<String>, sep: &str) -> Option<String> {
    match (left, right) {
        (Some(l), Some(r)) => Some(format!("{r}{sep}{l}")),
        (l, r) => r.or(l),
    }
}

fn conjoin(left: Option<String>, right: Option<String>) -> Option<String> {
    match (left, right) {
        (Some(l), Some(r)) => Some(format!("({l}) AND ({r})")),
        (l, r) => r.or(l),
    }
}

/// Merge two condensed sets, `right` taking precedence.
///
/// Lists (`select`, `group_by`, `order_by`) concatenate right first, joins
/// are newline-separated, `where`/`having` are AND-combined, params run
/// left then right, and `limit`/`callback` come from the right when present.
pub fn merge(left: Condensed, right: Condensed) -> Condensed {
    let mut params = left.params;
    params.extend(right.params);

    Condensed {
        select: concat(left.select, right.select, ", "),
        joins: concat(left.joins, right.joins, "\n"),
        where_clause: conjoin(left.where_clause, right.where_clause),
        params,
        group_by: concat(left.group_by, right.group_by, ", "),
        having: conjoin(left.having, right.having),
        order_by: concat(left.order_by, right.order_by, ", "),
        limit: right.limit.or(left.limit),
        callback: right.callback.or(left.callback),
    }
}
