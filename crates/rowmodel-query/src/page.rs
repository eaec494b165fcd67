//! Pager boundary: request-level page/sort inputs turned into a scope.

use crate::params::{FindParams, OneOrMany};

/// Raw paging inputs, typically read from a request's query string.
///
/// Values are kept as given; condensing sanitizes them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
}

impl PageRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick `page`, `per_page`, `sort_field` and `sort_order` out of
    /// key/value pairs; other keys are ignored.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut request = Self::default();
        for (key, value) in pairs {
            let slot = match key {
                "page" => &mut request.page,
                "per_page" => &mut request.per_page,
                "sort_field" => &mut request.sort_field,
                "sort_order" => &mut request.sort_order,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        request
    }

    /// The find parameters to push as a scope.
    pub fn to_scope(&self) -> FindParams {
        FindParams {
            page: self.page.clone(),
            per_page: self.per_page.clone(),
            sort_fields: self.sort_field.clone().map(OneOrMany::One),
            sort_directions: self.sort_order.clone().map(OneOrMany::One),
            ..FindParams::default()
        }
    }
}

impl From<PageRequest> for FindParams {
    fn from(request: PageRequest) -> Self {
        request.to_scope()
    }
}
