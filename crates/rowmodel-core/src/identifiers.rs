//! SQL identifier quoting.
//!
//! Every identifier rowmodel emits is back-quoted in the MySQL dialect.

/// Quote a SQL identifier using MySQL backtick quoting.
///
/// Embedded backticks are escaped by doubling them (`` ` `` → ``` `` ```).
/// This function is safe against SQL injection for any input string.
///
/// # Examples
///
/// ```
/// use rowmodel_core::quote_ident;
///
/// assert_eq!(quote_ident("users"), "`users`");
/// assert_eq!(quote_ident("user`name"), "`user``name`");
/// ```
#[inline]
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a table name, prefixed by its database when one is given.
///
/// ```
/// use rowmodel_core::qualified_table;
///
/// assert_eq!(qualified_table(None, "people"), "`people`");
/// assert_eq!(qualified_table(Some("crm"), "people"), "`crm`.`people`");
/// ```
pub fn qualified_table(database: Option<&str>, table: &str) -> String {
    match database {
        Some(db) if !db.is_empty() => format!("{}.{}", quote_ident(db), quote_ident(table)),
        _ => quote_ident(table),
    }
}
