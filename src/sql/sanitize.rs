//! Identifier validation for schema registration
//!
//! Generated statements embed table and field names unquoted, so every name
//! is checked once when a schema enters the registry.

use std::sync::LazyLock;

use regex::Regex;

static IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("identifier pattern is valid"));

/// Longest identifier PostgreSQL keeps without truncation (NAMEDATALEN - 1)
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// PostgreSQL keywords that are reserved in every context
pub const POSTGRES_RESERVED_WORDS: &[&str] = &[
    "ALL", "ANALYSE", "ANALYZE", "AND", "ANY", "ARRAY", "AS", "ASC", "ASYMMETRIC", "BOTH",
    "CASE", "CAST", "CHECK", "COLLATE", "COLUMN", "CONSTRAINT", "CREATE", "CURRENT_CATALOG",
    "CURRENT_DATE", "CURRENT_ROLE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER",
    "DEFAULT", "DEFERRABLE", "DESC", "DISTINCT", "DO", "ELSE", "END", "EXCEPT", "FALSE",
    "FETCH", "FOR", "FOREIGN", "FROM", "GRANT", "GROUP", "HAVING", "IN", "INITIALLY",
    "INTERSECT", "INTO", "LATERAL", "LEADING", "LIMIT", "LOCALTIME", "LOCALTIMESTAMP", "NOT",
    "NULL", "OFFSET", "ON", "ONLY", "OR", "ORDER", "PLACING", "PRIMARY", "REFERENCES",
    "RETURNING", "SELECT", "SESSION_USER", "SOME", "SYMMETRIC", "TABLE", "THEN", "TO",
    "TRAILING", "TRUE", "UNION", "UNIQUE", "USER", "USING", "VARIADIC", "WHEN", "WHERE",
    "WINDOW", "WITH",
];

/// Validate a table or field name
///
/// Names must start with a lowercase letter, contain only lowercase letters,
/// digits and underscores, fit in 63 bytes, and not be a reserved keyword.
///
/// # Example
/// ```
/// use redditor_store::sql::validate_identifier;
///
/// assert!(validate_identifier("time_zone_identifier").is_ok());
/// assert!(validate_identifier("select").is_err());
/// assert!(validate_identifier("Email").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(format!(
            "Identifier '{}' is longer than {} bytes",
            name, MAX_IDENTIFIER_LENGTH
        ));
    }

    if !IDENTIFIER_PATTERN.is_match(name) {
        return Err(format!(
            "Identifier '{}' is invalid. Must start with a lowercase letter and contain only lowercase letters, numbers, and underscores.",
            name
        ));
    }

    if POSTGRES_RESERVED_WORDS.contains(&name.to_uppercase().as_str()) {
        return Err(format!(
            "Identifier '{}' is a PostgreSQL reserved keyword and cannot be used.",
            name
        ));
    }

    Ok(())
}
