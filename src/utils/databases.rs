use regex::Regex;
use std::sync::LazyLock;

use crate::errors::{AppError, Result};

/// Server-internal schemas that are never offered for backup.
pub const SYSTEM_DATABASES: &[&str] = &["information_schema", "performance_schema", "mysql", "sys"];

/// Suffixes reserved for archives; a database named like an archive would be mis-filed.
const RESERVED_SUFFIXES: &[&str] = &[".tar.gz", ".tar", ".zip"];

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/\\\x00-\x1f\x7f]").expect("static regex"));

pub fn is_system_database(name: &str) -> bool {
    SYSTEM_DATABASES.contains(&name)
}

/// Checks that `name` maps one-to-one onto `<name>.sql` inside a flat directory.
pub fn validate_database_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name is a relative path component")
    } else if UNSAFE_FILENAME_CHARS.is_match(name) {
        Some("name contains a path separator or control character")
    } else if RESERVED_SUFFIXES
        .iter()
        .any(|suffix| name.to_ascii_lowercase().ends_with(suffix))
    {
        Some("name ends with an archive suffix")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(AppError::InvalidDatabaseName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Drops system schemas, keeping server order.
pub fn user_databases(all: Vec<String>) -> Vec<String> {
    all.into_iter().filter(|db| !is_system_database(db)).collect()
}
