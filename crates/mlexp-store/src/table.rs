use std::collections::BTreeSet;

use indexmap::IndexSet;
use mlexp_core::{Value, ValueKind, Version};
use serde::{Deserialize, Serialize};

use crate::property::PropertySet;

/// Separator between a part name and its version number in table names.
pub const VERSION_SEPARATOR: &str = "-v";

/// Declared storage kind of a version column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Every value is an `Int`.
    Integer,
    /// Every value is a `Real`.
    Real,
    /// Every value is a `Text`.
    Text,
    /// Every value is a `Bool`, stored as 0 or 1.
    Boolean,
    /// Mixed-kind domain; values keep their storage class.
    Any,
}

impl ColumnKind {
    /// Picks the narrowest kind able to hold every value of `domain`.
    pub fn for_domain(domain: &IndexSet<Value>) -> Self {
        let mut kinds = domain.iter().map(Value::kind);
        let Some(first) = kinds.next() else {
            return ColumnKind::Any;
        };
        if kinds.any(|kind| kind != first) {
            return ColumnKind::Any;
        }
        match first {
            ValueKind::Int => ColumnKind::Integer,
            ValueKind::Real => ColumnKind::Real,
            ValueKind::Text => ColumnKind::Text,
            ValueKind::Bool => ColumnKind::Boolean,
        }
    }

    /// Reads back a kind from a column's declared SQL type.
    pub fn from_declared(declared: &str) -> Self {
        match declared.to_ascii_uppercase().as_str() {
            "INTEGER" => ColumnKind::Integer,
            "REAL" => ColumnKind::Real,
            "TEXT" => ColumnKind::Text,
            "BOOLEAN" => ColumnKind::Boolean,
            _ => ColumnKind::Any,
        }
    }

    /// SQL type used when creating the column; blank for [`ColumnKind::Any`].
    pub fn declared(self) -> &'static str {
        match self {
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
            ColumnKind::Text => "TEXT",
            ColumnKind::Boolean => "BOOLEAN",
            ColumnKind::Any => "",
        }
    }
}

/// A property column of a version table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Property key.
    pub name: String,
    /// Storage kind.
    pub kind: ColumnKind,
}

/// Schema of one immutable `(part, version)` table, discovered at read time.
///
/// `columns` lists the property columns in table order; the `id` column is
/// implicit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionTable {
    /// Owning part.
    pub part: String,
    /// Version number within the part.
    pub version: Version,
    /// Property columns in table order.
    pub columns: Vec<Column>,
}

impl VersionTable {
    /// Schema for a new version holding the configurations of `properties`.
    pub fn for_properties(part: &str, version: Version, properties: &PropertySet) -> Self {
        let columns = properties
            .iter()
            .map(|(key, domain)| Column {
                name: key.clone(),
                kind: ColumnKind::for_domain(domain),
            })
            .collect();
        Self {
            part: part.to_string(),
            version,
            columns,
        }
    }

    /// SQL table name, see [`table_name`].
    pub fn table_name(&self) -> String {
        table_name(&self.part, self.version)
    }

    /// Column named `name`, if the table has one.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Property column names, ignoring order.
    pub fn column_set(&self) -> BTreeSet<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Table name of `(part, version)`, e.g. `lr-v3`.
pub fn table_name(part: &str, version: Version) -> String {
    format!("{part}{VERSION_SEPARATOR}{version}")
}

/// Splits a table name at its last version separator.
///
/// Only canonical decimal suffixes are accepted, so `a-v01` is not a version
/// table while `test-3-lot-of-hyphens--v0` belongs to `test-3-lot-of-hyphens-`.
pub fn parse_table_name(name: &str) -> Option<(&str, Version)> {
    let (part, suffix) = name.rsplit_once(VERSION_SEPARATOR)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let version: Version = suffix.parse().ok()?;
    if version.to_string() != suffix {
        return None;
    }
    Some((part, version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hyphenated_parts() {
        assert_eq!(parse_table_name("test-v0"), Some(("test", 0)));
        assert_eq!(parse_table_name("test-2-v13"), Some(("test-2", 13)));
        assert_eq!(
            parse_table_name("test-3-lot-of-hyphens--v0"),
            Some(("test-3-lot-of-hyphens-", 0))
        );
        assert_eq!(parse_table_name("a-v1-v2"), Some(("a-v1", 2)));
    }

    #[test]
    fn rejects_non_version_tables() {
        assert_eq!(parse_table_name("sqlite_sequence"), None);
        assert_eq!(parse_table_name("part-v"), None);
        assert_eq!(parse_table_name("part-vx"), None);
        assert_eq!(parse_table_name("part-v01"), None);
    }

    #[test]
    fn column_kind_follows_domain() {
        let ints: IndexSet<Value> = [Value::Int(1), Value::Int(2)].into_iter().collect();
        let mixed: IndexSet<Value> = [Value::Int(1), Value::Real(0.5)].into_iter().collect();
        let flags: IndexSet<Value> = [Value::Bool(true)].into_iter().collect();
        assert_eq!(ColumnKind::for_domain(&ints), ColumnKind::Integer);
        assert_eq!(ColumnKind::for_domain(&mixed), ColumnKind::Any);
        assert_eq!(ColumnKind::for_domain(&flags), ColumnKind::Boolean);
        assert_eq!(ColumnKind::from_declared("boolean"), ColumnKind::Boolean);
        assert_eq!(ColumnKind::from_declared(""), ColumnKind::Any);
    }
}
