// src/model/table.rs
use serde::{Deserialize, Serialize};

use super::column::{Column, ForeignKey, Index};

/// Kind of relation reported by the catalog.
///
/// Serialized as a plain string (`"table"`, `"view"`, or the catalog's own
/// lowercased label for anything else).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TableKind {
    /// Base table
    Table,
    /// View
    View,
    /// Any other catalog label (system view, sequence, ...)
    Other(String),
}

impl TableKind {
    /// Parse a catalog `TABLE_TYPE` value or a normalized kind name.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "BASE TABLE" | "TABLE" => TableKind::Table,
            "VIEW" => TableKind::View,
            other => TableKind::Other(other.to_lowercase()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TableKind::Table => "table",
            TableKind::View => "view",
            TableKind::Other(label) => label,
        }
    }
}

impl From<String> for TableKind {
    fn from(s: String) -> Self {
        TableKind::parse(&s)
    }
}

impl From<TableKind> for String {
    fn from(kind: TableKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A table or view within a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name, unique within its database
    pub name: String,
    #[serde(rename = "table_type")]
    pub kind: TableKind,
    /// Storage engine (`InnoDB`, ...)
    #[serde(default)]
    pub engine: Option<String>,
    /// Row-count estimate; catalogs may not know it
    #[serde(default)]
    pub row_count: Option<u64>,
    #[serde(default)]
    pub data_length: Option<u64>,
    #[serde(default)]
    pub index_length: Option<u64>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Columns in catalog ordinal order
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    /// Primary-key columns in key order; every entry names a column above
    #[serde(default)]
    pub primary_key_columns: Vec<String>,
}

impl Table {
    /// Create an empty base table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TableKind::Table,
            engine: None,
            row_count: None,
            data_length: None,
            index_length: None,
            comment: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            primary_key_columns: Vec::new(),
        }
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Row count for range comparisons: an unknown estimate counts as zero.
    pub fn row_count_or_zero(&self) -> u64 {
        self.row_count.unwrap_or(0)
    }

    pub fn is_view(&self) -> bool {
        self.kind == TableKind::View
    }
}
