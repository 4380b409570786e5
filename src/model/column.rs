// src/model/column.rs
use serde::{Deserialize, Serialize};

/// Role a column plays in the table's keys, as tagged by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    /// Part of the primary key
    Primary,
    /// Covered by a unique constraint
    Unique,
    /// First column of a non-unique index
    Indexed,
}

impl KeyRole {
    /// Parse the catalog's key tag (`PRI`, `UNI`, `MUL`).
    ///
    /// Empty or unrecognized tags mean the column plays no key role.
    pub fn from_catalog(tag: &str) -> Option<Self> {
        match tag.trim().to_uppercase().as_str() {
            "PRI" | "PRIMARY" => Some(KeyRole::Primary),
            "UNI" | "UNIQUE" => Some(KeyRole::Unique),
            "MUL" | "INDEXED" => Some(KeyRole::Indexed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyRole::Primary => "primary",
            KeyRole::Unique => "unique",
            KeyRole::Indexed => "indexed",
        }
    }
}

impl std::fmt::Display for KeyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within its table
    pub name: String,
    /// Database-specific type name (`int`, `varchar`, ...)
    pub data_type: String,
    pub is_nullable: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub character_maximum_length: Option<u64>,
    #[serde(default)]
    pub numeric_precision: Option<u32>,
    #[serde(default)]
    pub numeric_scale: Option<u32>,
    #[serde(default)]
    pub key_role: Option<KeyRole>,
    /// Extra attributes reported by the catalog (`auto_increment`, ...)
    #[serde(default)]
    pub extra: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Column {
    /// Create a nullable column with no key role and no optional attributes.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default_value: None,
            character_maximum_length: None,
            numeric_precision: None,
            numeric_scale: None,
            key_role: None,
            extra: None,
            comment: None,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.key_role == Some(KeyRole::Primary)
    }
}

/// A secondary index. The primary key is not reported as an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    /// Indexed columns in sequence order
    pub column_names: Vec<String>,
    pub is_unique: bool,
    /// Index structure (`BTREE`, `HASH`, `FULLTEXT`, ...)
    pub index_type: String,
}

/// One column of a foreign-key constraint.
///
/// Composite constraints contribute one `ForeignKey` per column, all sharing
/// the constraint name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub constraint_name: String,
    /// Owning (referencing) column
    pub column_name: String,
    pub referenced_database: String,
    pub referenced_table: String,
    pub referenced_column: String,
    #[serde(default)]
    pub update_rule: Option<String>,
    #[serde(default)]
    pub delete_rule: Option<String>,
}
