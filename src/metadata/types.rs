//! Raw catalog rows returned by a [`MetadataSource`](super::MetadataSource).
//!
//! The shapes mirror the standard catalog views (`TABLES`, `COLUMNS`,
//! `STATISTICS`, `KEY_COLUMN_USAGE` joined with `REFERENTIAL_CONSTRAINTS`)
//! so any relational engine that exposes them can feed the builder. Row
//! order inside a record is not significant.

use serde::{Deserialize, Serialize};

fn default_port() -> u16 {
    3306
}

/// Everything the catalog reported about one configured database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDatabaseRecord {
    /// Database (schema) name.
    #[serde(default)]
    pub name: String,
    /// Host the database was read from.
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub character_set: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
    #[serde(default)]
    pub tables: Vec<RawTableRow>,
    #[serde(default)]
    pub columns: Vec<RawColumnRow>,
    #[serde(default)]
    pub indexes: Vec<RawIndexRow>,
    #[serde(default)]
    pub foreign_keys: Vec<RawForeignKeyRow>,
}

impl RawDatabaseRecord {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            character_set: None,
            collation: None,
            tables: Vec::new(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: RawTableRow) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_column(mut self, column: RawColumnRow) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_index(mut self, index: RawIndexRow) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: RawForeignKeyRow) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Display name used in logs (`name@host:port`).
    pub fn display_name(&self) -> String {
        format!("{}@{}:{}", self.name, self.host, self.port)
    }
}

/// A `TABLES` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTableRow {
    pub table_name: String,
    /// `BASE TABLE`, `VIEW`, ...
    pub table_type: String,
    #[serde(default)]
    pub engine: Option<String>,
    /// Estimated row count (may be absent for views or unanalyzed tables).
    #[serde(default)]
    pub table_rows: Option<u64>,
    #[serde(default)]
    pub data_length: Option<u64>,
    #[serde(default)]
    pub index_length: Option<u64>,
    #[serde(default)]
    pub table_comment: Option<String>,
}

impl RawTableRow {
    pub fn new(table_name: impl Into<String>, table_type: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            table_type: table_type.into(),
            engine: None,
            table_rows: None,
            data_length: None,
            index_length: None,
            table_comment: None,
        }
    }

    pub fn base_table(table_name: impl Into<String>) -> Self {
        Self::new(table_name, "BASE TABLE")
    }

    pub fn with_rows(mut self, rows: u64) -> Self {
        self.table_rows = Some(rows);
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }
}

/// A `COLUMNS` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawColumnRow {
    pub table_name: String,
    pub column_name: String,
    /// 1-based position within the table.
    pub ordinal_position: u32,
    pub data_type: String,
    /// `YES` or `NO`.
    pub is_nullable: String,
    #[serde(default)]
    pub column_default: Option<String>,
    #[serde(default)]
    pub character_maximum_length: Option<u64>,
    #[serde(default)]
    pub numeric_precision: Option<u32>,
    #[serde(default)]
    pub numeric_scale: Option<u32>,
    /// `PRI`, `UNI`, `MUL` or empty.
    #[serde(default)]
    pub column_key: Option<String>,
    /// Position within the primary key (1-based), when the column is part of it.
    #[serde(default)]
    pub key_ordinal: Option<u32>,
    #[serde(default)]
    pub extra: Option<String>,
    #[serde(default)]
    pub column_comment: Option<String>,
}

impl RawColumnRow {
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        ordinal_position: u32,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            ordinal_position,
            data_type: data_type.into(),
            is_nullable: "YES".to_string(),
            column_default: None,
            character_maximum_length: None,
            numeric_precision: None,
            numeric_scale: None,
            column_key: None,
            key_ordinal: None,
            extra: None,
            column_comment: None,
        }
    }

    /// Mark the column as the `key_ordinal`-th primary-key column.
    pub fn primary_key(mut self, key_ordinal: u32) -> Self {
        self.column_key = Some("PRI".to_string());
        self.key_ordinal = Some(key_ordinal);
        self.is_nullable = "NO".to_string();
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = "NO".to_string();
        self
    }

    pub fn with_key(mut self, column_key: impl Into<String>) -> Self {
        self.column_key = Some(column_key.into());
        self
    }

    pub fn nullable(&self) -> bool {
        self.is_nullable.trim().eq_ignore_ascii_case("YES")
    }
}

/// One column of an index, as reported by `STATISTICS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIndexRow {
    pub table_name: String,
    pub index_name: String,
    pub column_name: String,
    /// 1-based position of the column within the index.
    pub seq_in_index: u32,
    pub non_unique: bool,
    #[serde(default = "default_index_type")]
    pub index_type: String,
}

fn default_index_type() -> String {
    "BTREE".to_string()
}

impl RawIndexRow {
    pub fn new(
        table_name: impl Into<String>,
        index_name: impl Into<String>,
        column_name: impl Into<String>,
        seq_in_index: u32,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            index_name: index_name.into(),
            column_name: column_name.into(),
            seq_in_index,
            non_unique: true,
            index_type: default_index_type(),
        }
    }

    pub fn unique(mut self) -> Self {
        self.non_unique = false;
        self
    }
}

/// One column of a foreign-key constraint (`KEY_COLUMN_USAGE` with the
/// referential rules attached).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawForeignKeyRow {
    pub table_name: String,
    pub constraint_name: String,
    pub column_name: String,
    /// 1-based position of the column within the constraint.
    #[serde(default = "default_ordinal")]
    pub ordinal_position: u32,
    pub referenced_table_schema: String,
    pub referenced_table_name: String,
    pub referenced_column_name: String,
    #[serde(default)]
    pub update_rule: Option<String>,
    #[serde(default)]
    pub delete_rule: Option<String>,
}

fn default_ordinal() -> u32 {
    1
}

impl RawForeignKeyRow {
    pub fn new(
        table_name: impl Into<String>,
        constraint_name: impl Into<String>,
        column_name: impl Into<String>,
        referenced_table_schema: impl Into<String>,
        referenced_table_name: impl Into<String>,
        referenced_column_name: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            constraint_name: constraint_name.into(),
            column_name: column_name.into(),
            ordinal_position: 1,
            referenced_table_schema: referenced_table_schema.into(),
            referenced_table_name: referenced_table_name.into(),
            referenced_column_name: referenced_column_name.into(),
            update_rule: None,
            delete_rule: None,
        }
    }

    pub fn with_rules(mut self, update_rule: impl Into<String>, delete_rule: impl Into<String>) -> Self {
        self.update_rule = Some(update_rule.into());
        self.delete_rule = Some(delete_rule.into());
        self
    }
}
