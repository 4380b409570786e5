// src/model/database.rs
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::table::Table;

/// Relationship type of every edge derived from a foreign-key constraint.
pub const FOREIGN_KEY_RELATIONSHIP: &str = "foreign_key";

/// A database (schema) and its tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    /// Database name; unique across the ontology and used to resolve
    /// cross-database references
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Tables ordered by name
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub character_set: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
}

impl Database {
    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(Table::column_count).sum()
    }
}

/// Qualified name of a table: the (database, table) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    pub database: String,
    pub table: String,
}

impl TableRef {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }

    /// Get the qualified name (database.table).
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database, self.table)
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

/// A resolved foreign-key reference between two columns.
///
/// The source side owns the foreign key; the target side is the referenced
/// column. Relationships are only ever produced by the builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub source_database: String,
    pub source_table: String,
    pub source_column: String,
    pub target_database: String,
    pub target_table: String,
    pub target_column: String,
    pub constraint_name: String,
    pub relationship_type: String,
}

impl Relationship {
    pub fn source(&self) -> TableRef {
        TableRef::new(&self.source_database, &self.source_table)
    }

    pub fn target(&self) -> TableRef {
        TableRef::new(&self.target_database, &self.target_table)
    }

    /// Whether the edge points back at its own table.
    pub fn is_self_reference(&self) -> bool {
        self.source_database == self.target_database && self.source_table == self.target_table
    }

    /// Whether the edge touches the given table on either side.
    pub fn touches(&self, database: &str, table: &str) -> bool {
        (self.source_database == database && self.source_table == table)
            || (self.target_database == database && self.target_table == table)
    }
}

/// Summary metadata attached to an ontology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OntologyMetadata {
    #[serde(default)]
    pub extraction_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub database_count: usize,
    #[serde(default)]
    pub table_count: usize,
    #[serde(default)]
    pub column_count: usize,
    #[serde(default)]
    pub relationship_count: usize,
    /// Foreign keys dropped because their target could not be resolved
    #[serde(default)]
    pub unresolved_foreign_keys: usize,
    /// Free-form entries carried along with the snapshot
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl OntologyMetadata {
    /// Counts describing the given contents.
    pub fn for_contents(databases: &[Database], relationships: &[Relationship]) -> Self {
        Self {
            extraction_date: None,
            database_count: databases.len(),
            table_count: databases.iter().map(|d| d.tables.len()).sum(),
            column_count: databases.iter().map(Database::column_count).sum(),
            relationship_count: relationships.len(),
            unresolved_foreign_keys: 0,
            extra: BTreeMap::new(),
        }
    }
}

/// The complete normalized graph produced by one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ontology {
    #[serde(default)]
    pub databases: Vec<Database>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub metadata: OntologyMetadata,
}

impl Ontology {
    /// Get database by name.
    pub fn database(&self, name: &str) -> Option<&Database> {
        self.databases.iter().find(|d| d.name == name)
    }

    /// Get table by database and table name.
    pub fn table(&self, database: &str, table: &str) -> Option<&Table> {
        self.database(database).and_then(|d| d.table(table))
    }

    /// Iterate over every table together with its database.
    pub fn tables(&self) -> impl Iterator<Item = (&Database, &Table)> {
        self.databases
            .iter()
            .flat_map(|db| db.tables.iter().map(move |t| (db, t)))
    }

    pub fn table_count(&self) -> usize {
        self.databases.iter().map(|d| d.tables.len()).sum()
    }

    pub fn column_count(&self) -> usize {
        self.databases.iter().map(Database::column_count).sum()
    }

    /// Relationships whose endpoints do not resolve to a known table and
    /// column. Always empty for an ontology produced by the builder.
    pub fn dangling_relationships(&self) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|rel| {
                let source_ok = self
                    .table(&rel.source_database, &rel.source_table)
                    .is_some_and(|t| t.has_column(&rel.source_column));
                let target_ok = self
                    .table(&rel.target_database, &rel.target_table)
                    .is_some_and(|t| t.has_column(&rel.target_column));
                !(source_ok && target_ok)
            })
            .collect()
    }
}
