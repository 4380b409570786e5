//! Summary counts for an ontology.

use serde::Serialize;

use crate::model::{Database, Ontology};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub table_count: usize,
    pub view_count: usize,
    pub column_count: usize,
    pub character_set: Option<String>,
    pub collation: Option<String>,
}

impl DatabaseStats {
    pub fn of(database: &Database) -> Self {
        Self {
            name: database.name.clone(),
            host: database.host.clone(),
            port: database.port,
            table_count: database.tables.len(),
            view_count: database.tables.iter().filter(|t| t.is_view()).count(),
            column_count: database.column_count(),
            character_set: database.character_set.clone(),
            collation: database.collation.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OntologyStats {
    pub database_count: usize,
    pub table_count: usize,
    pub column_count: usize,
    pub relationship_count: usize,
    /// Relationships whose endpoints sit in different databases
    pub cross_database_relationships: usize,
    pub unresolved_foreign_keys: usize,
    pub databases: Vec<DatabaseStats>,
}

impl OntologyStats {
    /// Counts taken from the ontology contents rather than its stored metadata.
    pub fn of(ontology: &Ontology) -> Self {
        Self {
            database_count: ontology.databases.len(),
            table_count: ontology.table_count(),
            column_count: ontology.column_count(),
            relationship_count: ontology.relationships.len(),
            cross_database_relationships: ontology
                .relationships
                .iter()
                .filter(|rel| rel.source_database != rel.target_database)
                .count(),
            unresolved_foreign_keys: ontology.metadata.unresolved_foreign_keys,
            databases: ontology.databases.iter().map(DatabaseStats::of).collect(),
        }
    }
}
