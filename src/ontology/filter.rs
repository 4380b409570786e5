//! Predicate-based filtering producing a derived [`Ontology`].

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Database, Ontology, OntologyMetadata, Table, TableKind};

/// Inclusive bounds; a missing side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    #[serde(default)]
    pub min: Option<u64>,
    #[serde(default)]
    pub max: Option<u64>,
}

impl CountRange {
    pub fn new(min: Option<u64>, max: Option<u64>) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: u64) -> Self {
        Self::new(Some(min), None)
    }

    pub fn at_most(max: u64) -> Self {
        Self::new(None, Some(max))
    }

    pub fn contains(&self, value: u64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Set of predicates applied to an ontology.
///
/// Every option defaults to "no restriction". Deserializes from partial
/// JSON, so `{"databases": ["shop"]}` is a complete filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OntologyFilter {
    /// Keep only these databases; empty keeps all
    pub databases: BTreeSet<String>,
    /// Keep only tables of these kinds; empty keeps all
    pub table_kinds: BTreeSet<TableKind>,
    /// `Some(true)` keeps tables touched by a relationship, `Some(false)`
    /// keeps the ones that are not
    pub has_relationships: Option<bool>,
    /// Unknown row counts compare as zero
    pub row_count: CountRange,
    pub column_count: CountRange,
}

impl OntologyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, name: impl Into<String>) -> Self {
        self.databases.insert(name.into());
        self
    }

    pub fn with_table_kind(mut self, kind: TableKind) -> Self {
        self.table_kinds.insert(kind);
        self
    }

    pub fn with_relationships(mut self, has_relationships: bool) -> Self {
        self.has_relationships = Some(has_relationships);
        self
    }

    pub fn with_row_count(mut self, range: CountRange) -> Self {
        self.row_count = range;
        self
    }

    pub fn with_column_count(mut self, range: CountRange) -> Self {
        self.column_count = range;
        self
    }

    /// Whether the filter restricts anything at all.
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
            && self.table_kinds.is_empty()
            && self.has_relationships.is_none()
            && self.row_count.is_unbounded()
            && self.column_count.is_unbounded()
    }

    fn keeps_database(&self, database: &Database) -> bool {
        self.databases.is_empty() || self.databases.contains(&database.name)
    }

    fn keeps_table(&self, table: &Table, connected: bool) -> bool {
        (self.table_kinds.is_empty() || self.table_kinds.contains(&table.kind))
            && self.has_relationships.map_or(true, |wanted| wanted == connected)
            && self.row_count.contains(table.row_count_or_zero())
            && self.column_count.contains(table.column_count() as u64)
    }

    /// Produce the filtered ontology. The input is left untouched.
    pub fn apply(&self, ontology: &Ontology) -> Ontology {
        // Participation is judged against the unfiltered relationship set
        let connected: HashSet<(&str, &str)> = ontology
            .relationships
            .iter()
            .flat_map(|rel| {
                [
                    (rel.source_database.as_str(), rel.source_table.as_str()),
                    (rel.target_database.as_str(), rel.target_table.as_str()),
                ]
            })
            .collect();

        let databases: Vec<Database> = ontology
            .databases
            .iter()
            .filter(|db| self.keeps_database(db))
            .filter_map(|db| {
                let tables: Vec<Table> = db
                    .tables
                    .iter()
                    .filter(|t| {
                        self.keeps_table(t, connected.contains(&(db.name.as_str(), t.name.as_str())))
                    })
                    .cloned()
                    .collect();
                if tables.is_empty() {
                    return None;
                }
                Some(Database {
                    name: db.name.clone(),
                    host: db.host.clone(),
                    port: db.port,
                    tables,
                    character_set: db.character_set.clone(),
                    collation: db.collation.clone(),
                })
            })
            .collect();

        let surviving: HashSet<(&str, &str)> = databases
            .iter()
            .flat_map(|db| db.tables.iter().map(move |t| (db.name.as_str(), t.name.as_str())))
            .collect();

        let relationships = ontology
            .relationships
            .iter()
            .filter(|rel| {
                surviving.contains(&(rel.source_database.as_str(), rel.source_table.as_str()))
                    && surviving.contains(&(rel.target_database.as_str(), rel.target_table.as_str()))
            })
            .cloned()
            .collect::<Vec<_>>();

        let mut metadata = OntologyMetadata::for_contents(&databases, &relationships);
        metadata.extraction_date = ontology.metadata.extraction_date;
        metadata.unresolved_foreign_keys = ontology.metadata.unresolved_foreign_keys;
        metadata.extra = ontology.metadata.extra.clone();

        debug!(
            databases = metadata.database_count,
            tables = metadata.table_count,
            relationships = metadata.relationship_count,
            "Filtered ontology"
        );

        Ontology {
            databases,
            relationships,
            metadata,
        }
    }
}

/// Apply `filter` to `ontology`.
pub fn filter(ontology: &Ontology, filter: &OntologyFilter) -> Ontology {
    filter.apply(ontology)
}
