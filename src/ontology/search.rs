//! Case-insensitive substring search over entity names.
//!
//! Catalogs are small, so matching is a plain scan over lowercased names
//! prepared once per [`SearchIndex`].

use serde::Serialize;

use crate::model::{Ontology, TableKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseHit {
    pub database: String,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableHit {
    pub database: String,
    pub table: String,
    #[serde(rename = "type")]
    pub kind: TableKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnHit {
    pub database: String,
    pub table: String,
    pub column: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

/// Hits grouped by entity type, each in ontology order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub databases: Vec<DatabaseHit>,
    pub tables: Vec<TableHit>,
    pub columns: Vec<ColumnHit>,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.databases.len() + self.tables.len() + self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Entry<T> {
    key: String,
    hit: T,
}

impl<T: Clone> Entry<T> {
    fn new(name: &str, hit: T) -> Self {
        Self {
            key: name.to_lowercase(),
            hit,
        }
    }
}

fn matching<T: Clone>(entries: &[Entry<T>], needle: &str) -> Vec<T> {
    entries
        .iter()
        .filter(|entry| entry.key.contains(needle))
        .map(|entry| entry.hit.clone())
        .collect()
}

/// Prepared search over one ontology.
pub struct SearchIndex {
    databases: Vec<Entry<DatabaseHit>>,
    tables: Vec<Entry<TableHit>>,
    columns: Vec<Entry<ColumnHit>>,
}

impl SearchIndex {
    pub fn new(ontology: &Ontology) -> Self {
        let mut databases = Vec::with_capacity(ontology.databases.len());
        let mut tables = Vec::with_capacity(ontology.table_count());
        let mut columns = Vec::with_capacity(ontology.column_count());

        for db in &ontology.databases {
            databases.push(Entry::new(
                &db.name,
                DatabaseHit {
                    database: db.name.clone(),
                    host: db.host.clone(),
                },
            ));
            for table in &db.tables {
                tables.push(Entry::new(
                    &table.name,
                    TableHit {
                        database: db.name.clone(),
                        table: table.name.clone(),
                        kind: table.kind.clone(),
                    },
                ));
                for column in &table.columns {
                    columns.push(Entry::new(
                        &column.name,
                        ColumnHit {
                            database: db.name.clone(),
                            table: table.name.clone(),
                            column: column.name.clone(),
                            data_type: column.data_type.clone(),
                        },
                    ));
                }
            }
        }

        Self {
            databases,
            tables,
            columns,
        }
    }

    /// Entities whose name contains `query`, ignoring case. An empty query
    /// matches everything.
    pub fn search(&self, query: &str) -> SearchResults {
        let needle = query.to_lowercase();
        SearchResults {
            databases: matching(&self.databases, &needle),
            tables: matching(&self.tables, &needle),
            columns: matching(&self.columns, &needle),
        }
    }
}

/// One-off search without keeping an index around.
pub fn search(ontology: &Ontology, query: &str) -> SearchResults {
    SearchIndex::new(ontology).search(query)
}
