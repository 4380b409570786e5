//! Read-only lookup structures derived from an [`Ontology`].
//!
//! An [`OntologyIndex`] owns the ontology it was built from. It is never
//! updated in place: a filtered ontology gets its own index.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use thiserror::Error;

use crate::model::{Database, Ontology, Relationship, Table, TableRef};

/// Errors that can occur during ontology queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    #[error("Table not found: {0}")]
    TableNotFound(TableRef),

    #[error("Invalid depth {0}: must be at least 1")]
    InvalidDepth(usize),

    #[error("No path found from {from} to {to}")]
    NoPathFound { from: TableRef, to: TableRef },
}

pub type QueryResult<T> = Result<T, QueryError>;

/// One hop of a path between two tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathStep<'a> {
    pub from: TableRef,
    pub to: TableRef,
    pub relationship: &'a Relationship,
    /// True when the hop follows the foreign key from its owner to the
    /// referenced table
    pub forward: bool,
}

struct TableSlot {
    database: usize,
    table: usize,
    /// Positions in `Ontology::relationships`
    outgoing: Vec<usize>,
    incoming: Vec<usize>,
    node: NodeIndex,
}

/// Hash-keyed view of an ontology.
///
/// Built once per ontology and shared freely: the index holds the ontology
/// behind an [`Arc`] and refers to tables and relationships by position.
/// Adjacency lists keep the ontology's relationship order, which makes
/// every traversal built on top of them deterministic.
pub struct OntologyIndex {
    ontology: Arc<Ontology>,
    databases: HashMap<String, usize>,
    tables: HashMap<String, HashMap<String, usize>>,
    slots: Vec<TableSlot>,
    /// Node weight: slot position. Edge weight: relationship position.
    graph: DiGraph<usize, usize>,
}

impl OntologyIndex {
    pub fn new(ontology: impl Into<Arc<Ontology>>) -> Self {
        let ontology = ontology.into();
        let mut databases = HashMap::with_capacity(ontology.databases.len());
        let mut tables: HashMap<String, HashMap<String, usize>> = HashMap::new();
        let mut slots = Vec::with_capacity(ontology.table_count());
        let mut graph = DiGraph::new();

        for (db_pos, database) in ontology.databases.iter().enumerate() {
            databases.insert(database.name.clone(), db_pos);
            let by_name = tables.entry(database.name.clone()).or_default();
            for (table_pos, table) in database.tables.iter().enumerate() {
                let slot = slots.len();
                slots.push(TableSlot {
                    database: db_pos,
                    table: table_pos,
                    outgoing: Vec::new(),
                    incoming: Vec::new(),
                    node: graph.add_node(slot),
                });
                by_name.insert(table.name.clone(), slot);
            }
        }

        let lookup = |db: &str, table: &str| tables.get(db).and_then(|t| t.get(table)).copied();

        for (position, rel) in ontology.relationships.iter().enumerate() {
            // Hand-assembled ontologies may carry edges to unknown tables;
            // those cannot be navigated and are left out
            let (Some(source), Some(target)) = (
                lookup(&rel.source_database, &rel.source_table),
                lookup(&rel.target_database, &rel.target_table),
            ) else {
                continue;
            };
            slots[source].outgoing.push(position);
            slots[target].incoming.push(position);
            graph.add_edge(slots[source].node, slots[target].node, position);
        }

        Self {
            ontology,
            databases,
            tables,
            slots,
            graph,
        }
    }

    /// The ontology this index was built from.
    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    /// A shared handle to the indexed ontology.
    pub fn shared(&self) -> Arc<Ontology> {
        Arc::clone(&self.ontology)
    }

    pub fn database(&self, name: &str) -> QueryResult<&Database> {
        self.databases
            .get(name)
            .map(|&pos| &self.ontology.databases[pos])
            .ok_or_else(|| QueryError::DatabaseNotFound(name.to_string()))
    }

    pub fn table(&self, database: &str, table: &str) -> QueryResult<&Table> {
        self.slot(database, table)
            .map(|slot| &self.ontology.databases[slot.database].tables[slot.table])
    }

    pub fn contains_table(&self, database: &str, table: &str) -> bool {
        self.position(database, table).is_some()
    }

    /// Relationships where the table owns the foreign key.
    pub fn outgoing(&self, database: &str, table: &str) -> QueryResult<Vec<&Relationship>> {
        self.slot(database, table)
            .map(|slot| self.relationships(&slot.outgoing))
    }

    /// Relationships where the table is referenced.
    pub fn incoming(&self, database: &str, table: &str) -> QueryResult<Vec<&Relationship>> {
        self.slot(database, table)
            .map(|slot| self.relationships(&slot.incoming))
    }

    fn relationships(&self, positions: &[usize]) -> Vec<&Relationship> {
        positions
            .iter()
            .map(|&pos| &self.ontology.relationships[pos])
            .collect()
    }

    fn position(&self, database: &str, table: &str) -> Option<usize> {
        self.tables.get(database)?.get(table).copied()
    }

    fn slot(&self, database: &str, table: &str) -> QueryResult<&TableSlot> {
        self.position(database, table)
            .map(|p| &self.slots[p])
            .ok_or_else(|| QueryError::TableNotFound(TableRef::new(database, table)))
    }

    fn table_ref(&self, slot: usize) -> TableRef {
        let slot = &self.slots[slot];
        let database = &self.ontology.databases[slot.database];
        TableRef::new(&database.name, &database.tables[slot.table].name)
    }

    /// Shortest chain of relationships between two tables, following
    /// foreign keys in either direction.
    pub fn find_path(&self, from: &TableRef, to: &TableRef) -> QueryResult<Vec<PathStep<'_>>> {
        let from_slot = self
            .position(&from.database, &from.table)
            .ok_or_else(|| QueryError::TableNotFound(from.clone()))?;
        let to_slot = self
            .position(&to.database, &to.table)
            .ok_or_else(|| QueryError::TableNotFound(to.clone()))?;

        // BFS to find shortest path
        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        let mut parent: HashMap<usize, (usize, &Relationship, bool)> = HashMap::new();

        queue.push_back(from_slot);
        visited.insert(from_slot);

        while let Some(current) = queue.pop_front() {
            if current == to_slot {
                return Ok(self.reconstruct_path(from_slot, to_slot, &parent));
            }

            let slot = &self.slots[current];
            let forward = slot.outgoing.iter().map(|&pos| (pos, true));
            let backward = slot.incoming.iter().map(|&pos| (pos, false));
            for (pos, is_forward) in forward.chain(backward) {
                let rel = &self.ontology.relationships[pos];
                let neighbor = if is_forward {
                    self.position(&rel.target_database, &rel.target_table)
                } else {
                    self.position(&rel.source_database, &rel.source_table)
                };
                let Some(neighbor) = neighbor else { continue };
                if visited.insert(neighbor) {
                    parent.insert(neighbor, (current, rel, is_forward));
                    queue.push_back(neighbor);
                }
            }
        }

        Err(QueryError::NoPathFound {
            from: from.clone(),
            to: to.clone(),
        })
    }

    fn reconstruct_path<'a>(
        &self,
        from_slot: usize,
        to_slot: usize,
        parent: &HashMap<usize, (usize, &'a Relationship, bool)>,
    ) -> Vec<PathStep<'a>> {
        let mut steps = Vec::new();
        let mut current = to_slot;

        // Walk backward from target to source
        while current != from_slot {
            let Some(&(prev, relationship, forward)) = parent.get(&current) else {
                break;
            };
            steps.push(PathStep {
                from: self.table_ref(prev),
                to: self.table_ref(current),
                relationship,
                forward,
            });
            current = prev;
        }

        steps.reverse();
        steps
    }

    /// Groups of tables whose foreign keys form a cycle.
    ///
    /// Each group is sorted, and groups are ordered by their first table.
    /// A table referencing itself forms a group of one.
    pub fn cycles(&self) -> Vec<Vec<TableRef>> {
        let mut groups: Vec<Vec<TableRef>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => self.graph.contains_edge(*single, *single),
                _ => true,
            })
            .map(|component| {
                let mut group: Vec<TableRef> = component
                    .into_iter()
                    .map(|node| self.table_ref(self.graph[node]))
                    .collect();
                group.sort();
                group
            })
            .collect();
        groups.sort();
        groups
    }
}
