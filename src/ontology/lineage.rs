//! Bounded-depth lineage traversal.
//!
//! Lineage answers "which tables are upstream or downstream of X within N
//! hops". Downstream follows foreign keys from their owner to the
//! referenced table; upstream walks them backwards, towards the tables that
//! reference X.
//!
//! The search expands one frontier per depth:
//! - a single `visited` set, seeded with the start table, so every table is
//!   reported once at its shortest distance and the start never reappears
//! - with [`Direction::Both`] every frontier table is expanded along its
//!   outgoing and its incoming edges, whichever edge first reached it
//! - within a depth, downstream discoveries are made before upstream ones,
//!   each in frontier order and then relationship order

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::index::{OntologyIndex, QueryError, QueryResult};
use crate::model::TableRef;

/// Which edges a traversal follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Tables that reference the start table
    Upstream,
    /// Tables the start table references
    Downstream,
    #[default]
    Both,
}

impl Direction {
    pub fn includes_upstream(self) -> bool {
        matches!(self, Direction::Upstream | Direction::Both)
    }

    pub fn includes_downstream(self) -> bool {
        matches!(self, Direction::Downstream | Direction::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Upstream => "upstream",
            Direction::Downstream => "downstream",
            Direction::Both => "both",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tables first reached at one hop distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageLevel {
    pub depth: usize,
    pub upstream: Vec<TableRef>,
    pub downstream: Vec<TableRef>,
}

impl LineageLevel {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            upstream: Vec::new(),
            downstream: Vec::new(),
        }
    }

    /// Downstream tables followed by upstream tables.
    pub fn tables(&self) -> impl Iterator<Item = &TableRef> {
        self.downstream.iter().chain(self.upstream.iter())
    }

    pub fn len(&self) -> usize {
        self.upstream.len() + self.downstream.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a lineage traversal.
///
/// `levels` holds only the depths that discovered something, in increasing
/// order. Depths past the end of the search are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lineage {
    pub start: TableRef,
    pub direction: Direction,
    pub max_depth: usize,
    pub levels: Vec<LineageLevel>,
}

impl Lineage {
    pub fn level(&self, depth: usize) -> Option<&LineageLevel> {
        self.levels.iter().find(|level| level.depth == depth)
    }

    /// Every table first reached at `depth`; empty for depths with no discoveries.
    pub fn tables_at(&self, depth: usize) -> Vec<&TableRef> {
        self.level(depth)
            .map(|level| level.tables().collect())
            .unwrap_or_default()
    }

    pub fn upstream(&self) -> impl Iterator<Item = &TableRef> {
        self.levels.iter().flat_map(|level| level.upstream.iter())
    }

    pub fn downstream(&self) -> impl Iterator<Item = &TableRef> {
        self.levels.iter().flat_map(|level| level.downstream.iter())
    }

    pub fn contains(&self, table: &TableRef) -> bool {
        self.levels.iter().any(|level| level.tables().any(|t| t == table))
    }

    /// Number of related tables across all depths.
    pub fn len(&self) -> usize {
        self.levels.iter().map(LineageLevel::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({}, max depth {})",
            self.start, self.direction, self.max_depth
        )?;
        if self.levels.is_empty() {
            return writeln!(f, "  no related tables");
        }
        for level in &self.levels {
            writeln!(f, "  depth {}", level.depth)?;
            if !level.downstream.is_empty() {
                writeln!(f, "    downstream: {}", join(&level.downstream))?;
            }
            if !level.upstream.is_empty() {
                writeln!(f, "    upstream: {}", join(&level.upstream))?;
            }
        }
        Ok(())
    }
}

fn join(tables: &[TableRef]) -> String {
    tables
        .iter()
        .map(TableRef::qualified_name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Collect the tables related to `database.table` within `max_depth` hops.
pub fn traverse(
    index: &OntologyIndex,
    database: &str,
    table: &str,
    direction: Direction,
    max_depth: usize,
) -> QueryResult<Lineage> {
    if max_depth == 0 {
        return Err(QueryError::InvalidDepth(max_depth));
    }
    index.table(database, table)?;

    let start = TableRef::new(database, table);
    let mut visited: HashSet<TableRef> = HashSet::from([start.clone()]);
    let mut levels: Vec<LineageLevel> = Vec::new();
    let mut frontier: Vec<TableRef> = vec![start.clone()];

    for depth in 1..=max_depth {
        let mut level = LineageLevel::new(depth);

        if direction.includes_downstream() {
            for current in &frontier {
                for rel in index.outgoing(&current.database, &current.table)? {
                    let target = rel.target();
                    if visited.insert(target.clone()) {
                        level.downstream.push(target);
                    }
                }
            }
        }
        if direction.includes_upstream() {
            for current in &frontier {
                for rel in index.incoming(&current.database, &current.table)? {
                    let source = rel.source();
                    if visited.insert(source.clone()) {
                        level.upstream.push(source);
                    }
                }
            }
        }

        if level.is_empty() {
            break;
        }
        frontier = level.tables().cloned().collect();
        levels.push(level);
    }

    Ok(Lineage {
        start,
        direction,
        max_depth,
        levels,
    })
}
