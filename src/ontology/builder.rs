//! Ontology construction from raw catalog records.
//!
//! Construction happens in two phases:
//! - Phase 1: normalize every database on its own (tables, columns,
//!   indexes, foreign keys, primary keys)
//! - Phase 2: resolve foreign keys into relationships against the complete
//!   set of databases, so a database may reference one configured after it

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::metadata::{
    RawColumnRow, RawDatabaseRecord, RawForeignKeyRow, RawIndexRow, RawTableRow,
};
use crate::model::{
    Column, Database, ForeignKey, Index, KeyRole, Ontology, OntologyMetadata, Relationship, Table,
    TableKind, TableRef, FOREIGN_KEY_RELATIONSHIP,
};

/// Catalog name of the index backing the primary key.
const PRIMARY_INDEX: &str = "PRIMARY";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that abort a build call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("Duplicate database name '{name}': configured as {first} and {second}")]
    DuplicateDatabase {
        name: String,
        first: String,
        second: String,
    },

    #[error("Duplicate table: {database}.{table}")]
    DuplicateTable { database: String, table: String },

    #[error("Duplicate column: {database}.{table}.{column}")]
    DuplicateColumn {
        database: String,
        table: String,
        column: String,
    },
}

pub type BuildResult<T> = Result<T, BuildError>;

// ============================================================================
// Diagnostics
// ============================================================================

/// Why a foreign key produced no relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// Referenced database is not part of this extraction
    UnknownDatabase,
    /// Referenced database is known but has no such table
    UnknownTable,
    /// Referenced table has no such column
    UnknownColumn,
    /// The owning column is missing from its own table
    UnknownSourceColumn,
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnresolvedReason::UnknownDatabase => write!(f, "unknown database"),
            UnresolvedReason::UnknownTable => write!(f, "unknown table"),
            UnresolvedReason::UnknownColumn => write!(f, "unknown column"),
            UnresolvedReason::UnknownSourceColumn => write!(f, "unknown source column"),
        }
    }
}

/// A foreign key that was dropped from the relationship set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedForeignKey {
    pub source: TableRef,
    pub constraint_name: String,
    pub column_name: String,
    pub referenced_database: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub reason: UnresolvedReason,
}

impl std::fmt::Display for UnresolvedForeignKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}.{} ({}, constraint {})",
            self.source,
            self.column_name,
            self.referenced_database,
            self.referenced_table,
            self.referenced_column,
            self.reason,
            self.constraint_name
        )
    }
}

/// Non-fatal findings collected while building.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub unresolved: Vec<UnresolvedForeignKey>,
    /// Foreign-key rows repeated under the same constraint and column
    pub duplicate_foreign_keys: usize,
    /// Column, index and foreign-key rows naming a table the catalog did not list
    pub orphan_rows: usize,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.duplicate_foreign_keys == 0 && self.orphan_rows == 0
    }
}

// ============================================================================
// Construction Entry Point
// ============================================================================

/// Assembles an [`Ontology`] from one raw record per configured database.
#[derive(Debug, Clone, Default)]
pub struct OntologyBuilder {
    extracted_at: Option<DateTime<Utc>>,
}

impl OntologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the extraction timestamp instead of using the current time.
    pub fn extracted_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.extracted_at = Some(timestamp);
        self
    }

    pub fn build(&self, records: &[RawDatabaseRecord]) -> BuildResult<Ontology> {
        self.build_with_report(records).map(|(ontology, _)| ontology)
    }

    /// Build the ontology and return the diagnostics gathered along the way.
    pub fn build_with_report(
        &self,
        records: &[RawDatabaseRecord],
    ) -> BuildResult<(Ontology, BuildReport)> {
        check_unique_names(records)?;

        let mut report = BuildReport::default();

        // Phase 1: normalize each database independently
        let databases = records
            .iter()
            .map(|record| normalize_database(record, &mut report))
            .collect::<BuildResult<Vec<_>>>()?;

        // Phase 2: resolve edges once every database is known
        let relationships = resolve_relationships(&databases, &mut report);

        let mut metadata = OntologyMetadata::for_contents(&databases, &relationships);
        metadata.extraction_date = Some(self.extracted_at.unwrap_or_else(Utc::now));
        metadata.unresolved_foreign_keys = report.unresolved.len();

        info!(
            databases = metadata.database_count,
            tables = metadata.table_count,
            columns = metadata.column_count,
            relationships = metadata.relationship_count,
            unresolved = metadata.unresolved_foreign_keys,
            "Built ontology"
        );

        Ok((
            Ontology {
                databases,
                relationships,
                metadata,
            },
            report,
        ))
    }
}

/// Build an ontology stamped with the current time.
pub fn build(records: &[RawDatabaseRecord]) -> BuildResult<Ontology> {
    OntologyBuilder::new().build(records)
}

fn check_unique_names(records: &[RawDatabaseRecord]) -> BuildResult<()> {
    let mut seen: HashMap<&str, &RawDatabaseRecord> = HashMap::new();
    for record in records {
        if let Some(first) = seen.insert(record.name.as_str(), record) {
            return Err(BuildError::DuplicateDatabase {
                name: record.name.clone(),
                first: first.display_name(),
                second: record.display_name(),
            });
        }
    }
    Ok(())
}

// ============================================================================
// Phase 1: Normalization
// ============================================================================

fn group_by_table<'a, T, F>(rows: &'a [T], table_name: F) -> HashMap<&'a str, Vec<&'a T>>
where
    F: Fn(&'a T) -> &'a str,
{
    let mut grouped: HashMap<&'a str, Vec<&'a T>> = HashMap::new();
    for row in rows {
        grouped.entry(table_name(row)).or_default().push(row);
    }
    grouped
}

fn normalize_database(
    record: &RawDatabaseRecord,
    report: &mut BuildReport,
) -> BuildResult<Database> {
    let mut table_rows: Vec<&RawTableRow> = record.tables.iter().collect();
    table_rows.sort_by(|a, b| a.table_name.cmp(&b.table_name));

    let mut columns = group_by_table(&record.columns, |row| row.table_name.as_str());
    let mut indexes = group_by_table(&record.indexes, |row| row.table_name.as_str());
    let mut foreign_keys = group_by_table(&record.foreign_keys, |row| row.table_name.as_str());

    let mut tables: Vec<Table> = Vec::with_capacity(table_rows.len());
    for row in table_rows {
        if tables.last().is_some_and(|prev| prev.name == row.table_name) {
            return Err(BuildError::DuplicateTable {
                database: record.name.clone(),
                table: row.table_name.clone(),
            });
        }

        let name = row.table_name.as_str();
        let table = normalize_table(
            &record.name,
            row,
            columns.remove(name).unwrap_or_default(),
            indexes.remove(name).unwrap_or_default(),
            foreign_keys.remove(name).unwrap_or_default(),
            report,
        )?;
        tables.push(table);
    }

    // Whatever is left refers to tables the catalog did not list
    let orphans = columns.values().map(Vec::len).sum::<usize>()
        + indexes.values().map(Vec::len).sum::<usize>()
        + foreign_keys.values().map(Vec::len).sum::<usize>();
    if orphans > 0 {
        warn!(
            database = %record.name,
            orphan_rows = orphans,
            "Skipping catalog rows for unlisted tables"
        );
        report.orphan_rows += orphans;
    }

    debug!(database = %record.display_name(), tables = tables.len(), "Normalized database");

    Ok(Database {
        name: record.name.clone(),
        host: record.host.clone(),
        port: record.port,
        tables,
        character_set: non_empty(record.character_set.as_deref()),
        collation: non_empty(record.collation.as_deref()),
    })
}

fn normalize_table(
    database: &str,
    row: &RawTableRow,
    mut column_rows: Vec<&RawColumnRow>,
    index_rows: Vec<&RawIndexRow>,
    fk_rows: Vec<&RawForeignKeyRow>,
    report: &mut BuildReport,
) -> BuildResult<Table> {
    column_rows.sort_by_key(|c| c.ordinal_position);

    let mut names = HashSet::new();
    let mut columns = Vec::with_capacity(column_rows.len());
    for raw in &column_rows {
        if !names.insert(raw.column_name.as_str()) {
            return Err(BuildError::DuplicateColumn {
                database: database.to_string(),
                table: row.table_name.clone(),
                column: raw.column_name.clone(),
            });
        }
        columns.push(normalize_column(raw));
    }

    Ok(Table {
        name: row.table_name.clone(),
        kind: TableKind::parse(&row.table_type),
        engine: non_empty(row.engine.as_deref()),
        row_count: row.table_rows,
        data_length: row.data_length,
        index_length: row.index_length,
        comment: non_empty(row.table_comment.as_deref()),
        primary_key_columns: primary_key_columns(&column_rows),
        indexes: normalize_indexes(index_rows),
        foreign_keys: normalize_foreign_keys(database, fk_rows, report),
        columns,
    })
}

fn normalize_column(raw: &RawColumnRow) -> Column {
    Column {
        name: raw.column_name.clone(),
        data_type: raw.data_type.clone(),
        is_nullable: raw.nullable(),
        default_value: raw.column_default.clone(),
        character_maximum_length: raw.character_maximum_length,
        numeric_precision: raw.numeric_precision,
        numeric_scale: raw.numeric_scale,
        key_role: raw.column_key.as_deref().and_then(KeyRole::from_catalog),
        extra: non_empty(raw.extra.as_deref()),
        comment: non_empty(raw.column_comment.as_deref()),
    }
}

/// Primary-key columns in key order. Catalogs that do not report a key
/// ordinal fall back to column order.
fn primary_key_columns(column_rows: &[&RawColumnRow]) -> Vec<String> {
    let mut keyed: Vec<(u32, &str)> = column_rows
        .iter()
        .filter(|c| c.column_key.as_deref().and_then(KeyRole::from_catalog) == Some(KeyRole::Primary))
        .map(|c| (c.key_ordinal.unwrap_or(c.ordinal_position), c.column_name.as_str()))
        .collect();
    keyed.sort_by_key(|(ordinal, _)| *ordinal);
    keyed.into_iter().map(|(_, name)| name.to_string()).collect()
}

fn normalize_indexes(rows: Vec<&RawIndexRow>) -> Vec<Index> {
    let mut grouped: BTreeMap<&str, Vec<&RawIndexRow>> = BTreeMap::new();
    for row in rows {
        if row.index_name.eq_ignore_ascii_case(PRIMARY_INDEX) {
            continue;
        }
        grouped.entry(row.index_name.as_str()).or_default().push(row);
    }

    grouped
        .into_iter()
        .map(|(name, mut parts)| {
            parts.sort_by_key(|p| p.seq_in_index);
            Index {
                name: name.to_string(),
                column_names: parts.iter().map(|p| p.column_name.clone()).collect(),
                is_unique: parts.iter().all(|p| !p.non_unique),
                index_type: parts
                    .first()
                    .map(|p| p.index_type.clone())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

fn normalize_foreign_keys(
    database: &str,
    mut rows: Vec<&RawForeignKeyRow>,
    report: &mut BuildReport,
) -> Vec<ForeignKey> {
    rows.sort_by(|a, b| {
        (a.constraint_name.as_str(), a.ordinal_position)
            .cmp(&(b.constraint_name.as_str(), b.ordinal_position))
    });

    let mut seen = HashSet::new();
    let mut foreign_keys = Vec::with_capacity(rows.len());
    for row in rows {
        if !seen.insert((row.constraint_name.as_str(), row.column_name.as_str())) {
            debug!(
                database,
                table = %row.table_name,
                constraint = %row.constraint_name,
                column = %row.column_name,
                "Dropping repeated foreign-key row"
            );
            report.duplicate_foreign_keys += 1;
            continue;
        }
        foreign_keys.push(ForeignKey {
            constraint_name: row.constraint_name.clone(),
            column_name: row.column_name.clone(),
            referenced_database: row.referenced_table_schema.clone(),
            referenced_table: row.referenced_table_name.clone(),
            referenced_column: row.referenced_column_name.clone(),
            update_rule: non_empty(row.update_rule.as_deref()),
            delete_rule: non_empty(row.delete_rule.as_deref()),
        });
    }
    foreign_keys
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Phase 2: Relationship Resolution
// ============================================================================

fn resolve_relationships(databases: &[Database], report: &mut BuildReport) -> Vec<Relationship> {
    let lookup: HashMap<&str, HashMap<&str, &Table>> = databases
        .iter()
        .map(|db| {
            let tables = db.tables.iter().map(|t| (t.name.as_str(), t)).collect();
            (db.name.as_str(), tables)
        })
        .collect();

    let mut relationships = Vec::new();
    for database in databases {
        for table in &database.tables {
            for fk in &table.foreign_keys {
                let reason = if !table.has_column(&fk.column_name) {
                    Some(UnresolvedReason::UnknownSourceColumn)
                } else {
                    match lookup.get(fk.referenced_database.as_str()) {
                        None => Some(UnresolvedReason::UnknownDatabase),
                        Some(tables) => match tables.get(fk.referenced_table.as_str()) {
                            None => Some(UnresolvedReason::UnknownTable),
                            Some(target) if !target.has_column(&fk.referenced_column) => {
                                Some(UnresolvedReason::UnknownColumn)
                            }
                            Some(_) => None,
                        },
                    }
                };

                if let Some(reason) = reason {
                    let unresolved = UnresolvedForeignKey {
                        source: TableRef::new(&database.name, &table.name),
                        constraint_name: fk.constraint_name.clone(),
                        column_name: fk.column_name.clone(),
                        referenced_database: fk.referenced_database.clone(),
                        referenced_table: fk.referenced_table.clone(),
                        referenced_column: fk.referenced_column.clone(),
                        reason,
                    };
                    // Databases left out of the run are expected; anything else
                    // points at an inconsistent catalog
                    if reason == UnresolvedReason::UnknownDatabase {
                        debug!(foreign_key = %unresolved, "Skipping foreign key");
                    } else {
                        warn!(foreign_key = %unresolved, "Skipping foreign key");
                    }
                    report.unresolved.push(unresolved);
                    continue;
                }

                relationships.push(Relationship {
                    source_database: database.name.clone(),
                    source_table: table.name.clone(),
                    source_column: fk.column_name.clone(),
                    target_database: fk.referenced_database.clone(),
                    target_table: fk.referenced_table.clone(),
                    target_column: fk.referenced_column.clone(),
                    constraint_name: fk.constraint_name.clone(),
                    relationship_type: FOREIGN_KEY_RELATIONSHIP.to_string(),
                });
            }
        }
    }
    relationships
}
