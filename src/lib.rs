//! # ontomap
//!
//! Discovers the structure of relational databases and maps it into a
//! single queryable ontology graph.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        MetadataSource (catalog dumps, cache, ...)        │
//! │        one RawDatabaseRecord per configured database     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [builder: normalize, then resolve]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Ontology (model types)                  │
//! │    databases → tables → columns/indexes/foreign keys     │
//! │    + cross-database relationships + metadata             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!          ┌───────────────┼────────────────┐
//!          ▼               ▼                ▼
//!   OntologyIndex    OntologyFilter    SearchIndex
//!   (lookups, lineage,  (derived         (name
//!    paths, cycles)     ontology)         search)
//!                          │
//!                          ▼ [snapshot, CLI, HTTP API]
//! ```

pub mod cache;
pub mod config;
pub mod metadata;
pub mod model;
pub mod observability;
pub mod ontology;
pub mod snapshot;

#[cfg(feature = "server")]
pub mod web;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{DatabaseSettings, Settings};
    pub use crate::metadata::{
        extract, JsonMetadataSource, MetadataSource, RawColumnRow, RawDatabaseRecord,
        RawForeignKeyRow, RawIndexRow, RawTableRow,
    };
    pub use crate::model::{
        Column, Database, ForeignKey, Index, KeyRole, Ontology, Relationship, Table, TableKind,
        TableRef,
    };
    pub use crate::ontology::{
        build, filter, search, traverse, CountRange, Direction, Lineage, OntologyBuilder,
        OntologyFilter, OntologyIndex, OntologyStats, QueryError,
    };
}
