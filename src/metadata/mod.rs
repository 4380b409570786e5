//! Metadata source module.
//!
//! This module provides the contract between catalog readers and the
//! ontology builder, plus the extraction pass that connects them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MetadataSource                             │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │  JsonMetadataSource        │  CachedMetadataSource<S>     │  │
//! │  │  (<dir>/<db>.json dumps)   │  (SQLite cache over any S)   │  │
//! │  │  StaticMetadataSource      │                              │  │
//! │  │  (in-memory records)       │                              │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │  RawDatabaseRecord per database
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  extract() -> OntologyBuilder                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ontomap::metadata::{extract, JsonMetadataSource};
//! use ontomap::ontology::OntologyBuilder;
//!
//! let source = JsonMetadataSource::new("./catalog");
//! let extraction = extract(&source, &settings.databases, &OntologyBuilder::new()).await?;
//! println!("{} tables", extraction.ontology.table_count());
//! ```

mod cached_source;
mod extract;
mod json_source;
mod source;
mod types;

pub use cached_source::CachedMetadataSource;
pub use extract::{extract, Extraction, ExtractionFailure};
pub use json_source::{JsonMetadataSource, StaticMetadataSource};
pub use source::{MetadataError, MetadataResult, MetadataSource};
pub use types::*;
