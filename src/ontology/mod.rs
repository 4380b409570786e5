//! The ontology core: construction, indexing, lineage, filtering and search.
//!
//! Everything here is pure and synchronous over an immutable [`Ontology`]
//! value, so any number of readers can query the same snapshot without
//! locking.
//!
//! [`Ontology`]: crate::model::Ontology

pub mod builder;
pub mod filter;
pub mod index;
pub mod lineage;
pub mod search;
pub mod stats;


pub use builder::{
    build, BuildError, BuildReport, BuildResult, OntologyBuilder, UnresolvedForeignKey,
    UnresolvedReason,
};
pub use filter::{filter, CountRange, OntologyFilter};
pub use index::{OntologyIndex, PathStep, QueryError, QueryResult};
pub use lineage::{traverse, Direction, Lineage, LineageLevel};
pub use search::{search, ColumnHit, DatabaseHit, SearchIndex, SearchResults, TableHit};
pub use stats::{DatabaseStats, OntologyStats};
