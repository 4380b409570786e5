//! Entity model for the database ontology.
//!
//! These are plain value types: an [`Ontology`] is assembled once per
//! extraction pass by the builder and is never mutated afterwards. A later
//! extraction produces an entirely new value.

pub mod column;
pub mod database;
pub mod table;

pub use column::{Column, ForeignKey, Index, KeyRole};
pub use database::{
    Database, Ontology, OntologyMetadata, Relationship, TableRef, FOREIGN_KEY_RELATIONSHIP,
};
pub use table::{Table, TableKind};
