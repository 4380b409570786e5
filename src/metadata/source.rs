//! MetadataSource trait definition.
//!
//! A MetadataSource returns the raw catalog rows of one configured
//! database. How the rows are obtained (live catalog queries, dump files,
//! a cache) is up to the implementation.

use std::path::PathBuf;

use async_trait::async_trait;

use super::types::RawDatabaseRecord;
use crate::cache::CacheError;
use crate::config::DatabaseSettings;

/// Errors that can occur while fetching catalog metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("No catalog dump for database '{database}' at {path}")]
    DumpNotFound { database: String, path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog dump {path}: {source}")]
    InvalidDump {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Catalog dump {path} describes database '{found}', expected '{expected}'")]
    NameMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Metadata unavailable for {0}")]
    Unavailable(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Trait for fetching raw catalog metadata.
///
/// # Example
///
/// ```ignore
/// use ontomap::metadata::{JsonMetadataSource, MetadataSource};
///
/// let source = JsonMetadataSource::new("./catalog");
/// let record = source.fetch(&settings.databases[0]).await?;
/// ```
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch every catalog row of one database.
    async fn fetch(&self, database: &DatabaseSettings) -> MetadataResult<RawDatabaseRecord>;

    /// Fetch several databases.
    ///
    /// Default implementation fetches in parallel using `join_all`; results
    /// come back in input order, one per database.
    async fn fetch_all(
        &self,
        databases: &[DatabaseSettings],
    ) -> Vec<MetadataResult<RawDatabaseRecord>> {
        let futures: Vec<_> = databases.iter().map(|db| self.fetch(db)).collect();
        futures::future::join_all(futures).await
    }
}
