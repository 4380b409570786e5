//! File and in-memory metadata sources.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::debug;

use super::source::{MetadataError, MetadataResult, MetadataSource};
use super::types::RawDatabaseRecord;
use crate::config::DatabaseSettings;

/// Reads catalog dumps named `<database>.json` from a directory.
///
/// A dump that leaves `name` or `host` empty inherits them from the
/// database settings.
#[derive(Debug, Clone)]
pub struct JsonMetadataSource {
    dir: PathBuf,
}

impl JsonMetadataSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the dump for a database.
    pub fn dump_path(&self, database: &str) -> PathBuf {
        self.dir.join(format!("{}.json", database))
    }

    /// Write a record where [`fetch`](MetadataSource::fetch) will look for it.
    pub async fn write_dump(&self, record: &RawDatabaseRecord) -> MetadataResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dump_path(&record.name);
        let json = serde_json::to_string_pretty(record).map_err(|source| {
            MetadataError::InvalidDump {
                path: path.clone(),
                source,
            }
        })?;
        tokio::fs::write(&path, json).await?;
        Ok(path)
    }
}

#[async_trait]
impl MetadataSource for JsonMetadataSource {
    async fn fetch(&self, database: &DatabaseSettings) -> MetadataResult<RawDatabaseRecord> {
        let path = self.dump_path(&database.name);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(MetadataError::DumpNotFound {
                    database: database.name.clone(),
                    path,
                });
            }
            Err(err) => return Err(err.into()),
        };

        let mut record: RawDatabaseRecord =
            serde_json::from_str(&content).map_err(|source| MetadataError::InvalidDump {
                path: path.clone(),
                source,
            })?;

        if record.name.is_empty() {
            record.name = database.name.clone();
        } else if record.name != database.name {
            return Err(MetadataError::NameMismatch {
                path,
                expected: database.name.clone(),
                found: record.name,
            });
        }
        if record.host.is_empty() {
            record.host = database.host.clone();
            record.port = database.port;
        }

        debug!(
            path = %path.display(),
            tables = record.tables.len(),
            columns = record.columns.len(),
            "Read catalog dump"
        );
        Ok(record)
    }
}

/// Serves records held in memory, keyed by database name.
#[derive(Debug, Default)]
pub struct StaticMetadataSource {
    records: HashMap<String, RawDatabaseRecord>,
    fetches: AtomicUsize,
}

impl StaticMetadataSource {
    pub fn new(records: impl IntoIterator<Item = RawDatabaseRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.name.clone(), record))
                .collect(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of successful fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MetadataSource for StaticMetadataSource {
    async fn fetch(&self, database: &DatabaseSettings) -> MetadataResult<RawDatabaseRecord> {
        let record = self
            .records
            .get(&database.name)
            .cloned()
            .ok_or_else(|| MetadataError::Unavailable(database.display_name()))?;
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(record)
    }
}
