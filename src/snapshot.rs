//! Ontology snapshot files.
//!
//! A snapshot is the pretty-printed JSON form of an [`Ontology`]. Writes go
//! through a sibling temporary file and a rename, so readers never observe
//! a half-written snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::model::Ontology;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to access snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SnapshotError + '_ {
    move |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `ontology` to `path`, creating parent directories as needed.
pub fn save(ontology: &Ontology, path: impl AsRef<Path>) -> SnapshotResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }

    let json = serde_json::to_string_pretty(ontology).map_err(|source| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, json).map_err(io_error(&tmp))?;
    fs::rename(&tmp, path).map_err(io_error(path))?;

    info!(
        path = %path.display(),
        databases = ontology.databases.len(),
        relationships = ontology.relationships.len(),
        "Saved ontology snapshot"
    );
    Ok(())
}

/// Read a snapshot written by [`save`].
pub fn load(path: impl AsRef<Path>) -> SnapshotResult<Ontology> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SnapshotError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(io_error(path))?;
    serde_json::from_str(&content).map_err(|source| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    })
}
