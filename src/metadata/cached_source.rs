//! Cache-backed wrapper around any [`MetadataSource`].

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::source::{MetadataResult, MetadataSource};
use super::types::RawDatabaseRecord;
use crate::cache::{CacheKey, CachedEntry, MetadataCache};
use crate::config::DatabaseSettings;

/// Serves records from the metadata cache, falling back to `inner` and
/// storing what it returns.
pub struct CachedMetadataSource<S> {
    inner: S,
    cache: Mutex<MetadataCache>,
    refresh: bool,
}

impl<S: MetadataSource> CachedMetadataSource<S> {
    pub fn new(inner: S, cache: MetadataCache) -> Self {
        Self {
            inner,
            cache: Mutex::new(cache),
            refresh: false,
        }
    }

    /// Always read from `inner`, overwriting cached entries.
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: MetadataSource> MetadataSource for CachedMetadataSource<S> {
    async fn fetch(&self, database: &DatabaseSettings) -> MetadataResult<RawDatabaseRecord> {
        let key = CacheKey::raw(&CacheKey::target(database)?, &database.name);

        if !self.refresh {
            let cached: Option<CachedEntry<RawDatabaseRecord>> =
                self.cache.lock().await.get_entry(&key)?;
            if let Some(entry) = cached {
                debug!(
                    database = %database.display_name(),
                    stored_at = %entry.stored_at,
                    "Metadata cache hit"
                );
                return Ok(entry.value);
            }
        }

        debug!(database = %database.display_name(), "Metadata cache miss");
        let record = self.inner.fetch(database).await?;
        self.cache.lock().await.set(&key, &record)?;
        Ok(record)
    }
}
