//! On-disk cache of ISBN metadata.
//!
//! One JSON file per identifier, named `<isbn13>.json`. A readable entry
//! answers the lookup without touching the network. Entries are only
//! written after the provider's record validates, and writes go through a
//! temporary file that is renamed over the destination, so a crash leaves
//! either the old entry or the new one.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::adapters::MetadataProvider;
use crate::config::paths;
use crate::domain::{BookIdentifier, BookMetadata};
use crate::error::DexError;

/// Whether the cache directory is consulted at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read entries first, write entries after a provider hit
    #[default]
    Enabled,

    /// Always ask the provider; never read or write cache files
    Bypass,
}

/// Metadata lookup backed by a cache directory and a provider
pub struct MetadataCache {
    dir: PathBuf,
    provider: Arc<dyn MetadataProvider>,
    mode: CacheMode,
}

impl MetadataCache {
    pub fn new(dir: impl Into<PathBuf>, provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            dir: dir.into(),
            provider,
            mode: CacheMode::Enabled,
        }
    }

    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    /// Path of the entry for `id`
    pub fn entry_path(&self, id: &BookIdentifier) -> PathBuf {
        paths::cache_entry(&self.dir, id)
    }

    /// Create the cache directory if needed. Safe to call repeatedly.
    pub async fn ensure_dir(&self) -> Result<(), DexError> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            DexError::Configuration(format!(
                "cannot create cache directory {}: {}",
                self.dir.display(),
                e
            ))
        })
    }

    /// Resolve metadata, from the cache when possible
    #[instrument(skip(self), fields(isbn = %id))]
    pub async fn get(&self, id: &BookIdentifier) -> Result<BookMetadata, DexError> {
        if self.mode == CacheMode::Enabled {
            if let Some(cached) = self.lookup_cached(id).await {
                debug!("Cache hit");
                return Ok(cached);
            }
        }

        let unavailable = |reason: String| DexError::MetadataUnavailable {
            identifier: id.clone(),
            reason,
        };

        let record = self
            .provider
            .lookup(id.as_str())
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let metadata = BookMetadata::from_record(record).map_err(|e| unavailable(e.to_string()))?;
        info!(provider = self.provider.name(), "Fetched metadata");

        if self.mode == CacheMode::Enabled {
            if let Err(e) = self.store(id, &metadata).await {
                warn!(error = %e, "Failed to write cache entry");
            }
        }

        Ok(metadata)
    }

    /// Read a cache entry without falling back to the provider.
    ///
    /// Missing and unreadable entries both come back as `None`; a corrupt
    /// entry is logged and left for the next successful fetch to replace.
    pub async fn lookup_cached(&self, id: &BookIdentifier) -> Option<BookMetadata> {
        if self.mode == CacheMode::Bypass {
            return None;
        }

        let path = self.entry_path(id);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable cache entry");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt cache entry, ignoring");
                None
            }
        }
    }

    /// Write an entry with replace-or-nothing semantics
    pub async fn store(&self, id: &BookIdentifier, metadata: &BookMetadata) -> Result<PathBuf, DexError> {
        if self.mode == CacheMode::Bypass {
            return Ok(self.entry_path(id));
        }

        self.ensure_dir().await?;
        let dir = self.dir.clone();
        let path = self.entry_path(id);
        let content = serde_json::to_vec_pretty(metadata)?;

        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, &content).map(|_| path))
            .await
            .map_err(|e| DexError::Io(std::io::Error::other(e)))?
    }

    /// Drop the entry for `id`, if any. A bypassing cache removes nothing.
    pub async fn invalidate(&self, id: &BookIdentifier) -> Result<bool, DexError> {
        if self.mode == CacheMode::Bypass {
            return Ok(false);
        }

        match fs::remove_file(self.entry_path(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn write_atomic(dir: &Path, path: &Path, content: &[u8]) -> Result<(), DexError> {
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| DexError::Io(e.error))?;
    Ok(())
}
