//! Adapter interfaces for external systems.
//!
//! Two collaborators live outside the catalog core:
//! - Metadata providers (ISBN lookup services, reached over HTTP)
//! - Image normalizers (page dewarping, run as a subprocess)

pub mod dewarp;
pub mod google_books;
pub mod open_library;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::DexError;

pub use dewarp::PageDewarpNormalizer;
pub use google_books::GoogleBooksProvider;
pub use open_library::OpenLibraryProvider;

/// Default timeout for a single provider request
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Flat record returned by a metadata provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub title: String,

    /// Author names, "First Last"
    pub authors: Vec<String>,

    /// Raw publication date text; the year is parsed out later
    pub year: String,

    pub publisher: String,

    pub isbn_13: String,
}

/// Errors that can occur during a provider lookup
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider}: no record for {isbn}")]
    NotFound { provider: String, isbn: String },

    #[error("{provider}: request failed: {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider}: malformed response: {reason}")]
    Malformed { provider: String, reason: String },

    #[error("all providers failed: {}", .0.join("; "))]
    Exhausted(Vec<String>),
}

/// Trait for ISBN metadata services
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Look up one canonical ISBN-13
    async fn lookup(&self, isbn: &str) -> Result<ProviderRecord, ProviderError>;
}

/// Tries providers in order and returns the first record found
pub struct FallbackProvider {
    providers: Vec<Arc<dyn MetadataProvider>>,
}

impl FallbackProvider {
    pub fn new(providers: Vec<Arc<dyn MetadataProvider>>) -> Self {
        Self { providers }
    }

    /// Google Books, then Open Library
    pub fn default_chain(timeout: Duration) -> Self {
        Self::new(vec![
            Arc::new(GoogleBooksProvider::new(timeout)),
            Arc::new(OpenLibraryProvider::new(timeout)),
        ])
    }
}

#[async_trait]
impl MetadataProvider for FallbackProvider {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn lookup(&self, isbn: &str) -> Result<ProviderRecord, ProviderError> {
        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.lookup(isbn).await {
                Ok(record) => return Ok(record),
                Err(e) => {
                    debug!(provider = provider.name(), isbn, error = %e, "Provider lookup failed");
                    failures.push(e.to_string());
                }
            }
        }
        Err(ProviderError::Exhausted(failures))
    }
}

/// Trait for page dewarping backends.
///
/// Called from blocking batch workers, so the interface is synchronous.
pub trait ImageNormalizer: Send + Sync {
    /// Human-readable normalizer name
    fn name(&self) -> &str;

    /// Normalize `input`, writing `<output_dir>/<basename>`.
    ///
    /// `output_dir` defaults to the `dewarped/` sibling of the input's
    /// parent, created if absent. Returns the path written.
    fn normalize(&self, input: &Path, output_dir: Option<&Path>) -> Result<PathBuf, DexError>;
}
