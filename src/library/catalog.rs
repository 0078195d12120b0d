//! The library: every book resolved from a run over the shelves root.
//!
//! Books are kept in scan order. The catalog order is a view computed on
//! demand by [`Library::sorted_items`].

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::book::Book;
use crate::config::ResolvedConfig;
use crate::core::{CacheMode, MetadataCache};
use crate::domain::{resolve_identifier, BookIdentifier, Shelf};
use crate::error::DexError;
use crate::ingest::{ScanOptions, Shelving};

/// A shelf left out of the library, and why
#[derive(Debug)]
pub struct RejectedShelf {
    pub shelf: Shelf,
    pub reason: DexError,
}

/// Books resolved from one scan, plus the shelves that were left out
#[derive(Debug)]
pub struct Library {
    books: Vec<Book>,
    rejected: Vec<RejectedShelf>,
    assembled_at: DateTime<Utc>,
}

impl Library {
    /// Resolve every shelf in order.
    ///
    /// A shelf whose identity or metadata cannot be resolved, or whose
    /// identifier is already taken, is recorded as rejected and the run
    /// continues.
    #[instrument(skip_all)]
    pub async fn assemble<I>(shelves: I, cache: &MetadataCache) -> Self
    where
        I: IntoIterator<Item = Shelf>,
    {
        let mut books: Vec<Book> = Vec::new();
        let mut rejected = Vec::new();
        let mut claimed: HashMap<BookIdentifier, PathBuf> = HashMap::new();

        for shelf in shelves {
            match Self::resolve(&shelf, cache, &claimed).await {
                Ok(book) => {
                    claimed.insert(book.identifier().clone(), shelf.path().to_path_buf());
                    books.push(book);
                }
                Err(reason) => {
                    warn!(
                        shelf = %shelf,
                        kind = reason.kind(),
                        error = %reason,
                        "Omitting shelf"
                    );
                    rejected.push(RejectedShelf { shelf, reason });
                }
            }
        }

        info!(books = books.len(), rejected = rejected.len(), "Assembled library");
        Self {
            books,
            rejected,
            assembled_at: Utc::now(),
        }
    }

    async fn resolve(
        shelf: &Shelf,
        cache: &MetadataCache,
        claimed: &HashMap<BookIdentifier, PathBuf>,
    ) -> Result<Book, DexError> {
        let identifier = resolve_identifier(&shelf.name())?;

        // Checked before the fetch so duplicates cost no lookup
        if let Some(existing) = claimed.get(&identifier) {
            return Err(DexError::DuplicateIdentifier {
                identifier,
                shelf: shelf.path().to_path_buf(),
                existing: existing.clone(),
            });
        }

        let metadata = cache.get(&identifier).await?;
        Ok(Book::new(identifier, metadata, shelf.clone()))
    }

    /// Books in scan order
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn books_mut(&mut self) -> impl Iterator<Item = &mut Book> {
        self.books.iter_mut()
    }

    pub fn rejected(&self) -> &[RejectedShelf] {
        &self.rejected
    }

    pub fn assembled_at(&self) -> DateTime<Utc> {
        self.assembled_at
    }

    /// Books in catalog order; the library itself is not reordered
    pub fn sorted_items(&self) -> Vec<&Book> {
        let mut items: Vec<_> = self.books.iter().collect();
        items.sort_by(|a, b| a.catalog_cmp(b));
        items
    }

    /// Get a book by identifier
    pub fn get(&self, identifier: &BookIdentifier) -> Option<&Book> {
        self.books.iter().find(|b| b.identifier() == identifier)
    }

    pub fn get_mut(&mut self, identifier: &BookIdentifier) -> Option<&mut Book> {
        self.books.iter_mut().find(|b| b.identifier() == identifier)
    }

    /// Search titles, authors and publishers (case-insensitive substring match)
    pub fn search(&self, query: &str) -> Vec<&Book> {
        let query_lower = query.to_lowercase();

        self.books
            .iter()
            .filter(|book| {
                let meta = book.metadata();
                meta.title().to_lowercase().contains(&query_lower)
                    || meta.publisher().to_lowercase().contains(&query_lower)
                    || meta
                        .authors()
                        .iter()
                        .any(|a| a.name().to_lowercase().contains(&query_lower))
            })
            .collect()
    }

    /// Get the number of books
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Check if the library has no books
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Omitted shelves and unfixed images, as of now
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            assembled_at: self.assembled_at,
            books: self.books.len(),
            omitted: self
                .rejected
                .iter()
                .map(|r| OmittedShelf {
                    shelf: r.shelf.path().to_path_buf(),
                    kind: r.reason.kind(),
                    reason: r.reason.to_string(),
                })
                .collect(),
            unfixed: self
                .books
                .iter()
                .filter(|b| !b.unfixed_images().is_empty())
                .map(|b| UnfixedBook {
                    identifier: b.identifier().clone(),
                    title: b.title().to_string(),
                    images: b.unfixed_paths(),
                })
                .collect(),
        }
    }
}

impl std::fmt::Display for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.books.is_empty() {
            write!(f, "Empty library")
        } else {
            write!(f, "Library of {} book(s)", self.books.len())
        }
    }
}

/// End-of-run report
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// When the library was assembled
    pub assembled_at: DateTime<Utc>,
    pub books: usize,
    pub omitted: Vec<OmittedShelf>,
    pub unfixed: Vec<UnfixedBook>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OmittedShelf {
    pub shelf: PathBuf,
    pub kind: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnfixedBook {
    pub identifier: BookIdentifier,
    pub title: String,
    pub images: Vec<PathBuf>,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.omitted.is_empty() && self.unfixed.is_empty()
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "[{}] {} book(s), {} shelf(s) omitted, {} book(s) with unfixed images",
            self.assembled_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.books,
            self.omitted.len(),
            self.unfixed.len()
        )?;
        for omitted in &self.omitted {
            writeln!(f, "  omitted {}: {}", omitted.shelf.display(), omitted.reason)?;
        }
        for book in &self.unfixed {
            writeln!(f, "  {} {}:", book.identifier, book.title)?;
            for image in &book.images {
                writeln!(f, "    {}", image.display())?;
            }
        }
        Ok(())
    }
}

/// How [`load_library`] scans and caches
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub scan: ScanOptions,
    pub cache: CacheMode,
}

/// Scan the configured shelves root and assemble a library from it
pub async fn load_library(config: &ResolvedConfig, options: LoadOptions) -> Result<Library, DexError> {
    let shelves = Shelving::new(&config.shelves).shelves(options.scan)?;

    let cache = MetadataCache::new(&config.cache_dir, config.build_provider()).with_mode(options.cache);
    if options.cache == CacheMode::Enabled {
        cache.ensure_dir().await?;
    }

    Ok(Library::assemble(shelves, &cache).await)
}
