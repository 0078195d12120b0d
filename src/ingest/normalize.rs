//! Drive an [`ImageNormalizer`] over a book's pending page images.
//!
//! One unit of work per raw image without a `dewarped/` counterpart. After
//! the batch finishes the shelf is scanned again and every submitted image
//! is classified by whether its output now exists; a worker's own return
//! value is only used for logging.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::adapters::ImageNormalizer;
use crate::core::{BatchExecutor, BatchStats};
use crate::domain::{BookIdentifier, RawImage};
use crate::library::{Book, Library};

/// What one normalization pass did for one book
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub identifier: BookIdentifier,

    /// Images that already had a normalized copy and were skipped
    pub skipped: usize,

    /// Images that gained a normalized copy in this pass
    pub normalized: Vec<PathBuf>,

    /// Images still without a normalized copy
    pub failed: Vec<PathBuf>,

    /// Worker-level counts, as reported by the executor
    #[serde(skip)]
    pub stats: BatchStats,
}

impl NormalizationReport {
    fn empty(identifier: BookIdentifier) -> Self {
        Self {
            identifier,
            skipped: 0,
            normalized: Vec::new(),
            failed: Vec::new(),
            stats: BatchStats::default(),
        }
    }

    pub fn submitted(&self) -> usize {
        self.normalized.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Normalize every pending image of `book`.
///
/// Never fails: scan errors and per-image failures are logged, and the
/// images left without output are recorded on the book.
#[instrument(skip_all, fields(shelf = %book.shelf(), isbn = %book.identifier()))]
pub async fn normalize_book(
    book: &mut Book,
    normalizer: Arc<dyn ImageNormalizer>,
    executor: &BatchExecutor,
) -> NormalizationReport {
    let mut report = NormalizationReport::empty(book.identifier().clone());

    let images = match book.shelf().raw_images() {
        Ok(images) => images,
        Err(e) => {
            warn!(error = %e, "Could not scan shelf for images");
            return report;
        }
    };

    let (done, pending): (Vec<RawImage>, Vec<RawImage>) =
        images.into_iter().partition(RawImage::is_normalized);
    report.skipped = done.len();

    if pending.is_empty() {
        debug!(skipped = report.skipped, "Nothing to normalize");
        book.record_unfixed(Vec::new());
        return report;
    }

    let units: Vec<_> = pending
        .iter()
        .map(|image| {
            let normalizer = normalizer.clone();
            let path = image.path().to_path_buf();
            move || normalizer.normalize(&path, None).map(|_| ())
        })
        .collect();

    info!(
        pending = pending.len(),
        workers = executor.workers(),
        normalizer = normalizer.name(),
        "Normalizing images"
    );
    report.stats = executor.run_all(units).await;

    // Re-scan: the output on disk is the only source of truth
    let mut unfixed = Vec::new();
    for image in pending {
        match RawImage::new(image.path()) {
            Ok(rescanned) if rescanned.is_normalized() => {
                report.normalized.push(rescanned.path().to_path_buf());
            }
            _ => {
                warn!(image = %image.path().display(), "Image was not normalized");
                report.failed.push(image.path().to_path_buf());
                unfixed.push(image.into_failed());
            }
        }
    }

    if unfixed.is_empty() {
        debug!(normalized = report.normalized.len(), "All images normalized");
    }
    book.record_unfixed(unfixed);
    report
}

/// Normalize every book in turn
pub async fn normalize_library(
    library: &mut Library,
    normalizer: Arc<dyn ImageNormalizer>,
    executor: &BatchExecutor,
) -> Vec<NormalizationReport> {
    let mut reports = Vec::with_capacity(library.len());
    for book in library.books_mut() {
        reports.push(normalize_book(book, normalizer.clone(), executor).await);
    }
    reports
}
