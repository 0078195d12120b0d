//! Canonical path conventions for shelves and the metadata cache.
//!
//! Single source of truth - import this instead of hardcoding paths.
//!
//! ## Layout
//!
//! ```text
//! <shelves>/
//! └── <isbn-bearing name>/          # one shelf per book
//!     ├── 001.jpg                   # raw page photographs
//!     └── dewarped/
//!         ├── 001.jpg               # normalized copy, same basename
//!         └── results/surya/results.json
//!
//! <cache>/
//! └── <isbn13>.json                 # BookMetadata
//! ```
//!
//! Whether a raw image has been normalized is decided purely by whether
//! `dewarped/<basename>` exists next to it.

use std::path::{Path, PathBuf};

use crate::domain::BookIdentifier;

/// Name of the sibling directory holding normalized images
pub const NORMALIZED_DIR: &str = "dewarped";

/// Image suffixes accepted on either side of normalization
pub const IMAGE_SUFFIXES: [&str; 3] = ["png", "jpg", "jpeg"];

/// Environment variable naming the shelves root
pub const SHELVES_ENV: &str = "DEX_SHELVES";

/// Environment variable naming the metadata cache directory
pub const CACHE_ENV: &str = "DEX_CACHE_DIR";

/// Environment variable overriding the batch worker count
pub const WORKERS_ENV: &str = "DEX_WORKERS";

/// Normalized directory for a shelf (`<shelf>/dewarped`)
pub fn normalized_dir(shelf: &Path) -> PathBuf {
    shelf.join(NORMALIZED_DIR)
}

/// Default output directory for a raw image (`<parent>/dewarped`)
pub fn default_output_dir(raw: &Path) -> PathBuf {
    normalized_dir(raw.parent().unwrap_or(Path::new(".")))
}

/// Where the normalized counterpart of `raw` lives
pub fn normalized_path(raw: &Path) -> PathBuf {
    let dir = default_output_dir(raw);
    match raw.file_name() {
        Some(name) => dir.join(name),
        None => dir,
    }
}

/// Where the raw original of a normalized image lives
pub fn original_path(normalized: &Path) -> PathBuf {
    let shelf = normalized
        .parent()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."));
    match normalized.file_name() {
        Some(name) => shelf.join(name),
        None => shelf.to_path_buf(),
    }
}

/// OCR output for a shelf; read-only here, produced by an external tool
pub fn ocr_results(shelf: &Path) -> PathBuf {
    normalized_dir(shelf)
        .join("results")
        .join("surya")
        .join("results.json")
}

/// Cache file for one identifier (`<cache>/<isbn13>.json`)
pub fn cache_entry(cache_dir: &Path, id: &BookIdentifier) -> PathBuf {
    cache_dir.join(format!("{}.json", id.as_str()))
}

/// Default metadata cache (`<user cache dir>/dex/isbn`)
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("dex").join("isbn"))
}
