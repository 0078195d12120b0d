//! dex - catalog and dewarp a collection of scanned books
//!
//! Each book is a directory ("shelf") of page photographs whose name
//! carries an ISBN. dex resolves that ISBN, fetches and caches its
//! bibliographic metadata, dewarps the photographs into a `dewarped/`
//! sibling directory, and assembles an ordered library.
//!
//! # Architecture
//!
//! - Identity is derived from the shelf name and canonicalized to ISBN-13
//! - Metadata is cached on disk, one JSON file per ISBN
//! - Dewarping runs in bounded parallel groups; a failed image is
//!   recorded on its book and never aborts the run
//!
//! # Modules
//!
//! - `adapters`: External services (metadata providers, page-dewarp)
//! - `core`: Metadata cache and batch executor
//! - `domain`: Data structures (BookIdentifier, BookMetadata, Shelf, images)
//! - `ingest`: Shelf scanning and image normalization
//! - `library`: Book and Library assembly
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # List the library in catalog order
//! DEX_SHELVES=~/books dex library
//!
//! # Dewarp every book's pending pages with 4 workers
//! dex dewarp --workers 4
//!
//! # Resolve one ISBN
//! dex lookup 0-14-143951-3
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod library;

// Re-export main types at crate root for convenience
pub use crate::core::{BatchExecutor, CacheMode, MetadataCache};
pub use domain::{resolve_identifier, BookIdentifier, BookMetadata, Shelf};
pub use error::DexError;
pub use library::{load_library, Book, Library, RunSummary};
