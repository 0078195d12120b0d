//! Ingestion: finding shelves and normalizing their page images.
//!
//! ```text
//! shelves root → Shelving → Shelf ─┐
//!                                  ├→ Library::assemble (identity, metadata)
//!                                  └→ normalize_book → BatchExecutor → ImageNormalizer
//! ```

pub mod normalize;
pub mod scanner;

pub use normalize::{normalize_book, normalize_library, NormalizationReport};
pub use scanner::{ScanOptions, ScanOrder, Shelving};
