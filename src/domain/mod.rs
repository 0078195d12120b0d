//! Domain types for the book catalog.
//!
//! This module contains the core data structures:
//! - BookIdentifier: Validated ISBN, resolved from shelf names
//! - BookMetadata: Bibliographic record for one ISBN
//! - Shelf / RawImage / NormalizedImage: On-disk page images

pub mod identifier;
pub mod image;
pub mod metadata;
pub mod shelf;

// Re-export commonly used types
pub use identifier::{resolve_identifier, BookIdentifier, IsbnError};
pub use image::{ImageError, NormalizationStatus, NormalizedImage, RawImage};
pub use metadata::{Author, BookMetadata, MetadataError};
pub use shelf::Shelf;
