//! The assembled catalog of books.
//!
//! # Storage Layout
//!
//! ```text
//! <shelves>/
//! └── <isbn-bearing name>/      # one shelf per book
//!     ├── *.jpg | *.png         # raw page photographs
//!     └── dewarped/             # normalized copies, same basenames
//!
//! <cache>/
//! └── <isbn13>.json             # Title, Authors, Year, Publisher, ISBN-13
//! ```
//!
//! Nothing here is persisted: a [`Library`] is rebuilt from the shelves
//! on every run, with metadata served from the cache.

pub mod book;
pub mod catalog;

pub use book::Book;
pub use catalog::{
    load_library, Library, LoadOptions, OmittedShelf, RejectedShelf, RunSummary, UnfixedBook,
};
