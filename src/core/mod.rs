//! Core machinery shared by the ingest and library layers.
//!
//! - MetadataCache: on-disk ISBN metadata cache in front of a provider
//! - BatchExecutor: bounded parallel execution of independent units

pub mod batch;
pub mod cache;

pub use batch::{default_workers, BatchExecutor, BatchStats, UnitFailure, UnitOutcome};
pub use cache::{CacheMode, MetadataCache};
