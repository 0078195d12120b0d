//! Shelf discovery under the shelves root.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::domain::Shelf;
use crate::error::DexError;

/// Order in which shelves are yielded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanOrder {
    /// Whatever order the filesystem lists entries in
    #[default]
    Filesystem,

    /// Sorted by directory name, applied before the limit
    Sorted,
}

/// Options for one scan of the shelves root
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Return at most this many shelves
    pub limit: Option<usize>,

    pub order: ScanOrder,
}

/// The shelves root: one subdirectory per book
#[derive(Debug, Clone)]
pub struct Shelving {
    root: PathBuf,
}

impl Shelving {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List the immediate subdirectories of the root as shelves.
    ///
    /// Plain files are ignored. A missing root is a configuration error.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn shelves(&self, options: ScanOptions) -> Result<Vec<Shelf>, DexError> {
        if !self.root.is_dir() {
            return Err(DexError::Configuration(format!(
                "shelves root {} is not a directory",
                self.root.display()
            )));
        }

        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                dirs.push(entry.path());
            }
        }

        if options.order == ScanOrder::Sorted {
            dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        }
        if let Some(limit) = options.limit {
            dirs.truncate(limit);
        }

        debug!(count = dirs.len(), "Scanned shelves");
        Ok(dirs.into_iter().map(Shelf::new).collect())
    }
}
