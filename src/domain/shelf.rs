//! A shelf: one book's directory of page photographs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::image::{NormalizedImage, RawImage};
use crate::config::paths;

/// Directory holding a book's raw and normalized images
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shelf(PathBuf);

impl Shelf {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Directory basename, the input to identity resolution
    pub fn name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn normalized_dir(&self) -> PathBuf {
        paths::normalized_dir(&self.0)
    }

    pub fn has_ocr(&self) -> bool {
        paths::ocr_results(&self.0).exists()
    }

    /// Scan for raw page images, sorted by path.
    ///
    /// Files with other suffixes are skipped; a missing directory yields
    /// an empty list.
    pub fn raw_images(&self) -> std::io::Result<Vec<RawImage>> {
        let mut images: Vec<RawImage> = list_files(&self.0)?
            .into_iter()
            .filter_map(|p| RawImage::new(p).ok())
            .collect();
        images.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(images)
    }

    /// Scan the `dewarped/` directory, sorted by path
    pub fn normalized_images(&self) -> std::io::Result<Vec<NormalizedImage>> {
        let mut images: Vec<NormalizedImage> = list_files(&self.normalized_dir())?
            .into_iter()
            .filter_map(|p| NormalizedImage::new(p).ok())
            .collect();
        images.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(images)
    }
}

impl std::fmt::Display for Shelf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !dir.exists() {
        debug!(dir = %dir.display(), "No such directory, nothing to scan");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    Ok(files)
}
