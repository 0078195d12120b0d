//! Page images on a shelf.
//!
//! A raw photograph and its normalized copy share a basename; the copy
//! lives in the `dewarped/` directory beside the original.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::paths;

/// Errors that can occur building an image reference
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("File suffix '{suffix}' of {} is not one of {:?}", .path.display(), paths::IMAGE_SUFFIXES)]
    UnsupportedSuffix { path: PathBuf, suffix: String },
}

/// Normalization state of a raw image, fixed at scan time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationStatus {
    /// No normalized counterpart yet
    Pending,

    /// `dewarped/<basename>` exists
    Normalized,

    /// A normalization pass ran and produced nothing
    Failed,
}

fn check_suffix(path: &Path) -> Result<(), ImageError> {
    let suffix = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    let lower = suffix.to_ascii_lowercase();
    if paths::IMAGE_SUFFIXES.contains(&lower.as_str()) {
        Ok(())
    } else {
        Err(ImageError::UnsupportedSuffix {
            path: path.to_path_buf(),
            suffix,
        })
    }
}

/// A source photograph of a book page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawImage {
    path: PathBuf,
    status: NormalizationStatus,
}

impl RawImage {
    /// Validate the suffix and record whether a normalized copy exists
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ImageError> {
        let path = path.into();
        check_suffix(&path)?;
        let status = if paths::normalized_path(&path).exists() {
            NormalizationStatus::Normalized
        } else {
            NormalizationStatus::Pending
        };
        Ok(Self { path, status })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn status(&self) -> NormalizationStatus {
        self.status
    }

    pub fn is_normalized(&self) -> bool {
        self.status == NormalizationStatus::Normalized
    }

    /// Where the normalized copy is (or would be) written
    pub fn normalized_path(&self) -> PathBuf {
        paths::normalized_path(&self.path)
    }

    /// Mark a pending image as failed after a normalization pass
    pub fn into_failed(mut self) -> Self {
        if self.status == NormalizationStatus::Pending {
            self.status = NormalizationStatus::Failed;
        }
        self
    }
}

/// A normalized copy of a page photograph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedImage {
    path: PathBuf,
}

impl NormalizedImage {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ImageError> {
        let path = path.into();
        check_suffix(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_path(&self) -> PathBuf {
        paths::original_path(&self.path)
    }

    pub fn has_original(&self) -> bool {
        self.original_path().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_suffix_validation() {
        assert!(RawImage::new("/x/a.jpg").is_ok());
        assert!(RawImage::new("/x/a.JPEG").is_ok());
        assert!(RawImage::new("/x/a.png").is_ok());

        let err = RawImage::new("/x/notes.txt").unwrap_err();
        assert_eq!(
            err,
            ImageError::UnsupportedSuffix {
                path: PathBuf::from("/x/notes.txt"),
                suffix: "txt".to_string(),
            }
        );
        assert!(NormalizedImage::new("/x/dewarped/README").is_err());
    }

    #[test]
    fn test_suffix_match_ignores_case() {
        // Cameras commonly write upper-case suffixes
        for name in ["IMG_0001.JPG", "scan.Png", "page.JpEg"] {
            let image = RawImage::new(format!("/x/{}", name)).unwrap();
            assert_eq!(image.file_name(), name);
            assert!(NormalizedImage::new(format!("/x/dewarped/{}", name)).is_ok());
        }

        // The reported suffix keeps its original case
        let err = RawImage::new("/x/notes.TXT").unwrap_err();
        assert_eq!(
            err,
            ImageError::UnsupportedSuffix {
                path: PathBuf::from("/x/notes.TXT"),
                suffix: "TXT".to_string(),
            }
        );
    }

    #[test]
    fn test_status_follows_sibling_directory() {
        let temp = TempDir::new().unwrap();
        let raw = temp.path().join("a.jpg");
        std::fs::write(&raw, b"raw").unwrap();

        let image = RawImage::new(&raw).unwrap();
        assert_eq!(image.status(), NormalizationStatus::Pending);
        assert_eq!(image.normalized_path(), temp.path().join("dewarped/a.jpg"));

        std::fs::create_dir(temp.path().join("dewarped")).unwrap();
        std::fs::write(temp.path().join("dewarped/a.jpg"), b"flat").unwrap();

        // Status is fixed at construction; a rescan picks up the change
        assert_eq!(image.status(), NormalizationStatus::Pending);
        assert!(RawImage::new(&raw).unwrap().is_normalized());
    }

    #[test]
    fn test_into_failed_only_touches_pending() {
        let temp = TempDir::new().unwrap();
        let raw = temp.path().join("a.png");
        std::fs::write(&raw, b"raw").unwrap();

        let failed = RawImage::new(&raw).unwrap().into_failed();
        assert_eq!(failed.status(), NormalizationStatus::Failed);

        std::fs::create_dir(temp.path().join("dewarped")).unwrap();
        std::fs::write(temp.path().join("dewarped/a.png"), b"flat").unwrap();
        let done = RawImage::new(&raw).unwrap().into_failed();
        assert_eq!(done.status(), NormalizationStatus::Normalized);
    }

    #[test]
    fn test_normalized_image_original() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.jpg"), b"raw").unwrap();

        let image = NormalizedImage::new(temp.path().join("dewarped/a.jpg")).unwrap();
        assert_eq!(image.original_path(), temp.path().join("a.jpg"));
        assert!(image.has_original());
    }
}
