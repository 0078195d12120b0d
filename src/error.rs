//! Error taxonomy for ingestion.
//!
//! Everything except [`DexError::Configuration`] is a per-item failure:
//! the shelf or image is logged and skipped, and the run carries on.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::BookIdentifier;

/// Errors raised while building the library
#[derive(Debug, Error)]
pub enum DexError {
    /// No substring of a shelf name validates as an ISBN
    #[error("No ISBN found in shelf name '{name}'")]
    IdentifierNotFound { name: String },

    /// A second shelf resolved to an identifier already in the library
    #[error("Duplicate identifier {identifier}: {} already claimed by {}", .shelf.display(), .existing.display())]
    DuplicateIdentifier {
        identifier: BookIdentifier,
        shelf: PathBuf,
        existing: PathBuf,
    },

    /// The metadata provider could not produce a valid record
    #[error("Metadata unavailable for {identifier}: {reason}")]
    MetadataUnavailable {
        identifier: BookIdentifier,
        reason: String,
    },

    /// The normalizer did not produce the expected output
    #[error("Failed to normalize {}: {reason}", .image.display())]
    NormalizationFailed { image: PathBuf, reason: String },

    /// Startup cannot proceed (no shelves root, unusable cache directory)
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DexError {
    /// Only configuration errors abort a run
    pub fn is_fatal(&self) -> bool {
        matches!(self, DexError::Configuration(_))
    }

    /// Short machine-friendly name of the condition, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            DexError::IdentifierNotFound { .. } => "identifier_not_found",
            DexError::DuplicateIdentifier { .. } => "duplicate_identifier",
            DexError::MetadataUnavailable { .. } => "metadata_unavailable",
            DexError::NormalizationFailed { .. } => "normalization_failed",
            DexError::Configuration(_) => "configuration",
            DexError::Io(_) => "io",
            DexError::Json(_) => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_is_fatal() {
        assert!(DexError::Configuration("no root".into()).is_fatal());
        assert!(!DexError::IdentifierNotFound {
            name: "not-a-book".into()
        }
        .is_fatal());
        assert!(!DexError::NormalizationFailed {
            image: PathBuf::from("a.jpg"),
            reason: "no output".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_kind_names() {
        let err = DexError::IdentifierNotFound {
            name: "x".into(),
        };
        assert_eq!(err.kind(), "identifier_not_found");
        assert_eq!(
            err.to_string(),
            "No ISBN found in shelf name 'x'"
        );
    }
}
