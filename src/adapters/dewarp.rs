//! page-dewarp backend.
//!
//! Shells out to the `page-dewarp` binary. It writes `<stem>_thresh.png`
//! into its working directory, so each call runs in a scratch directory
//! and the result is moved to `<output_dir>/<input basename>`.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use super::ImageNormalizer;
use crate::config::paths;
use crate::error::DexError;

/// Normalizer backed by the `page-dewarp` command
pub struct PageDewarpNormalizer {
    /// Path to the page-dewarp binary (default: "page-dewarp")
    binary_path: String,
}

impl Default for PageDewarpNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageDewarpNormalizer {
    pub fn new() -> Self {
        Self::with_binary_path("page-dewarp")
    }

    pub fn with_binary_path(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    pub fn binary_path(&self) -> &str {
        &self.binary_path
    }
}

fn failed(image: &Path, reason: impl Into<String>) -> DexError {
    DexError::NormalizationFailed {
        image: image.to_path_buf(),
        reason: reason.into(),
    }
}

/// Move `from` to `to`, copying when they sit on different filesystems
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if std::fs::rename(from, to).is_err() {
        std::fs::copy(from, to)?;
        std::fs::remove_file(from)?;
    }
    Ok(())
}

impl ImageNormalizer for PageDewarpNormalizer {
    fn name(&self) -> &str {
        "page-dewarp"
    }

    fn normalize(&self, input: &Path, output_dir: Option<&Path>) -> Result<PathBuf, DexError> {
        let output_dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => paths::default_output_dir(input),
        };
        std::fs::create_dir_all(&output_dir)?;

        let file_name = input
            .file_name()
            .ok_or_else(|| failed(input, "input has no file name"))?;
        let out_path = output_dir.join(file_name);

        let input = input
            .canonicalize()
            .map_err(|e| failed(input, format!("cannot resolve input: {}", e)))?;
        let scratch = tempfile::tempdir()?;

        let output = Command::new(&self.binary_path)
            .arg(&input)
            .current_dir(scratch.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| failed(&input, format!("failed to run {}: {}", self.binary_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            return Err(failed(
                &input,
                format!("{} exited with {}: {}", self.binary_path, exit_code, stderr.trim()),
            ));
        }

        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        let written = scratch.path().join(format!("{}_thresh.png", stem));
        if !written.exists() {
            return Err(failed(
                &input,
                format!("expected {} but nothing was written", written.display()),
            ));
        }

        // Keep the input filename rather than the `_thresh` one
        move_file(&written, &out_path)?;
        debug!(image = %input.display(), output = %out_path.display(), "Dewarped image");

        Ok(out_path)
    }
}
