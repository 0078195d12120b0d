//! Configuration for dex.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (DEX_SHELVES, DEX_CACHE_DIR, DEX_WORKERS)
//! 2. Config file (.dex/config.yaml)
//! 3. Defaults (user cache dir, available parallelism)
//!
//! Config file discovery:
//! - Searches current directory and parents for .dex/config.yaml
//! - Paths in config file are relative to the project root (parent of .dex/)

pub mod paths;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::{
    FallbackProvider, GoogleBooksProvider, MetadataProvider, OpenLibraryProvider,
    PageDewarpNormalizer, DEFAULT_LOOKUP_TIMEOUT,
};
use crate::core::default_workers;
use crate::error::DexError;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub dewarp: DewarpConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Shelves root (relative to project root)
    pub shelves: Option<String>,
    /// Metadata cache directory (relative to project root)
    pub cache: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchConfig {
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataConfig {
    #[serde(default)]
    pub provider: ProviderChoice,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DewarpConfig {
    pub binary: Option<String>,
}

/// Which metadata service to query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderChoice {
    /// Google Books, falling back to Open Library
    #[default]
    Default,
    GoogleBooks,
    OpenLibrary,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Directory holding one subdirectory per book
    pub shelves: PathBuf,
    /// Metadata cache directory
    pub cache_dir: PathBuf,
    /// Parallel normalization workers
    pub workers: usize,
    pub provider: ProviderChoice,
    /// Per-request timeout for metadata lookups
    #[serde(with = "seconds")]
    pub lookup_timeout: Duration,
    /// page-dewarp binary
    pub dewarp_binary: String,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

mod seconds {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}

impl ResolvedConfig {
    /// Create the cache directory
    pub fn ensure_dirs(&self) -> Result<(), DexError> {
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| {
            DexError::Configuration(format!(
                "cannot create cache directory {}: {}",
                self.cache_dir.display(),
                e
            ))
        })
    }

    /// Metadata provider selected by `metadata.provider`
    pub fn build_provider(&self) -> Arc<dyn MetadataProvider> {
        let timeout = self.lookup_timeout;
        match self.provider {
            ProviderChoice::Default => Arc::new(FallbackProvider::default_chain(timeout)),
            ProviderChoice::GoogleBooks => Arc::new(GoogleBooksProvider::new(timeout)),
            ProviderChoice::OpenLibrary => Arc::new(OpenLibraryProvider::new(timeout)),
        }
    }

    pub fn build_normalizer(&self) -> PageDewarpNormalizer {
        PageDewarpNormalizer::with_binary_path(&self.dewarp_binary)
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".dex").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Environment lookups, injectable so tests do not touch the process env
type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Load configuration from all sources, searching upward from the
/// current directory for a config file
pub fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    resolve_config(&cwd, &process_env)
}

fn resolve_config(start: &Path, env: EnvLookup<'_>) -> Result<ResolvedConfig> {
    let config_file = find_config_file(start);

    let (file, base_dir) = match config_file {
        Some(ref config_path) => {
            let file = load_config_file(config_path)?;
            // Base directory is the parent of .dex/ (i.e., grandparent of config.yaml)
            let base_dir = config_path
                .parent()
                .and_then(Path::parent)
                .unwrap_or(Path::new("."))
                .to_path_buf();
            (file, base_dir)
        }
        None => (ConfigFile::default(), start.to_path_buf()),
    };

    let shelves = env(paths::SHELVES_ENV)
        .map(PathBuf::from)
        .or_else(|| file.paths.shelves.as_deref().map(|p| resolve_path(&base_dir, p)))
        .ok_or_else(|| {
            DexError::Configuration(format!(
                "no shelves root: set {} or paths.shelves in .dex/config.yaml",
                paths::SHELVES_ENV
            ))
        })?;
    if !shelves.is_dir() {
        return Err(DexError::Configuration(format!(
            "shelves root {} does not exist",
            shelves.display()
        ))
        .into());
    }

    let cache_dir = match env(paths::CACHE_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => match file.paths.cache.as_deref() {
            Some(p) => resolve_path(&base_dir, p),
            None => paths::default_cache_dir().ok_or_else(|| {
                DexError::Configuration("cannot determine user cache directory".to_string())
            })?,
        },
    };

    let workers = match env(paths::WORKERS_ENV) {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("{} must be a number, got '{}'", paths::WORKERS_ENV, raw))?,
        None => file.batch.workers.unwrap_or_else(default_workers),
    }
    .max(1);

    Ok(ResolvedConfig {
        shelves,
        cache_dir,
        workers,
        provider: file.metadata.provider,
        lookup_timeout: file
            .metadata
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_LOOKUP_TIMEOUT),
        dewarp_binary: file
            .dewarp
            .binary
            .unwrap_or_else(|| "page-dewarp".to_string()),
        config_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(root: &Path, body: &str) -> PathBuf {
        let dex_dir = root.join(".dex");
        std::fs::create_dir_all(&dex_dir).unwrap();
        let config_path = dex_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "{}", body).unwrap();
        config_path
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(
            temp.path(),
            r#"
version: "1"
paths:
  shelves: data/shelves
  cache: .cache/isbn
batch:
  workers: 4
metadata:
  provider: open_library
  timeout_seconds: 3
dewarp:
  binary: /opt/bin/page-dewarp
"#,
        );

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version.as_deref(), Some("1"));
        assert_eq!(config.paths.shelves.as_deref(), Some("data/shelves"));
        assert_eq!(config.batch.workers, Some(4));
        assert_eq!(config.metadata.provider, ProviderChoice::OpenLibrary);
        assert_eq!(config.dewarp.binary.as_deref(), Some("/opt/bin/page-dewarp"));
    }

    #[test]
    fn test_file_paths_resolve_from_project_root() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("data/shelves")).unwrap();
        let config_path = write_config(
            temp.path(),
            "paths:\n  shelves: data/shelves\n  cache: .cache/isbn\nbatch:\n  workers: 2",
        );

        // Discovered from a nested directory
        let nested = temp.path().join("data/shelves");
        let config = resolve_config(&nested, &no_env).unwrap();

        assert_eq!(config.config_file, Some(config_path));
        assert!(config.shelves.ends_with("data/shelves"));
        assert!(config.cache_dir.ends_with(".cache/isbn"));
        assert_eq!(config.workers, 2);
        assert_eq!(config.provider, ProviderChoice::Default);
        assert_eq!(config.lookup_timeout, DEFAULT_LOOKUP_TIMEOUT);
        assert_eq!(config.dewarp_binary, "page-dewarp");
    }

    #[test]
    fn test_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let other = temp.path().join("elsewhere");
        std::fs::create_dir_all(temp.path().join("data/shelves")).unwrap();
        std::fs::create_dir_all(&other).unwrap();
        write_config(temp.path(), "paths:\n  shelves: data/shelves\nbatch:\n  workers: 2");

        let vars: HashMap<&str, String> = HashMap::from([
            (paths::SHELVES_ENV, other.to_string_lossy().to_string()),
            (paths::CACHE_ENV, "/tmp/dex-cache".to_string()),
            (paths::WORKERS_ENV, "0".to_string()),
        ]);
        let env = |key: &str| vars.get(key).cloned();

        let config = resolve_config(temp.path(), &env).unwrap();
        assert_eq!(config.shelves, other);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/dex-cache"));
        // Zero workers is clamped
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn test_missing_shelves_root_is_configuration_error() {
        let temp = TempDir::new().unwrap();

        let err = resolve_config(temp.path(), &no_env).unwrap_err();
        let dex = err.downcast_ref::<DexError>().unwrap();
        assert!(dex.is_fatal());

        let vars = |key: &str| {
            (key == paths::SHELVES_ENV).then(|| temp.path().join("gone").to_string_lossy().to_string())
        };
        let err = resolve_config(temp.path(), &vars).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_ensure_dirs_creates_cache() {
        let temp = TempDir::new().unwrap();
        let config = ResolvedConfig {
            shelves: temp.path().to_path_buf(),
            cache_dir: temp.path().join("cache/isbn"),
            workers: 1,
            provider: ProviderChoice::GoogleBooks,
            lookup_timeout: Duration::from_secs(1),
            dewarp_binary: "page-dewarp".to_string(),
            config_file: None,
        };

        config.ensure_dirs().unwrap();
        config.ensure_dirs().unwrap();
        assert!(config.cache_dir.is_dir());
        assert_eq!(config.build_provider().name(), "google_books");
        assert_eq!(config.build_normalizer().binary_path(), "page-dewarp");
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
