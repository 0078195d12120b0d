//! Command-line interface for dex.
//!
//! Provides commands for listing the catalog, dewarping page images,
//! looking up a single ISBN, and showing the resolved configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::ImageNormalizer;
use crate::config::{self, ResolvedConfig};
use crate::core::{BatchExecutor, CacheMode, MetadataCache};
use crate::domain::BookIdentifier;
use crate::ingest::{normalize_book, normalize_library, NormalizationReport, ScanOptions, ScanOrder};
use crate::library::{load_library, Book, LoadOptions};

/// dex - catalog and dewarp a collection of scanned books
#[derive(Parser, Debug)]
#[command(name = "dex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble the library and print it in catalog order
    Library {
        /// Maximum number of shelves to scan
        #[arg(short, long)]
        limit: Option<usize>,

        /// Scan shelves in name order instead of filesystem order
        #[arg(long)]
        sorted_scan: bool,

        /// Skip the metadata cache (always query the provider)
        #[arg(long)]
        no_cache: bool,

        /// Only show books whose title, author or publisher match
        #[arg(short, long)]
        search: Option<String>,

        /// Print the sorted library as JSON
        #[arg(long)]
        json: bool,
    },

    /// Normalize the raw page images of every book (or one)
    Dewarp {
        /// Maximum number of shelves to scan
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only dewarp the book with this ISBN
        #[arg(long)]
        isbn: Option<String>,

        /// Parallel workers (defaults to the configured count)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Skip the metadata cache (always query the provider)
        #[arg(long)]
        no_cache: bool,
    },

    /// Resolve metadata for one ISBN
    Lookup {
        /// ISBN-10 or ISBN-13, hyphens allowed
        isbn: String,

        /// Skip the metadata cache (always query the provider)
        #[arg(long)]
        no_cache: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::load_config()?;

        match self.command {
            Commands::Library {
                limit,
                sorted_scan,
                no_cache,
                search,
                json,
            } => {
                let options = load_options(limit, sorted_scan, no_cache);
                list_library(&cfg, options, search.as_deref(), json).await
            }
            Commands::Dewarp {
                limit,
                isbn,
                workers,
                no_cache,
            } => {
                let options = load_options(limit, false, no_cache);
                dewarp(&cfg, options, isbn.as_deref(), workers).await
            }
            Commands::Lookup { isbn, no_cache } => {
                lookup(&cfg, &isbn, cache_mode(no_cache)).await
            }
            Commands::Config => show_config(&cfg),
        }
    }
}

fn cache_mode(no_cache: bool) -> CacheMode {
    if no_cache {
        CacheMode::Bypass
    } else {
        CacheMode::Enabled
    }
}

fn load_options(limit: Option<usize>, sorted_scan: bool, no_cache: bool) -> LoadOptions {
    LoadOptions {
        scan: ScanOptions {
            limit,
            order: if sorted_scan {
                ScanOrder::Sorted
            } else {
                ScanOrder::Filesystem
            },
        },
        cache: cache_mode(no_cache),
    }
}

/// Print the library in catalog order
async fn list_library(
    cfg: &ResolvedConfig,
    options: LoadOptions,
    search: Option<&str>,
    json: bool,
) -> Result<()> {
    let library = load_library(cfg, options).await?;

    let books: Vec<&Book> = match search {
        Some(query) => {
            let mut found = library.search(query);
            found.sort_by(|a, b| a.catalog_cmp(b));
            found
        }
        None => library.sorted_items(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&books)?);
        return Ok(());
    }

    if library.is_empty() {
        println!("Library is empty. Add shelves under {}", cfg.shelves.display());
    } else {
        println!("{}", library);
        for (i, book) in books.iter().enumerate() {
            let ocr = if book.has_ocr() { " [ocr]" } else { "" };
            println!("{:>4}. {}{}", i + 1, book, ocr);
        }
    }

    let summary = library.summary();
    if !summary.omitted.is_empty() {
        eprintln!();
        eprint!("{}", summary);
    }

    Ok(())
}

/// Normalize page images and report what is still unfixed
async fn dewarp(
    cfg: &ResolvedConfig,
    options: LoadOptions,
    isbn: Option<&str>,
    workers: Option<usize>,
) -> Result<()> {
    let mut library = load_library(cfg, options).await?;
    let executor = BatchExecutor::new(workers.unwrap_or(cfg.workers)).with_progress("dewarping");
    let normalizer: Arc<dyn ImageNormalizer> = Arc::new(cfg.build_normalizer());

    let reports = match isbn {
        Some(isbn) => {
            let identifier = BookIdentifier::parse(isbn)
                .with_context(|| format!("'{}' is not a valid ISBN", isbn))?;
            let book = library
                .get_mut(&identifier)
                .with_context(|| format!("No shelf for {} under {}", identifier, cfg.shelves.display()))?;
            vec![normalize_book(book, normalizer, &executor).await]
        }
        None => normalize_library(&mut library, normalizer, &executor).await,
    };

    for report in &reports {
        print_report(report);
    }
    println!();
    print!("{}", library.summary());

    Ok(())
}

fn print_report(report: &NormalizationReport) {
    println!(
        "{}: {} normalized, {} failed, {} already done",
        report.identifier,
        report.normalized.len(),
        report.failed.len(),
        report.skipped
    );
}

/// Resolve one identifier through the cache
async fn lookup(cfg: &ResolvedConfig, isbn: &str, mode: CacheMode) -> Result<()> {
    let identifier =
        BookIdentifier::parse(isbn).with_context(|| format!("'{}' is not a valid ISBN", isbn))?;

    let cache = MetadataCache::new(&cfg.cache_dir, cfg.build_provider()).with_mode(mode);
    if mode == CacheMode::Enabled {
        cache.ensure_dir().await?;
    }

    let metadata = cache.get(&identifier).await?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    eprintln!("{}", metadata.short_fmt());
    if mode == CacheMode::Enabled {
        eprintln!("Cached at {}", cache.entry_path(&identifier).display());
    }

    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    println!("dex configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using environment and defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Shelves:        {}", cfg.shelves.display());
    println!("  Metadata cache: {}", cfg.cache_dir.display());
    println!();
    println!("Metadata:");
    println!("  Provider:       {:?}", cfg.provider);
    println!("  Timeout:        {}s", cfg.lookup_timeout.as_secs());
    println!();
    println!("Dewarping:");
    println!("  Binary:         {}", cfg.dewarp_binary);
    println!("  Workers:        {}", cfg.workers);

    Ok(())
}
