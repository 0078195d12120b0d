//! Catalog Ordering Tests
//!
//! The sorted view must be total, case-insensitive and stable across calls.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dex::adapters::{MetadataProvider, ProviderError, ProviderRecord};
use dex::{CacheMode, Library, MetadataCache, Shelf};
use tempfile::TempDir;

/// Serves a fixed (author, title) per ISBN
struct Fixture(HashMap<&'static str, (&'static str, &'static str)>);

#[async_trait]
impl MetadataProvider for Fixture {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn lookup(&self, isbn: &str) -> Result<ProviderRecord, ProviderError> {
        let (author, title) = self.0.get(isbn).ok_or_else(|| ProviderError::NotFound {
            provider: "fixture".to_string(),
            isbn: isbn.to_string(),
        })?;
        Ok(ProviderRecord {
            title: title.to_string(),
            authors: vec![author.to_string()],
            year: "1990".to_string(),
            publisher: String::new(),
            isbn_13: isbn.to_string(),
        })
    }
}

async fn library(temp: &TempDir, books: &[(&'static str, &'static str, &'static str)]) -> Library {
    let fixture = Fixture(books.iter().map(|(isbn, a, t)| (*isbn, (*a, *t))).collect());
    let cache = MetadataCache::new(temp.path().join("cache"), Arc::new(fixture))
        .with_mode(CacheMode::Bypass);

    let shelves: Vec<Shelf> = books
        .iter()
        .map(|(isbn, _, _)| Shelf::new(temp.path().join(isbn)))
        .collect();
    Library::assemble(shelves, &cache).await
}

#[tokio::test]
async fn test_sorted_by_surname_then_title_ignoring_case() {
    let temp = TempDir::new().unwrap();
    let library = library(
        &temp,
        &[
            ("9780141439846", "Bram Stoker", "Dracula"),
            ("9780141439587", "jane austen", "emma"),
            ("9780141439518", "Jane Austen", "Pride and Prejudice"),
            ("9780199535569", "Anne Brontë", "Agnes Grey"),
        ],
    )
    .await;

    let sorted: Vec<String> = library
        .sorted_items()
        .iter()
        .map(|b| b.metadata().short_fmt())
        .collect();
    assert_eq!(
        sorted,
        vec![
            "austen (1990) emma",
            "Austen (1990) Pride and Prejudice",
            "Brontë (1990) Agnes Grey",
            "Stoker (1990) Dracula",
        ]
    );
}

#[tokio::test]
async fn test_sorted_view_is_idempotent_and_non_destructive() {
    let temp = TempDir::new().unwrap();
    let library = library(
        &temp,
        &[
            ("9780141439846", "Bram Stoker", "Dracula"),
            ("9780141439518", "Jane Austen", "Pride and Prejudice"),
            ("9780141439587", "Jane Austen", "Emma"),
        ],
    )
    .await;

    let scan_order: Vec<_> = library.books().iter().map(|b| b.identifier().clone()).collect();
    let first: Vec<_> = library.sorted_items().iter().map(|b| b.identifier().clone()).collect();
    let second: Vec<_> = library.sorted_items().iter().map(|b| b.identifier().clone()).collect();

    assert_eq!(first, second);
    assert_ne!(first, scan_order);
    // The library itself keeps scan order
    let after: Vec<_> = library.books().iter().map(|b| b.identifier().clone()).collect();
    assert_eq!(after, scan_order);
}

#[tokio::test]
async fn test_case_only_differences_are_ordered_deterministically() {
    let temp = TempDir::new().unwrap();
    let library = library(
        &temp,
        &[
            ("9780141439587", "Jane Austen", "emma"),
            ("9780141439518", "Jane Austen", "Emma"),
        ],
    )
    .await;

    let titles: Vec<_> = library.sorted_items().iter().map(|b| b.title()).collect();
    // Uppercase sorts first once the case-insensitive keys tie
    assert_eq!(titles, vec!["Emma", "emma"]);
}
