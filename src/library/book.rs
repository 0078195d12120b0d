//! A cataloged book: resolved metadata plus the shelf it came from.

use std::cmp::Ordering;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{BookIdentifier, BookMetadata, RawImage, Shelf};

/// One resolved shelf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Identifier resolved from the shelf name
    identifier: BookIdentifier,

    metadata: BookMetadata,

    shelf: Shelf,

    /// Images the last normalization pass could not fix
    #[serde(default)]
    unfixed_images: Vec<RawImage>,
}

impl Book {
    pub fn new(identifier: BookIdentifier, metadata: BookMetadata, shelf: Shelf) -> Self {
        Self {
            identifier,
            metadata,
            shelf,
            unfixed_images: Vec::new(),
        }
    }

    pub fn identifier(&self) -> &BookIdentifier {
        &self.identifier
    }

    pub fn metadata(&self) -> &BookMetadata {
        &self.metadata
    }

    pub fn shelf(&self) -> &Shelf {
        &self.shelf
    }

    pub fn title(&self) -> &str {
        self.metadata.title()
    }

    /// Whether OCR output has been dropped into the shelf
    pub fn has_ocr(&self) -> bool {
        self.shelf.has_ocr()
    }

    pub fn unfixed_images(&self) -> &[RawImage] {
        &self.unfixed_images
    }

    pub fn unfixed_paths(&self) -> Vec<PathBuf> {
        self.unfixed_images
            .iter()
            .map(|i| i.path().to_path_buf())
            .collect()
    }

    /// Replace the outcome of the previous normalization pass
    pub fn record_unfixed(&mut self, images: Vec<RawImage>) {
        self.unfixed_images = images;
    }

    /// Catalog ordering: surname then title, ignoring case.
    ///
    /// Ties fall back to the exact title and then the identifier, so two
    /// distinct books never compare equal.
    pub fn catalog_cmp(&self, other: &Self) -> Ordering {
        let surname = |b: &Self| b.metadata.first_author_surname().to_lowercase();
        let title = |b: &Self| b.metadata.title().to_lowercase();

        surname(self)
            .cmp(&surname(other))
            .then_with(|| title(self).cmp(&title(other)))
            .then_with(|| self.title().cmp(other.title()))
            .then_with(|| self.identifier.cmp(&other.identifier))
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.metadata.short_fmt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Author;
    use tempfile::TempDir;

    fn book(isbn: &str, author: &str, title: &str) -> Book {
        let id = BookIdentifier::parse(isbn).unwrap();
        let metadata =
            BookMetadata::new(title, vec![Author::new(author)], 2003, "Penguin", id.clone())
                .unwrap();
        Book::new(id, metadata, Shelf::new(format!("/shelves/{}", isbn)))
    }

    #[test]
    fn test_order_ignores_case() {
        let emma = book("9780141439587", "jane austen", "Emma");
        let dracula = book("9780141439846", "Bram Stoker", "Dracula");
        let pride = book("9780141439518", "Jane Austen", "pride and prejudice");

        let mut books = vec![&dracula, &pride, &emma];
        books.sort_by(|a, b| a.catalog_cmp(b));

        let titles: Vec<_> = books.iter().map(|b| b.title()).collect();
        assert_eq!(titles, vec!["Emma", "pride and prejudice", "Dracula"]);
    }

    #[test]
    fn test_order_is_total() {
        let a = book("9780141439518", "Jane Austen", "Emma");
        let b = book("9780141439587", "Jane Austen", "Emma");

        assert_eq!(a.catalog_cmp(&b), Ordering::Less);
        assert_eq!(b.catalog_cmp(&a), Ordering::Greater);
        assert_eq!(a.catalog_cmp(&a), Ordering::Equal);
    }

    #[test]
    fn test_display_is_short_format() {
        let b = book("9780141439518", "Jane Austen", "Pride and Prejudice");
        assert_eq!(b.to_string(), "Austen (2003) Pride and Prejudice");
    }

    #[test]
    fn test_has_ocr_reads_shelf() {
        let temp = TempDir::new().unwrap();
        let id = BookIdentifier::parse("9780141439518").unwrap();
        let metadata = BookMetadata::new(
            "Pride and Prejudice",
            vec![Author::new("Jane Austen")],
            2003,
            "Penguin",
            id.clone(),
        )
        .unwrap();
        let shelf = Shelf::new(temp.path().join("9780141439518"));
        let book = Book::new(id, metadata, shelf.clone());
        assert!(!book.has_ocr());

        let results = crate::config::paths::ocr_results(shelf.path());
        std::fs::create_dir_all(results.parent().unwrap()).unwrap();
        std::fs::write(&results, b"{}").unwrap();
        assert!(book.has_ocr());
    }
}
