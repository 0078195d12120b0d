//! Bibliographic metadata for a book.
//!
//! The JSON form uses the provider's title-cased keys (`Title`, `Authors`,
//! `Year`, `Publisher`, `ISBN-13`). Every field is required on read.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::identifier::BookIdentifier;
use crate::adapters::ProviderRecord;

/// An author's display name, "First Last"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Author(String);

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Last whitespace-separated token of the name
    pub fn surname(&self) -> &str {
        self.0.split_whitespace().last().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata resolved for one ISBN
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MetadataFile")]
pub struct BookMetadata {
    #[serde(rename = "Title")]
    title: String,

    #[serde(rename = "Authors")]
    authors: Vec<Author>,

    #[serde(rename = "Year")]
    year: i32,

    #[serde(rename = "Publisher")]
    publisher: String,

    #[serde(rename = "ISBN-13")]
    isbn_13: BookIdentifier,
}

/// On-disk shape, checked by [`BookMetadata::new`] before use
#[derive(Deserialize)]
struct MetadataFile {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Authors")]
    authors: Vec<Author>,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Publisher")]
    publisher: String,
    #[serde(rename = "ISBN-13")]
    isbn_13: BookIdentifier,
}

impl TryFrom<MetadataFile> for BookMetadata {
    type Error = MetadataError;

    fn try_from(file: MetadataFile) -> Result<Self, Self::Error> {
        Self::new(file.title, file.authors, file.year, file.publisher, file.isbn_13)
    }
}

/// Why a provider record could not become [`BookMetadata`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("record has no title")]
    MissingTitle,

    #[error("record has no authors")]
    MissingAuthors,

    #[error("no year in '{0}'")]
    InvalidYear(String),

    #[error("invalid ISBN-13 '{0}'")]
    InvalidIsbn(String),
}

impl BookMetadata {
    /// Build metadata, rejecting records without a title or authors
    pub fn new(
        title: impl Into<String>,
        authors: Vec<Author>,
        year: i32,
        publisher: impl Into<String>,
        isbn_13: BookIdentifier,
    ) -> Result<Self, MetadataError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(MetadataError::MissingTitle);
        }
        if authors.is_empty() {
            return Err(MetadataError::MissingAuthors);
        }
        Ok(Self {
            title,
            authors,
            year,
            publisher: publisher.into(),
            isbn_13,
        })
    }

    /// Validate a raw provider record
    pub fn from_record(record: ProviderRecord) -> Result<Self, MetadataError> {
        let isbn_13 = BookIdentifier::parse(&record.isbn_13)
            .map_err(|_| MetadataError::InvalidIsbn(record.isbn_13.clone()))?;
        let year = parse_year(&record.year)
            .ok_or_else(|| MetadataError::InvalidYear(record.year.clone()))?;
        let authors = record
            .authors
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .map(Author::new)
            .collect();

        Self::new(record.title, authors, year, record.publisher, isbn_13)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn isbn_13(&self) -> &BookIdentifier {
        &self.isbn_13
    }

    pub fn first_author(&self) -> &Author {
        // Construction guarantees at least one author
        &self.authors[0]
    }

    pub fn first_author_surname(&self) -> &str {
        self.first_author().surname()
    }

    /// "Surname (Year) Title"
    pub fn short_fmt(&self) -> String {
        format!(
            "{} ({}) {}",
            self.first_author_surname(),
            self.year,
            self.title
        )
    }
}

impl std::fmt::Display for BookMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_fmt())
    }
}

/// First four-digit run in a provider date string ("2003-12-01", "January 2003", "c1998")
fn parse_year(raw: &str) -> Option<i32> {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    let pattern = YEAR.get_or_init(|| Regex::new(r"(\d{4})").expect("static year pattern is valid"));
    pattern
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
