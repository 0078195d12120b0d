//! Open Library books API, queried by ISBN bibkey.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{MetadataProvider, ProviderError, ProviderRecord};

const DEFAULT_BASE_URL: &str = "https://openlibrary.org";

/// Open Library API client
pub struct OpenLibraryProvider {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct BookData {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<Named>,
    #[serde(default)]
    publishers: Vec<Named>,
    publish_date: Option<String>,
    #[serde(default)]
    identifiers: Identifiers,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Identifiers {
    #[serde(default)]
    isbn_13: Vec<String>,
}

impl OpenLibraryProvider {
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Point at another host (used by tests against a mock server)
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl MetadataProvider for OpenLibraryProvider {
    fn name(&self) -> &str {
        "open_library"
    }

    async fn lookup(&self, isbn: &str) -> Result<ProviderRecord, ProviderError> {
        let url = format!("{}/api/books", self.base_url);
        let bibkey = format!("ISBN:{}", isbn);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("bibkeys", bibkey.as_str()),
                ("format", "json"),
                ("jscmd", "data"),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| ProviderError::Network {
                provider: self.name().to_string(),
                source,
            })?;

        let mut body: HashMap<String, BookData> =
            response
                .json()
                .await
                .map_err(|e| ProviderError::Malformed {
                    provider: self.name().to_string(),
                    reason: e.to_string(),
                })?;

        let data = body.remove(&bibkey).ok_or_else(|| ProviderError::NotFound {
            provider: self.name().to_string(),
            isbn: isbn.to_string(),
        })?;

        let (title, year) = match (data.title, data.publish_date) {
            (Some(title), Some(year)) => (title, year),
            _ => {
                return Err(ProviderError::Malformed {
                    provider: self.name().to_string(),
                    reason: "record lacks title or publish_date".to_string(),
                })
            }
        };

        Ok(ProviderRecord {
            title,
            authors: data.authors.into_iter().map(|a| a.name).collect(),
            year,
            publisher: data
                .publishers
                .into_iter()
                .next()
                .map(|p| p.name)
                .unwrap_or_default(),
            isbn_13: data
                .identifiers
                .isbn_13
                .into_iter()
                .next()
                .unwrap_or_else(|| isbn.to_string()),
        })
    }
}
