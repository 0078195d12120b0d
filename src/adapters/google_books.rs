//! Google Books volume search, queried by ISBN.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{MetadataProvider, ProviderError, ProviderRecord};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/books/v1";

/// Google Books API client
pub struct GoogleBooksProvider {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    publisher: Option<String>,
    published_date: Option<String>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

impl GoogleBooksProvider {
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

    fn malformed(&self, reason: impl Into<String>) -> ProviderError {
        ProviderError::Malformed {
            provider: self.name().to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl MetadataProvider for GoogleBooksProvider {
    fn name(&self) -> &str {
        "google_books"
    }

    async fn lookup(&self, isbn: &str) -> Result<ProviderRecord, ProviderError> {
        let url = format!("{}/volumes", self.base_url);
        let network = |source: reqwest::Error| ProviderError::Network {
            provider: "google_books".to_string(),
            source,
        };

        let response = self
            .client
            .get(&url)
            .query(&[("q", format!("isbn:{}", isbn))])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(network)?;

        let body: VolumesResponse = response
            .json()
            .await
            .map_err(|e| self.malformed(e.to_string()))?;

        let info = body
            .items
            .into_iter()
            .next()
            .map(|v| v.volume_info)
            .ok_or_else(|| ProviderError::NotFound {
                provider: self.name().to_string(),
                isbn: isbn.to_string(),
            })?;

        let title = info.title.ok_or_else(|| self.malformed("volume has no title"))?;
        let year = info
            .published_date
            .ok_or_else(|| self.malformed("volume has no publishedDate"))?;
        let isbn_13 = info
            .industry_identifiers
            .into_iter()
            .find(|i| i.kind == "ISBN_13")
            .map(|i| i.identifier)
            .unwrap_or_else(|| isbn.to_string());

        Ok(ProviderRecord {
            title,
            authors: info.authors,
            year,
            publisher: info.publisher.unwrap_or_default(),
            isbn_13,
        })
    }
}
