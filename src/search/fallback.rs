//! API-key-based fallback search adapters.
//!
//! Each fallback is an independent provider with its own credentials,
//! called by the search client only after the scraping primary has failed.
//! Provider-specific response fields are mapped into [`SearchResult`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::{SearchProvider, SearchResult};
use crate::{HuginnError, Result};

const TAVILY_BASE_URL: &str = "https://api.tavily.com";
const GOOGLE_BASE_URL: &str = "https://www.googleapis.com";

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .expect("failed to build HTTP client")
}

// ============================================================================
// Tavily
// ============================================================================

/// Tavily search API adapter.
pub struct TavilyProvider {
    api_key: String,
    http: Client,
    base_url: String,
}

impl TavilyProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self::with_base_url(api_key, timeout, TAVILY_BASE_URL)
    }

    /// Custom endpoint for testing with wiremock.
    pub fn with_base_url(
        api_key: impl Into<String>,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            http: build_client(timeout),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .json(&TavilyRequest {
                query,
                search_depth: "basic",
                max_results,
            })
            .send()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HuginnError::Api {
                status: status.as_u16(),
                message: format!("Tavily request failed with status {}", status.as_u16()),
            });
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))?;

        Ok(body
            .results
            .into_iter()
            .map(|r| SearchResult {
                title: r.title,
                href: r.url,
                body: r.content,
            })
            .collect())
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

// ============================================================================
// Google Custom Search
// ============================================================================

/// Google Custom Search API adapter.
pub struct GoogleSearchProvider {
    api_key: String,
    search_engine_id: String,
    http: Client,
    base_url: String,
}

impl GoogleSearchProvider {
    pub fn new(
        api_key: impl Into<String>,
        search_engine_id: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self::with_base_url(api_key, search_engine_id, timeout, GOOGLE_BASE_URL)
    }

    /// Custom endpoint for testing with wiremock.
    pub fn with_base_url(
        api_key: impl Into<String>,
        search_engine_id: impl Into<String>,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            search_engine_id: search_engine_id.into(),
            http: build_client(timeout),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .http
            .get(format!("{}/customsearch/v1", self.base_url))
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.search_engine_id.as_str()),
                ("q", query),
            ])
            .send()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HuginnError::Api {
                status: status.as_u16(),
                message: format!("Google request failed with status {}", status.as_u16()),
            });
        }

        let body: GoogleResponse = response
            .json()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))?;

        Ok(body
            .items
            .into_iter()
            .take(max_results)
            .map(|item| SearchResult {
                title: item.title,
                href: item.link,
                body: item.snippet.unwrap_or_default(),
            })
            .collect())
    }
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Deserialize)]
struct GoogleItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: Option<String>,
}
