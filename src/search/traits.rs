//! Search provider trait and the normalized result shape.

use async_trait::async_trait;
use serde::Serialize;

use crate::Result;

/// A normalized search hit. Provider-specific fields are mapped into this
/// common shape by each adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub href: String,
    pub body: String,
}

/// Provider of web search results.
///
/// Every adapter — the scraping primary and the API-key fallbacks — exposes
/// the same call; the search client owns ordering, gating, and degradation.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Run a query, returning at most `max_results` normalized hits.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;
}
