//! Scraping adapter for the primary search engine (DuckDuckGo).
//!
//! No API: results come from a two-step exchange against the HTML
//! endpoints. A handshake request yields a page embedding the `vqd`
//! anti-automation token; a second request against the links host returns
//! a script body embedding the results JSON. Both extractions are byte
//! scans (see [`extract`](super::extract)) and fail soft as provider
//! errors.
//!
//! To blunt fingerprinting the adapter rotates the `kl` region parameter
//! round-robin on every call, picks a fresh user agent from the identity
//! pool on a configured cadence, and rebuilds its HTTP client every
//! `ip_rotation_frequency` calls for a fresh connection identity.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, redirect};
use serde::Deserialize;
use tracing::debug;

use super::extract::{extract_results_json, extract_vqd, normalize_html, normalize_url};
use super::traits::{SearchProvider, SearchResult};
use crate::config::SearchConfig;
use crate::resilience::IdentityPool;
use crate::{HuginnError, Result};

const DEFAULT_BASE_URL: &str = "https://duckduckgo.com";
const DEFAULT_LINKS_URL: &str = "https://links.duckduckgo.com";
const REFERER: &str = "https://duckduckgo.com/";

/// Scraping search adapter with identity rotation.
pub struct DuckDuckGoProvider {
    base_url: String,
    links_url: String,
    timeout: Duration,
    rotate_user_agent_every: u32,
    ip_rotation_enabled: bool,
    ip_rotation_frequency: u32,
    regions: Vec<String>,
    rotation: Mutex<Rotation>,
}

/// Per-call rotation state. Held only while choosing an identity, never
/// across a request await.
struct Rotation {
    http: Client,
    region_index: usize,
    request_count: u32,
    user_agents: IdentityPool,
    current_agent: Option<String>,
}

impl DuckDuckGoProvider {
    pub fn new(config: &SearchConfig) -> Self {
        Self::with_base_urls(config, DEFAULT_BASE_URL, DEFAULT_LINKS_URL)
    }

    /// Custom endpoints for testing with wiremock.
    pub fn with_base_urls(
        config: &SearchConfig,
        base_url: impl Into<String>,
        links_url: impl Into<String>,
    ) -> Self {
        let timeout = config.timeout();
        Self {
            base_url: base_url.into(),
            links_url: links_url.into(),
            timeout,
            rotate_user_agent_every: config.rotate_user_agent_every.max(1),
            ip_rotation_enabled: config.ip_rotation_enabled,
            ip_rotation_frequency: config.ip_rotation_frequency.max(1),
            regions: config.regions.clone(),
            rotation: Mutex::new(Rotation {
                http: build_client(timeout),
                region_index: 0,
                request_count: 0,
                user_agents: IdentityPool::user_agents(),
                current_agent: None,
            }),
        }
    }

    /// Rotate identities and return what this call should use.
    fn rotate(&self) -> (Client, String, Option<String>) {
        let mut rotation = self.rotation.lock().expect("rotation state poisoned");

        if self.ip_rotation_enabled
            && rotation.request_count > 0
            && rotation.request_count % self.ip_rotation_frequency == 0
        {
            rotation.http = build_client(self.timeout);
            debug!(request_count = rotation.request_count, "rebuilt HTTP client");
        }

        if rotation.request_count % self.rotate_user_agent_every == 0 {
            let agent = rotation.user_agents.next();
            debug!(request_count = rotation.request_count, "rotated user agent");
            rotation.current_agent = Some(agent);
        }

        let region = if self.regions.is_empty() {
            "wt-wt".to_string()
        } else {
            let region = self.regions[rotation.region_index % self.regions.len()].clone();
            rotation.region_index = (rotation.region_index + 1) % self.regions.len();
            region
        };

        (
            rotation.http.clone(),
            region,
            rotation.current_agent.clone(),
        )
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let (client, region, agent) = self.rotate();

        // step 1: handshake, yields the vqd token
        let response = client
            .post(format!("{}/", self.base_url))
            .header("Referer", REFERER)
            .form(&[("q", query)])
            .send()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(HuginnError::Api {
                status: status.as_u16(),
                message: format!("handshake returned status {}", status.as_u16()),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))?;
        let vqd =
            extract_vqd(&body).ok_or(HuginnError::Extraction("vqd token not found in handshake"))?;

        // step 2: parameterized results request
        let mut request = client
            .get(format!("{}/d.js", self.links_url))
            .header("Referer", REFERER)
            .query(&[
                ("q", query),
                ("kl", region.as_str()),
                ("p", "1"),
                ("s", "0"),
                ("df", ""),
                ("vqd", vqd.as_str()),
                ("ex", ""),
            ]);
        if let Some(agent) = &agent {
            request = request.header("User-Agent", agent);
        }

        let response = request
            .send()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(HuginnError::Api {
                status: status.as_u16(),
                message: format!("results request returned status {}", status.as_u16()),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))?;
        let payload = extract_results_json(&body)
            .ok_or(HuginnError::Extraction("results payload markers not found"))?;
        let rows: Vec<RawRow> = serde_json::from_slice(payload)?;

        // nav row the result page always carries
        let nav_href = format!("http://www.google.com/search?q={query}");

        let mut results = Vec::new();
        for row in rows {
            let Some(href) = row.u else { continue };
            if href == nav_href {
                continue;
            }
            let body = normalize_html(row.a.as_deref().unwrap_or(""));
            if body.is_empty() {
                continue;
            }
            results.push(SearchResult {
                title: normalize_html(row.t.as_deref().unwrap_or("")),
                href: normalize_url(&href),
                body,
            });
            if results.len() >= max_results {
                break;
            }
        }

        self.rotation
            .lock()
            .expect("rotation state poisoned")
            .request_count += 1;
        Ok(results)
    }
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .redirect(redirect::Policy::none())
        .build()
        .expect("failed to build HTTP client")
}

/// One raw result row from the d.js payload.
#[derive(Deserialize)]
struct RawRow {
    /// Result URL.
    #[serde(default)]
    u: Option<String>,
    /// Title HTML.
    #[serde(default)]
    t: Option<String>,
    /// Abstract/body HTML.
    #[serde(default)]
    a: Option<String>,
}
