//! Web search client: quota and backoff gates, scraping primary, fallbacks.
//!
//! [`SearchClient`] derives its state from two gates rather than an
//! explicit machine: a persisted daily quota and an extended-backoff
//! expiry armed by repeated throttling incidents. While either gate is
//! closed, calls return clearly marked placeholder results without
//! touching a provider or the quota. Otherwise the scraping primary is
//! attempted once, then the enabled fallbacks in configured order; only
//! when every provider fails in the same call does the caller see an
//! exhaustion error.

pub mod duckduckgo;
mod extract;
pub mod fallback;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::clock::Clock;
use crate::config::SearchConfig;
use crate::resilience::{DailyQuota, IncidentTracker};
use crate::telemetry;
use crate::{HuginnError, Result};

pub use duckduckgo::DuckDuckGoProvider;
pub use fallback::{GoogleSearchProvider, TavilyProvider};
pub use traits::{SearchProvider, SearchResult};

/// Result count used by callers that do not specify one.
pub const DEFAULT_MAX_RESULTS: usize = 10;

const PLACEHOLDER_BODY: &str =
    "Search could not be completed. Please try again later or refine your search query.";

/// Gate and incident state, updated atomically per call. Never held across
/// a provider await.
struct SearchState {
    quota: DailyQuota,
    incidents: IncidentTracker,
    backoff_until: Option<Instant>,
    last_request: Option<Instant>,
    last_success: Option<Instant>,
}

/// Resilient multi-provider search client.
pub struct SearchClient {
    primary: Arc<dyn SearchProvider>,
    fallbacks: Vec<Arc<dyn SearchProvider>>,
    config: SearchConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<SearchState>,
}

impl SearchClient {
    pub fn new(
        primary: Arc<dyn SearchProvider>,
        fallbacks: Vec<Arc<dyn SearchProvider>>,
        config: SearchConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let quota = DailyQuota::load(config.counter_file.clone(), clock.today_utc());
        Self {
            primary,
            fallbacks,
            config,
            clock,
            state: Mutex::new(SearchState {
                quota,
                incidents: IncidentTracker::new(),
                backoff_until: None,
                last_request: None,
                last_success: None,
            }),
        }
    }

    /// Run a search, returning at most `max_results` hits.
    ///
    /// While the daily quota or extended backoff gate is closed this
    /// returns placeholder results and performs no provider call. Raises
    /// [`HuginnError::SearchExhausted`] only when the primary and every
    /// enabled fallback fail in the same call.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        debug!(query, "executing search");
        let start = std::time::Instant::now();

        let pacing = {
            let mut state = self.state.lock().await;

            let today = self.clock.today_utc();
            if state.quota.count(today) >= self.config.daily_request_limit {
                warn!(
                    limit = self.config.daily_request_limit,
                    "daily request limit reached, returning placeholder results"
                );
                metrics::counter!(telemetry::PLACEHOLDERS_TOTAL, "reason" => "daily_limit")
                    .increment(1);
                return Ok(placeholder_results(query, max_results));
            }

            let now = Instant::now();
            if let Some(until) = state.backoff_until {
                if now < until {
                    warn!(
                        remaining_secs = until.duration_since(now).as_secs(),
                        "in extended backoff period, returning placeholder results"
                    );
                    metrics::counter!(telemetry::PLACEHOLDERS_TOTAL, "reason" => "extended_backoff")
                        .increment(1);
                    return Ok(placeholder_results(query, max_results));
                }
            }

            let wait = self.pacing_wait(state.last_request, now);
            state.last_request = Some(now + wait);
            wait
        };

        if pacing > Duration::ZERO {
            debug!(wait_ms = pacing.as_millis() as u64, "pacing primary request");
            tokio::time::sleep(pacing).await;
        }

        match self.primary.search(query, max_results).await {
            Ok(results) => {
                let mut state = self.state.lock().await;
                state.quota.increment(self.clock.today_utc());
                state.last_success = Some(Instant::now());
                drop(state);
                self.record_request(self.primary.name(), start, true);
                Ok(results)
            }
            Err(e) => {
                error!(provider = self.primary.name(), error = %e, "primary search engine failed");
                self.record_request(self.primary.name(), start, false);
                if e.is_throttle_signal() {
                    self.record_incident().await;
                }
                self.try_fallbacks(query, max_results, start).await
            }
        }
    }

    /// Time since the last successful primary call, if any.
    pub async fn last_success_age(&self) -> Option<Duration> {
        let state = self.state.lock().await;
        state.last_success.map(|t| t.elapsed())
    }

    /// Remaining wait to honour `request_delay` spacing, with jitter.
    fn pacing_wait(&self, last_request: Option<Instant>, now: Instant) -> Duration {
        let Some(last) = last_request else {
            return Duration::ZERO;
        };
        let elapsed = now.duration_since(last);
        let delay = self.config.request_delay();
        if elapsed >= delay {
            return Duration::ZERO;
        }
        let mut wait = delay - elapsed;
        if self.config.jitter {
            wait += Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..1.0));
        }
        wait
    }

    /// Record a throttling incident and arm extended backoff at the
    /// threshold.
    async fn record_incident(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        metrics::counter!(telemetry::INCIDENTS_TOTAL).increment(1);
        let count = state
            .incidents
            .record_and_count(now, self.config.rate_limit_window());
        if count >= self.config.max_incidents_before_extended_backoff {
            warn!(
                incidents = count,
                backoff_secs = self.config.extended_backoff_time,
                "too many rate limit incidents, enabling extended backoff"
            );
            state.backoff_until = Some(now + self.config.extended_backoff_time());
        }
    }

    async fn try_fallbacks(
        &self,
        query: &str,
        max_results: usize,
        start: std::time::Instant,
    ) -> Result<Vec<SearchResult>> {
        for provider in &self.fallbacks {
            match provider.search(query, max_results).await {
                Ok(results) => {
                    self.record_request(provider.name(), start, true);
                    return Ok(results);
                }
                Err(e) => {
                    error!(provider = provider.name(), error = %e, "fallback engine failed");
                    self.record_request(provider.name(), start, false);
                }
            }
        }
        Err(HuginnError::SearchExhausted)
    }

    fn record_request(&self, provider: &str, start: std::time::Instant, ok: bool) {
        let status = if ok { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => provider.to_owned(),
            "operation" => "search",
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "provider" => provider.to_owned(),
            "operation" => "search",
        )
        .record(start.elapsed().as_secs_f64());
    }
}

/// Synthesized results returned while a gate is closed.
///
/// Same shape as real hits, clearly marked, and never counted against the
/// quota or the incident tracker.
fn placeholder_results(query: &str, max_results: usize) -> Vec<SearchResult> {
    let href = format!("https://duckduckgo.com/?q={}", query.replace(' ', "+"));
    (0..max_results)
        .map(|i| SearchResult {
            title: if i == 0 {
                format!("Search result 1 for '{query}'")
            } else {
                format!("Alternative search result for '{query}'")
            },
            href: href.clone(),
            body: PLACEHOLDER_BODY.to_string(),
        })
        .collect()
}
