//! LLM inference client: cache, rate gate, bounded retry, usage accounting.
//!
//! [`InferenceClient`] wraps a [`CompletionProvider`] with an exact-match
//! response cache, a per-model minute-window request gate, and exponential
//! backoff retry. The cache and rate-window maps are shared mutable state
//! across all concurrent callers and sit behind a single mutex; both grow
//! unbounded for the process lifetime, a known resource-growth trade-off
//! for long-running sessions.
//!
//! # Accounting order
//!
//! Prompt-side usage is accounted before the model check and the cache
//! lookup, and a cache hit also accounts the response side — a hit is
//! charged like a normal completion. This preserves the deployed
//! behaviour; whether hits should be exempt is pending product review.

pub mod provider;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::InferenceConfig;
use crate::events::{EventChannel, UsageEvent};
use crate::telemetry;
use crate::usage::{TokenCounter, UsageSink};
use crate::{HuginnError, Result};

pub use provider::{CompletionProvider, OpenAiProvider};

/// Fixed admission window size; also the wait applied on a breach.
const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Shared mutable state: memoized responses and per-model request windows.
///
/// Cache keys are exact (model, prompt) pairs, no partial or semantic
/// matching. Neither map is ever pruned.
#[derive(Default)]
struct InferenceState {
    cache: HashMap<(String, String), String>,
    windows: HashMap<String, HashMap<i64, u32>>,
}

/// Resilient LLM inference client.
pub struct InferenceClient {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    config: InferenceConfig,
    usage: Arc<dyn UsageSink>,
    events: EventChannel,
    clock: Arc<dyn Clock>,
    counter: TokenCounter,
    state: Mutex<InferenceState>,
}

impl InferenceClient {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        model: impl Into<String>,
        config: InferenceConfig,
        usage: Arc<dyn UsageSink>,
        events: EventChannel,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            model: model.into(),
            config,
            usage,
            events,
            clock,
            counter: TokenCounter::cl100k()?,
            state: Mutex::new(InferenceState::default()),
        })
    }

    /// Model identifier this client completes with.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one inference, attributed to `project`.
    ///
    /// Fails with [`HuginnError::Configuration`] when the provider does not
    /// serve the configured model, and [`HuginnError::RetriesExhausted`]
    /// after the retry budget is spent. Permanent provider errors propagate
    /// as-is.
    pub async fn infer(&self, prompt: &str, project: &str) -> Result<String> {
        let start = Instant::now();
        self.account(prompt, project, "prompt");

        if !self.provider.supports(&self.model) {
            return Err(HuginnError::Configuration(format!(
                "model '{}' not supported by provider '{}'",
                self.model,
                self.provider.name()
            )));
        }

        let key = (self.model.clone(), prompt.to_string());
        {
            let state = self.state.lock().await;
            if let Some(hit) = state.cache.get(&key).cloned() {
                drop(state);
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                debug!(model = %self.model, "inference cache hit");
                self.account(&hit, project, "completion");
                return Ok(hit);
            }
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);

        for attempt in 0..self.config.max_retries {
            self.admit().await;

            match self.provider.complete(&self.model, prompt).await {
                Ok(response) => {
                    self.state.lock().await.cache.insert(key, response.clone());
                    self.account(&response, project, "completion");
                    self.record_request(start, true);
                    return Ok(response);
                }
                Err(e) if e.is_transient() => {
                    metrics::counter!(telemetry::RETRIES_TOTAL,
                        "provider" => self.provider.name().to_owned(),
                        "operation" => "infer",
                    )
                    .increment(1);
                    let wait = self.config.retry_wait(attempt);
                    warn!(
                        provider = self.provider.name(),
                        model = %self.model,
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "retrying after transient inference error"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    self.record_request(start, false);
                    return Err(e);
                }
            }
        }

        self.record_request(start, false);
        Err(HuginnError::RetriesExhausted {
            model: self.model.clone(),
            attempts: self.config.max_retries,
        })
    }

    /// Coarse per-model admission gate.
    ///
    /// One capacity check against the current minute bucket; on a breach the
    /// caller sleeps a full window before incrementing whatever bucket is
    /// then current. Approximate on purpose: the post-sleep window is not
    /// guaranteed to have capacity under bursty low-limit traffic.
    async fn admit(&self) {
        let over = {
            let state = self.state.lock().await;
            let bucket = self.clock.minute_bucket();
            state
                .windows
                .get(&self.model)
                .and_then(|w| w.get(&bucket))
                .copied()
                .unwrap_or(0)
                >= self.config.requests_per_minute
        };

        if over {
            warn!(
                model = %self.model,
                requests_per_minute = self.config.requests_per_minute,
                "request rate limit reached, waiting for the window to roll over"
            );
            tokio::time::sleep(RATE_WINDOW).await;
        }

        let mut state = self.state.lock().await;
        let bucket = self.clock.minute_bucket();
        *state
            .windows
            .entry(self.model.clone())
            .or_default()
            .entry(bucket)
            .or_insert(0) += 1;
    }

    /// Account `text` against the project and publish the running total.
    fn account(&self, text: &str, project: &str, direction: &'static str) {
        let tokens = self.counter.count(text);
        self.usage.record(project, tokens);
        metrics::counter!(telemetry::TOKENS_TOTAL, "direction" => direction).increment(tokens);
        self.events.emit(UsageEvent {
            project: project.to_string(),
            total_tokens: self.usage.latest(project),
        });
    }

    fn record_request(&self, start: Instant, ok: bool) {
        let status = if ok { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => self.provider.name().to_owned(),
            "operation" => "infer",
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "provider" => self.provider.name().to_owned(),
            "operation" => "infer",
        )
        .record(start.elapsed().as_secs_f64());
    }
}
