//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider` — provider name (e.g. "openai", "duckduckgo", "tavily")
//! - `operation` — operation invoked ("infer" | "search")
//! - `status` — outcome: "ok" or "error"
//! - `direction` — token direction: "prompt" or "completion"

/// Total provider requests dispatched.
///
/// Labels: `provider`, `operation`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "huginn_requests_total";

/// Request duration in seconds, measured across retries and fallbacks.
///
/// Labels: `provider`, `operation`.
pub const REQUEST_DURATION_SECONDS: &str = "huginn_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`, `operation`.
pub const RETRIES_TOTAL: &str = "huginn_retries_total";

/// Total tokens accounted against projects.
///
/// Labels: `direction` ("prompt" | "completion").
pub const TOKENS_TOTAL: &str = "huginn_tokens_total";

/// Total inference cache hits.
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Total inference cache misses.
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Total throttling/blocking incidents recorded against the primary
/// search provider.
pub const INCIDENTS_TOTAL: &str = "huginn_throttle_incidents_total";

/// Total search calls answered with placeholder results instead of a
/// provider call.
///
/// Labels: `reason` ("daily_limit" | "extended_backoff").
pub const PLACEHOLDERS_TOTAL: &str = "huginn_search_placeholders_total";
