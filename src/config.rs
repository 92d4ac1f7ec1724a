//! Configuration surface for the inference and search clients.
//!
//! All options are optional in the TOML source; missing fields take the
//! defaults the original deployment shipped with. Durations are expressed
//! in seconds.
//!
//! ```toml
//! [inference]
//! requests_per_minute = 60
//! max_retries = 3
//!
//! [search]
//! daily_request_limit = 100
//! regions = ["wt-wt", "us-en"]
//!
//! [search.fallbacks.tavily]
//! enabled = true
//! api_key = "tvly-..."
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{HuginnError, Result};

/// Top-level configuration file layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            HuginnError::Configuration(format!(
                "cannot read config file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| HuginnError::Configuration(e.to_string()))
    }
}

/// Inference client options.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    /// Per-model request budget within a one-minute window (default: 60).
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
    /// Reserved for a token-bucket admission gate (default: 10).
    ///
    /// Accepted for compatibility with existing config files; the coarse
    /// minute-window gate does not consume it.
    /// TODO: wire into a token-bucket gate if the coarse window proves too
    /// loose for low `requests_per_minute` deployments.
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
    /// Adapter attempts before raising exhaustion (default: 3).
    #[serde(default = "default_inference_max_retries")]
    pub max_retries: u32,
    /// Base wait between attempts, in seconds (default: 2.0).
    #[serde(default = "default_retry_delay")]
    pub retry_delay: f64,
    /// Exponential growth factor for retry waits (default: 2.0).
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            burst_size: default_burst_size(),
            max_retries: default_inference_max_retries(),
            retry_delay: default_retry_delay(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl InferenceConfig {
    /// Wait before the retry following `attempt` (0-indexed):
    /// `retry_delay * backoff_factor^attempt`.
    pub fn retry_wait(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.retry_delay * self.backoff_factor.powi(attempt as i32))
    }
}

/// Search client and primary-adapter options.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Minimum spacing between primary attempts, in seconds (default: 3.0).
    #[serde(default = "default_request_delay")]
    pub request_delay: f64,
    /// Accepted for compatibility; the per-call flow makes a single primary
    /// attempt and degrades to fallbacks (default: 5).
    #[serde(default = "default_search_max_retries")]
    pub max_retries: u32,
    /// HTTP timeout for search requests, in seconds (default: 20).
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Accepted for compatibility, see `max_retries` (default: 2.0).
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Add a random fraction of a second to pacing waits (default: true).
    #[serde(default = "default_true")]
    pub jitter: bool,
    /// Rolling window for incident counting, in seconds (default: 600).
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window: u64,
    /// Incidents within the window that arm extended backoff (default: 3).
    #[serde(default = "default_max_incidents")]
    pub max_incidents_before_extended_backoff: usize,
    /// Extended backoff duration, in seconds (default: 1800).
    #[serde(default = "default_extended_backoff_time")]
    pub extended_backoff_time: u64,
    /// Daily ceiling on primary-provider calls (default: 100).
    #[serde(default = "default_daily_request_limit")]
    pub daily_request_limit: u32,
    /// Pick a fresh user agent every N calls (default: 2).
    #[serde(default = "default_rotate_user_agent_every")]
    pub rotate_user_agent_every: u32,
    /// Rebuild the HTTP client on a cadence for a fresh connection
    /// identity (default: true).
    #[serde(default = "default_true")]
    pub ip_rotation_enabled: bool,
    /// Calls between HTTP client rebuilds (default: 5).
    #[serde(default = "default_ip_rotation_frequency")]
    pub ip_rotation_frequency: u32,
    /// Region codes cycled round-robin on every primary call.
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,
    /// Path of the persisted `"<date>,<count>"` daily counter.
    #[serde(default = "default_counter_file")]
    pub counter_file: PathBuf,
    /// Fallback engines, tried in declaration order after the primary.
    #[serde(default)]
    pub fallbacks: FallbacksConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            request_delay: default_request_delay(),
            max_retries: default_search_max_retries(),
            timeout: default_timeout(),
            backoff_factor: default_backoff_factor(),
            jitter: default_true(),
            rate_limit_window: default_rate_limit_window(),
            max_incidents_before_extended_backoff: default_max_incidents(),
            extended_backoff_time: default_extended_backoff_time(),
            daily_request_limit: default_daily_request_limit(),
            rotate_user_agent_every: default_rotate_user_agent_every(),
            ip_rotation_enabled: default_true(),
            ip_rotation_frequency: default_ip_rotation_frequency(),
            regions: default_regions(),
            counter_file: default_counter_file(),
            fallbacks: FallbacksConfig::default(),
        }
    }
}

impl SearchConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.request_delay)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window)
    }

    pub fn extended_backoff_time(&self) -> Duration {
        Duration::from_secs(self.extended_backoff_time)
    }
}

/// Fallback engine credentials and toggles.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FallbacksConfig {
    #[serde(default)]
    pub tavily: TavilyConfig,
    #[serde(default)]
    pub google: GoogleConfig,
}

/// Tavily fallback engine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TavilyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
}

/// Google Custom Search fallback engine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub search_engine_id: String,
}

fn default_requests_per_minute() -> u32 {
    60
}

fn default_burst_size() -> u32 {
    10
}

fn default_inference_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> f64 {
    2.0
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_request_delay() -> f64 {
    3.0
}

fn default_search_max_retries() -> u32 {
    5
}

fn default_timeout() -> u64 {
    20
}

fn default_true() -> bool {
    true
}

fn default_rate_limit_window() -> u64 {
    600
}

fn default_max_incidents() -> usize {
    3
}

fn default_extended_backoff_time() -> u64 {
    1800
}

fn default_daily_request_limit() -> u32 {
    100
}

fn default_rotate_user_agent_every() -> u32 {
    2
}

fn default_ip_rotation_frequency() -> u32 {
    5
}

fn default_regions() -> Vec<String> {
    vec!["wt-wt".to_string(), "us-en".to_string(), "uk-en".to_string()]
}

fn default_counter_file() -> PathBuf {
    PathBuf::from(".search_request_counter")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_deployment() {
        let config = Config::default();
        assert_eq!(config.inference.requests_per_minute, 60);
        assert_eq!(config.inference.max_retries, 3);
        assert_eq!(config.inference.retry_delay, 2.0);
        assert_eq!(config.search.daily_request_limit, 100);
        assert_eq!(config.search.max_incidents_before_extended_backoff, 3);
        assert_eq!(config.search.extended_backoff_time, 1800);
        assert_eq!(config.search.rotate_user_agent_every, 2);
        assert_eq!(config.search.regions, vec!["wt-wt", "us-en", "uk-en"]);
        assert!(config.search.jitter);
        assert!(!config.search.fallbacks.tavily.enabled);
    }

    #[test]
    fn retry_wait_grows_exponentially() {
        let config = InferenceConfig::default();
        assert_eq!(config.retry_wait(0), Duration::from_secs(2));
        assert_eq!(config.retry_wait(1), Duration::from_secs(4));
        assert_eq!(config.retry_wait(2), Duration::from_secs(8));
    }

    #[test]
    fn recognises_all_documented_option_names() {
        let config = Config::from_toml(
            r#"
            [inference]
            requests_per_minute = 10
            burst_size = 4
            max_retries = 2
            retry_delay = 0.5
            backoff_factor = 3.0

            [search]
            request_delay = 1.0
            max_retries = 4
            timeout = 10
            backoff_factor = 1.5
            jitter = false
            rate_limit_window = 300
            max_incidents_before_extended_backoff = 2
            extended_backoff_time = 900
            daily_request_limit = 50
            rotate_user_agent_every = 3
            ip_rotation_enabled = false
            ip_rotation_frequency = 7
            regions = ["us-en"]

            [search.fallbacks.tavily]
            enabled = true
            api_key = "tvly-test"

            [search.fallbacks.google]
            enabled = true
            api_key = "g-test"
            search_engine_id = "cx-test"
            "#,
        )
        .unwrap();

        assert_eq!(config.inference.requests_per_minute, 10);
        assert_eq!(config.inference.burst_size, 4);
        assert_eq!(config.search.regions, vec!["us-en"]);
        assert!(!config.search.jitter);
        assert!(!config.search.ip_rotation_enabled);
        assert_eq!(config.search.fallbacks.google.search_engine_id, "cx-test");
    }

    #[test]
    fn empty_toml_falls_back_to_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.search.timeout, 20);
        assert_eq!(config.inference.burst_size, 10);
    }
}
