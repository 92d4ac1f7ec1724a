//! Huginn error types

/// Huginn error types
#[derive(Debug, thiserror::Error)]
pub enum HuginnError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A scan over a provider response body failed to locate an expected
    /// marker (anti-automation token, results payload delimiters).
    ///
    /// This is a provider failure, not a crash: callers degrade to the next
    /// provider in the chain.
    #[error("extraction failed: {0}")]
    Extraction(&'static str),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors (fatal, never retried)
    #[error("configuration error: {0}")]
    Configuration(String),

    // Exhaustion errors (raised to the orchestrator)
    #[error("inference failed for model '{model}' after {attempts} attempts")]
    RetriesExhausted { model: String, attempts: u32 },

    #[error("all search providers failed")]
    SearchExhausted,
}

/// Throttling/blocking signatures matched against rendered provider errors.
///
/// Case-insensitive substring match. "202" covers the scrape endpoint's
/// soft-block status, which surfaces inside `Api` error messages.
const THROTTLE_SIGNATURES: &[&str] = &[
    "rate",
    "limit",
    "429",
    "too many requests",
    "ratelimit",
    "202",
    "blocked",
];

impl HuginnError {
    /// Whether this error should be retried locally or trigger fallback.
    ///
    /// Transport errors, throttling statuses, server errors, and extraction
    /// failures are transient. Configuration and exhaustion errors are
    /// permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            HuginnError::Http(_) | HuginnError::Extraction(_) => true,
            HuginnError::Api { status, .. } => *status == 429 || *status == 202 || *status >= 500,
            HuginnError::Json(_) => true,
            HuginnError::Configuration(_)
            | HuginnError::RetriesExhausted { .. }
            | HuginnError::SearchExhausted => false,
        }
    }

    /// Whether this error looks like a throttling/blocking incident.
    ///
    /// Matched failures feed the incident tracker; unmatched failures are
    /// ordinary provider errors.
    pub fn is_throttle_signal(&self) -> bool {
        let text = self.to_string().to_lowercase();
        THROTTLE_SIGNATURES.iter().any(|sig| text.contains(sig))
    }
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, HuginnError>;
