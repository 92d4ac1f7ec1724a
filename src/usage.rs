//! Per-project usage accounting.
//!
//! Token counts are measured with the cl100k_base BPE and pushed into a
//! [`UsageSink`] — the external accounting store the orchestrator owns.
//! The in-memory store here is the default for tests and single-process
//! runs.

use std::collections::HashMap;
use std::sync::Mutex;

use tiktoken_rs::CoreBPE;

use crate::{HuginnError, Result};

/// External per-project accounting store.
pub trait UsageSink: Send + Sync {
    /// Add `tokens` to the project's running total.
    fn record(&self, project: &str, tokens: u64);

    /// Current running total for the project (0 if unseen).
    fn latest(&self, project: &str) -> u64;
}

/// Process-local usage store keyed by project name.
#[derive(Default)]
pub struct InMemoryUsageStore {
    totals: Mutex<HashMap<String, u64>>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsageSink for InMemoryUsageStore {
    fn record(&self, project: &str, tokens: u64) {
        let mut totals = self.totals.lock().expect("usage store poisoned");
        *totals.entry(project.to_string()).or_default() += tokens;
    }

    fn latest(&self, project: &str) -> u64 {
        let totals = self.totals.lock().expect("usage store poisoned");
        totals.get(project).copied().unwrap_or(0)
    }
}

/// cl100k_base token counter.
pub struct TokenCounter {
    bpe: CoreBPE,
}

impl TokenCounter {
    /// Build the cl100k_base encoder.
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| HuginnError::Configuration(format!("cannot load cl100k_base: {e}")))?;
        Ok(Self { bpe })
    }

    /// Number of tokens in `text`.
    pub fn count(&self, text: &str) -> u64 {
        self.bpe.encode_with_special_tokens(text).len() as u64
    }
}
