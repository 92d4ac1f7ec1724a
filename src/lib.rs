//! Huginn - Resilience layer for LLM inference and web search
//!
//! This crate sits between an agent orchestrator and its external
//! dependencies: an LLM completion endpoint and a set of web search
//! backends. It absorbs rate limits, transient failures, and provider
//! blocking so the layers above see a simple async call that either
//! returns a usable answer or a classified error.
//!
//! # Inference Example
//!
//! ```rust,no_run
//! use huginn::Huginn;
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let huginn = Huginn::builder()
//!         .openai("sk-your-key")
//!         .model("gpt-4o")
//!         .build()?;
//!
//!     let answer = huginn
//!         .inference()
//!         .infer("Summarize the borrow checker in one sentence.", "demo-project")
//!         .await?;
//!
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```
//!
//! # Search Example
//!
//! ```rust,no_run
//! use huginn::Huginn;
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let huginn = Huginn::builder().openai("sk-your-key").build()?;
//!
//!     let hits = huginn.search().search("rust async runtime", 5).await?;
//!     for hit in hits {
//!         println!("{} - {}", hit.title, hit.href);
//!     }
//!     Ok(())
//! }
//! ```

mod builder;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod inference;
pub mod resilience;
pub mod search;
pub mod telemetry;
pub mod usage;

// Re-export main types at crate root
pub use builder::{Huginn, HuginnBuilder};
pub use error::{HuginnError, Result};

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, InferenceConfig, SearchConfig};
pub use events::{EventChannel, UsageEvent};
pub use inference::{CompletionProvider, InferenceClient, OpenAiProvider};
pub use resilience::{DailyQuota, IdentityPool, IncidentTracker};
pub use search::{
    DuckDuckGoProvider, GoogleSearchProvider, SearchClient, SearchProvider, SearchResult,
    TavilyProvider,
};
pub use usage::{InMemoryUsageStore, TokenCounter, UsageSink};
