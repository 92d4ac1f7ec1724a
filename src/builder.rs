//! Builder wiring the resilience layer together.
//!
//! The orchestrator owns one [`Huginn`] per session and passes the client
//! handles to its sub-agents; there is no hidden global state.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::events::EventChannel;
use crate::inference::{CompletionProvider, InferenceClient, OpenAiProvider};
use crate::search::{
    DuckDuckGoProvider, GoogleSearchProvider, SearchClient, SearchProvider, TavilyProvider,
};
use crate::usage::{InMemoryUsageStore, UsageSink};
use crate::{HuginnError, Result};

/// The assembled resilience layer: one inference client, one search client.
pub struct Huginn {
    inference: InferenceClient,
    search: SearchClient,
}

impl Huginn {
    /// Create a new builder.
    pub fn builder() -> HuginnBuilder {
        HuginnBuilder::new()
    }

    pub fn inference(&self) -> &InferenceClient {
        &self.inference
    }

    pub fn search(&self) -> &SearchClient {
        &self.search
    }
}

/// Builder for [`Huginn`].
pub struct HuginnBuilder {
    config: Config,
    model: String,
    openai_key: Option<String>,
    openai_base_url: Option<String>,
    models: Option<Vec<String>>,
    completion_provider: Option<Arc<dyn CompletionProvider>>,
    search_primary: Option<Arc<dyn SearchProvider>>,
    usage: Option<Arc<dyn UsageSink>>,
    events: EventChannel,
    clock: Option<Arc<dyn Clock>>,
}

impl HuginnBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            model: "gpt-4o".to_string(),
            openai_key: None,
            openai_base_url: None,
            models: None,
            completion_provider: None,
            search_primary: None,
            usage: None,
            events: EventChannel::disabled(),
            clock: None,
        }
    }

    /// Use a loaded configuration (defaults otherwise).
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Configure the OpenAI-compatible completion backend.
    pub fn openai(mut self, api_key: impl Into<String>) -> Self {
        self.openai_key = Some(api_key.into());
        self
    }

    /// Point the completion backend at a custom endpoint (Azure-style
    /// deployments).
    pub fn openai_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_base_url = Some(base_url.into());
        self
    }

    /// Model identifier used for inference (default: "gpt-4o").
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Restrict the model identifiers the OpenAI backend serves.
    pub fn served_models(mut self, models: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.models = Some(models.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the completion backend with a custom provider.
    pub fn completion_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion_provider = Some(provider);
        self
    }

    /// Replace the primary search adapter.
    pub fn search_primary(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search_primary = Some(provider);
        self
    }

    /// External usage accounting store (in-memory otherwise).
    pub fn usage_sink(mut self, sink: Arc<dyn UsageSink>) -> Self {
        self.usage = Some(sink);
        self
    }

    /// Subscribe a usage event channel.
    pub fn events(mut self, events: EventChannel) -> Self {
        self.events = events;
        self
    }

    /// Inject a clock (system clock otherwise).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the layer.
    ///
    /// Fails with [`HuginnError::Configuration`] when no completion backend
    /// is configured, or when an enabled search fallback is missing its
    /// credentials.
    pub fn build(self) -> Result<Huginn> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let usage = self
            .usage
            .unwrap_or_else(|| Arc::new(InMemoryUsageStore::new()));

        let completion: Arc<dyn CompletionProvider> = match (self.completion_provider, self.openai_key)
        {
            (Some(provider), _) => provider,
            (None, Some(key)) => {
                let provider = match self.openai_base_url {
                    Some(url) => OpenAiProvider::with_base_url(key, url),
                    None => OpenAiProvider::new(key),
                };
                let provider = match self.models {
                    Some(models) => provider.models(models),
                    None => provider,
                };
                Arc::new(provider)
            }
            (None, None) => {
                return Err(HuginnError::Configuration(
                    "no completion provider configured".to_string(),
                ));
            }
        };

        let search_config = self.config.search.clone();
        let timeout = search_config.timeout();

        let mut fallbacks: Vec<Arc<dyn SearchProvider>> = Vec::new();
        let tavily = &search_config.fallbacks.tavily;
        if tavily.enabled {
            if tavily.api_key.is_empty() {
                return Err(HuginnError::Configuration(
                    "tavily fallback enabled but api_key is missing".to_string(),
                ));
            }
            fallbacks.push(Arc::new(TavilyProvider::new(&tavily.api_key, timeout)));
        }
        let google = &search_config.fallbacks.google;
        if google.enabled {
            if google.api_key.is_empty() || google.search_engine_id.is_empty() {
                return Err(HuginnError::Configuration(
                    "google fallback enabled but api_key or search_engine_id is missing"
                        .to_string(),
                ));
            }
            fallbacks.push(Arc::new(GoogleSearchProvider::new(
                &google.api_key,
                &google.search_engine_id,
                timeout,
            )));
        }

        let primary = self
            .search_primary
            .unwrap_or_else(|| Arc::new(DuckDuckGoProvider::new(&search_config)));

        let inference = InferenceClient::new(
            completion,
            self.model,
            self.config.inference.clone(),
            usage,
            self.events,
            clock.clone(),
        )?;
        let search = SearchClient::new(primary, fallbacks, search_config, clock);

        Ok(Huginn { inference, search })
    }
}

impl Default for HuginnBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_a_completion_provider() {
        let result = Huginn::builder().build();
        assert!(matches!(result, Err(HuginnError::Configuration(_))));
    }

    #[test]
    fn enabled_fallback_without_credentials_is_a_configuration_error() {
        let config = Config::from_toml(
            r#"
            [search.fallbacks.tavily]
            enabled = true
            "#,
        )
        .unwrap();
        let result = Huginn::builder().openai("sk-test").config(config).build();
        assert!(matches!(result, Err(HuginnError::Configuration(_))));
    }

    #[test]
    fn google_fallback_requires_engine_id() {
        let config = Config::from_toml(
            r#"
            [search.fallbacks.google]
            enabled = true
            api_key = "g-test"
            "#,
        )
        .unwrap();
        let result = Huginn::builder().openai("sk-test").config(config).build();
        assert!(matches!(result, Err(HuginnError::Configuration(_))));
    }

    #[test]
    fn builds_with_key_and_default_config() {
        let huginn = Huginn::builder().openai("sk-test").build().unwrap();
        assert_eq!(huginn.inference().model(), "gpt-4o");
    }
}
