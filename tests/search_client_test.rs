use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use huginn::search::{SearchClient, SearchProvider, SearchResult};
use huginn::{HuginnError, ManualClock, Result, SearchConfig};
use tempfile::TempDir;

/// Mock search engine with a scripted outcome per call.
struct ScriptedEngine {
    name: &'static str,
    outcome: fn() -> Result<Vec<SearchResult>>,
    total_calls: AtomicU32,
}

impl ScriptedEngine {
    fn new(name: &'static str, outcome: fn() -> Result<Vec<SearchResult>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome,
            total_calls: AtomicU32::new(0),
        })
    }

    fn call_count(&self) -> u32 {
        self.total_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SearchProvider for ScriptedEngine {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        (self.outcome)()
    }
}

fn one_hit() -> Result<Vec<SearchResult>> {
    Ok(vec![SearchResult {
        title: "Rust".into(),
        href: "https://www.rust-lang.org".into(),
        body: "A language empowering everyone.".into(),
    }])
}

fn throttled() -> Result<Vec<SearchResult>> {
    Err(HuginnError::Api {
        status: 202,
        message: "blocked".into(),
    })
}

fn broken() -> Result<Vec<SearchResult>> {
    Err(HuginnError::Http("connection refused".into()))
}

fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at(
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    ))
}

/// Config with pacing and jitter disabled so timing assertions are exact.
fn test_config(dir: &TempDir) -> SearchConfig {
    SearchConfig {
        request_delay: 0.0,
        jitter: false,
        counter_file: dir.path().join("counter"),
        ..SearchConfig::default()
    }
}

#[tokio::test]
async fn exhausted_daily_quota_yields_placeholders_without_provider_calls() {
    let dir = TempDir::new().unwrap();
    let primary = ScriptedEngine::new("primary", one_hit);
    let config = SearchConfig {
        daily_request_limit: 0,
        ..test_config(&dir)
    };
    let client = SearchClient::new(primary.clone(), vec![], config, test_clock());

    let results = client.search("rust", 5).await.unwrap();

    assert_eq!(results.len(), 5);
    assert_eq!(results[0].title, "Search result 1 for 'rust'");
    assert!(
        results[1..]
            .iter()
            .all(|r| r.title == "Alternative search result for 'rust'")
    );
    assert_eq!(primary.call_count(), 0);
}

#[tokio::test]
async fn quota_counts_only_successful_primary_calls() {
    let dir = TempDir::new().unwrap();
    let primary = ScriptedEngine::new("primary", one_hit);
    let config = SearchConfig {
        daily_request_limit: 2,
        ..test_config(&dir)
    };
    let counter_file = config.counter_file.clone();
    let client = SearchClient::new(primary.clone(), vec![], config, test_clock());

    client.search("one", 5).await.unwrap();
    client.search("two", 5).await.unwrap();
    let third = client.search("three", 5).await.unwrap();

    assert_eq!(primary.call_count(), 2);
    assert_eq!(third[0].title, "Search result 1 for 'three'");
    assert_eq!(
        std::fs::read_to_string(counter_file).unwrap(),
        "2024-05-01,2"
    );
}

#[tokio::test]
async fn quota_resets_at_the_utc_date_change() {
    let dir = TempDir::new().unwrap();
    let primary = ScriptedEngine::new("primary", one_hit);
    let config = SearchConfig {
        daily_request_limit: 1,
        ..test_config(&dir)
    };
    let clock = test_clock();
    let client = SearchClient::new(primary.clone(), vec![], config, clock.clone());

    client.search("one", 5).await.unwrap();
    let gated = client.search("two", 5).await.unwrap();
    assert_eq!(gated[0].title, "Search result 1 for 'two'");
    assert_eq!(primary.call_count(), 1);

    clock.advance(chrono::Duration::days(1));
    client.search("three", 5).await.unwrap();
    assert_eq!(primary.call_count(), 2);
}

#[tokio::test]
async fn persisted_quota_survives_a_new_client() {
    let dir = TempDir::new().unwrap();
    let config = SearchConfig {
        daily_request_limit: 1,
        ..test_config(&dir)
    };

    let primary = ScriptedEngine::new("primary", one_hit);
    let client = SearchClient::new(primary.clone(), vec![], config.clone(), test_clock());
    client.search("one", 5).await.unwrap();
    assert_eq!(primary.call_count(), 1);
    drop(client);

    let primary = ScriptedEngine::new("primary", one_hit);
    let client = SearchClient::new(primary.clone(), vec![], config, test_clock());
    let gated = client.search("two", 5).await.unwrap();
    assert_eq!(gated[0].title, "Search result 1 for 'two'");
    assert_eq!(primary.call_count(), 0);
}

#[tokio::test]
async fn fallbacks_are_tried_in_order_until_one_succeeds() {
    let dir = TempDir::new().unwrap();
    let primary = ScriptedEngine::new("primary", broken);
    let first = ScriptedEngine::new("first-fallback", broken);
    let second = ScriptedEngine::new("second-fallback", one_hit);
    let client = SearchClient::new(
        primary.clone(),
        vec![first.clone(), second.clone()],
        test_config(&dir),
        test_clock(),
    );

    let results = client.search("rust", 5).await.unwrap();

    assert_eq!(results[0].title, "Rust");
    assert_eq!(primary.call_count(), 1);
    assert_eq!(first.call_count(), 1);
    assert_eq!(second.call_count(), 1);
}

#[tokio::test]
async fn all_providers_failing_raises_exhaustion() {
    let dir = TempDir::new().unwrap();
    let primary = ScriptedEngine::new("primary", broken);
    let fallback = ScriptedEngine::new("fallback", broken);
    let client = SearchClient::new(
        primary.clone(),
        vec![fallback.clone()],
        test_config(&dir),
        test_clock(),
    );

    let err = client.search("rust", 5).await.unwrap_err();

    assert!(matches!(err, HuginnError::SearchExhausted));
    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn repeated_throttling_arms_extended_backoff() {
    let dir = TempDir::new().unwrap();
    let primary = ScriptedEngine::new("primary", throttled);
    let config = SearchConfig {
        max_incidents_before_extended_backoff: 2,
        extended_backoff_time: 1800,
        ..test_config(&dir)
    };
    let client = SearchClient::new(primary.clone(), vec![], config, test_clock());

    // two throttled failures inside the incident window arm the backoff
    assert!(client.search("one", 5).await.is_err());
    assert!(client.search("two", 5).await.is_err());
    assert_eq!(primary.call_count(), 2);

    let gated = client.search("three", 5).await.unwrap();
    assert_eq!(gated[0].title, "Search result 1 for 'three'");
    assert_eq!(primary.call_count(), 2);

    // the gate opens again once the backoff period has elapsed
    tokio::time::advance(Duration::from_secs(1801)).await;
    assert!(client.search("four", 5).await.is_err());
    assert_eq!(primary.call_count(), 3);
}

#[tokio::test]
async fn ordinary_failures_do_not_arm_extended_backoff() {
    let dir = TempDir::new().unwrap();
    let primary = ScriptedEngine::new("primary", broken);
    let config = SearchConfig {
        max_incidents_before_extended_backoff: 2,
        ..test_config(&dir)
    };
    let client = SearchClient::new(primary.clone(), vec![], config, test_clock());

    for query in ["one", "two", "three", "four"] {
        assert!(client.search(query, 5).await.is_err());
    }
    assert_eq!(primary.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn back_to_back_calls_are_paced_by_the_request_delay() {
    let dir = TempDir::new().unwrap();
    let primary = ScriptedEngine::new("primary", one_hit);
    let config = SearchConfig {
        request_delay: 3.0,
        jitter: false,
        counter_file: dir.path().join("counter"),
        ..SearchConfig::default()
    };
    let client = SearchClient::new(primary.clone(), vec![], config, test_clock());

    let start = tokio::time::Instant::now();
    client.search("one", 5).await.unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);

    client.search("two", 5).await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test]
async fn last_success_age_tracks_primary_successes() {
    let dir = TempDir::new().unwrap();
    let primary = ScriptedEngine::new("primary", one_hit);
    let client = SearchClient::new(primary, vec![], test_config(&dir), test_clock());

    assert!(client.last_success_age().await.is_none());
    client.search("rust", 5).await.unwrap();
    assert!(client.last_success_age().await.is_some());
}
