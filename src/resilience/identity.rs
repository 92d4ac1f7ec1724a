//! Anti-fingerprinting identity rotation pool.
//!
//! A fixed candidate set with "recently used" tracking: each pick avoids
//! every candidate used since the last reset, and when the pool is
//! exhausted the used set collapses to its most recent few members before
//! reselecting. Guarantees eventual reuse without immediate repetition.

use rand::seq::SliceRandom;

/// Used-set members kept when the pool is exhausted.
const RECENCY_TAIL: usize = 3;

/// Returned when the candidate set is empty.
const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/93.0.4577.82 Safari/537.36";

/// Browser user agents presented to the scraping target.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/93.0.4577.82 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:90.0) Gecko/20100101 Firefox/90.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:91.0) Gecko/20100101 Firefox/91.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.159 Safari/537.36 Edg/92.0.902.78",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.131 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.2 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:90.0) Gecko/20100101 Firefox/90.0",
    "Mozilla/5.0 (Linux; Android 11; SM-G991B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.120 Mobile Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1",
];

/// Rotation pool over a fixed candidate set.
#[derive(Debug)]
pub struct IdentityPool {
    candidates: Vec<String>,
    used: Vec<String>, // insertion order, oldest first
}

impl IdentityPool {
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            used: Vec::new(),
        }
    }

    /// Pool seeded with the built-in browser user agents.
    pub fn user_agents() -> Self {
        Self::new(USER_AGENTS.iter().map(|ua| ua.to_string()).collect())
    }

    /// Pick an unused candidate at random, marking it used.
    ///
    /// When every candidate has been used, the used set is reset to its
    /// most recent [`RECENCY_TAIL`] members first.
    pub fn next(&mut self) -> String {
        if self.candidates.is_empty() {
            return FALLBACK_USER_AGENT.to_string();
        }

        if self.available().is_empty() {
            let keep = self.used.len().saturating_sub(RECENCY_TAIL);
            self.used.drain(..keep);
        }

        let mut available = self.available();
        if available.is_empty() {
            // pool no larger than the recency tail
            available = self.candidates.clone();
        }

        let selected = available
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| FALLBACK_USER_AGENT.to_string());
        self.used.push(selected.clone());
        selected
    }

    fn available(&self) -> Vec<String> {
        self.candidates
            .iter()
            .filter(|c| !self.used.contains(c))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pool_of(n: usize) -> IdentityPool {
        IdentityPool::new((0..n).map(|i| format!("agent-{i}")).collect())
    }

    #[test]
    fn visits_every_candidate_before_reuse() {
        let mut pool = pool_of(6);
        let picks: HashSet<String> = (0..6).map(|_| pool.next()).collect();
        assert_eq!(picks.len(), 6);
    }

    #[test]
    fn exhaustion_resets_but_avoids_the_recent_tail() {
        let mut pool = pool_of(6);
        let mut order = Vec::new();
        for _ in 0..6 {
            order.push(pool.next());
        }
        let tail: Vec<&String> = order.iter().rev().take(RECENCY_TAIL).collect();

        // next pick after exhaustion must not be one of the last three used
        let next = pool.next();
        assert!(!tail.contains(&&next));
    }

    #[test]
    fn tiny_pool_still_produces_an_identity() {
        let mut pool = pool_of(2);
        for _ in 0..10 {
            assert!(pool.next().starts_with("agent-"));
        }
    }

    #[test]
    fn empty_pool_falls_back_to_default_agent() {
        let mut pool = IdentityPool::new(Vec::new());
        assert_eq!(pool.next(), FALLBACK_USER_AGENT);
    }

    #[test]
    fn builtin_pool_has_the_full_agent_set() {
        assert_eq!(USER_AGENTS.len(), 14);
    }
}
