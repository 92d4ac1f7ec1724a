//! Shared resilience primitives.
//!
//! Small, state-only building blocks used by the search client: a
//! sliding-window incident tracker, a user-agent identity pool, and a
//! persisted daily call counter. None of them perform I/O on the hot path
//! beyond the counter's single-file rewrite.

pub mod identity;
pub mod incidents;
pub mod quota;

pub use identity::IdentityPool;
pub use incidents::IncidentTracker;
pub use quota::DailyQuota;
