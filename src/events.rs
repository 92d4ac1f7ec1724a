//! Best-effort usage event emission.
//!
//! After every accounted event the clients publish the project's running
//! token total to an external subscriber (typically a UI). Delivery is
//! fire-and-forget over an unbounded channel: a closed or absent receiver
//! never affects the calling operation's outcome.

use serde::Serialize;
use tokio::sync::mpsc;

/// A running-total snapshot published after an accounted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageEvent {
    pub project: String,
    pub total_tokens: u64,
}

/// Handle for emitting [`UsageEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct EventChannel {
    tx: Option<mpsc::UnboundedSender<UsageEvent>>,
}

impl EventChannel {
    /// Create a channel pair; the receiver side belongs to the subscriber.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UsageEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Channel with no subscriber; every emit is a no-op.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Emit an event. Never blocks, never fails.
    pub fn emit(&self, event: UsageEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event); // receiver dropped: ignore
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_to_subscriber() {
        let (channel, mut rx) = EventChannel::new();
        channel.emit(UsageEvent {
            project: "alpha".into(),
            total_tokens: 42,
        });
        assert_eq!(rx.try_recv().unwrap().total_tokens, 42);
    }

    #[test]
    fn dropped_receiver_does_not_fail_emit() {
        let (channel, rx) = EventChannel::new();
        drop(rx);
        channel.emit(UsageEvent {
            project: "alpha".into(),
            total_tokens: 1,
        });
    }

    #[test]
    fn disabled_channel_is_a_no_op() {
        EventChannel::disabled().emit(UsageEvent {
            project: "alpha".into(),
            total_tokens: 1,
        });
    }
}
