//! Usage accounting for a research session.

use deep_research_core::ResearchSessionId;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Receives the usage of successful model calls.
///
/// Implementations must tolerate concurrent calls.
pub trait UsageAccumulator: Send + Sync {
    /// Records one completed step that consumed `total_tokens`.
    fn record_success(&self, total_tokens: u64);
}

/// A point-in-time copy of the usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Total tokens consumed so far.
    pub tokens_used: u64,
    /// Number of model calls that completed.
    pub completed_steps: u64,
}

/// Usage state for one research session.
///
/// Share it by reference or `Arc` across concurrent model calls; the
/// counters are atomic.
#[derive(Debug)]
pub struct ResearchState {
    session_id: ResearchSessionId,
    topic: String,
    tokens_used: AtomicU64,
    completed_steps: AtomicU64,
}

impl ResearchState {
    /// Creates state for a new session.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            session_id: ResearchSessionId::new(),
            topic: topic.into(),
            tokens_used: AtomicU64::new(0),
            completed_steps: AtomicU64::new(0),
        }
    }

    /// Returns the session ID.
    #[must_use]
    pub fn session_id(&self) -> ResearchSessionId {
        self.session_id
    }

    /// Returns the research topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the total tokens consumed.
    #[must_use]
    pub fn tokens_used(&self) -> u64 {
        self.tokens_used.load(Ordering::Relaxed)
    }

    /// Returns the number of completed steps.
    #[must_use]
    pub fn completed_steps(&self) -> u64 {
        self.completed_steps.load(Ordering::Relaxed)
    }

    /// Returns both counters.
    #[must_use]
    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            tokens_used: self.tokens_used(),
            completed_steps: self.completed_steps(),
        }
    }
}

impl UsageAccumulator for ResearchState {
    fn record_success(&self, total_tokens: u64) {
        // The closure always returns Some, so the update cannot fail.
        let _ = self
            .tokens_used
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                Some(used.saturating_add(total_tokens))
            });
        self.completed_steps.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn new_state_starts_at_zero() {
        let state = ResearchState::new("solid-state batteries");
        assert_eq!(state.topic(), "solid-state batteries");
        assert_eq!(state.snapshot(), UsageSnapshot::default());
        assert!(state.session_id().to_string().starts_with("rs_"));
    }

    #[test]
    fn record_success_adds_tokens_and_one_step() {
        let state = ResearchState::new("topic");
        state.record_success(120);
        state.record_success(0);

        assert_eq!(state.tokens_used(), 120);
        assert_eq!(state.completed_steps(), 2);
    }

    #[test]
    fn token_counter_saturates() {
        let state = ResearchState::new("topic");
        state.record_success(u64::MAX - 1);
        state.record_success(10);

        assert_eq!(state.tokens_used(), u64::MAX);
        assert_eq!(state.completed_steps(), 2);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let state = Arc::new(ResearchState::new("topic"));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        state.record_success(3);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread panicked");
        }

        assert_eq!(
            state.snapshot(),
            UsageSnapshot {
                tokens_used: 24_000,
                completed_steps: 8_000,
            }
        );
    }
}
