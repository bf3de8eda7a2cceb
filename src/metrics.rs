use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing webhook activity.
#[derive(Default)]
pub struct SyncMetrics {
    posts_indexed: AtomicU64,
    fragments_indexed: AtomicU64,
    requests_rejected: AtomicU64,
    requests_failed: AtomicU64,
}

impl SyncMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a synced post and the number of fragments written for it.
    pub fn record_post(&self, fragment_count: u64) {
        self.posts_indexed.fetch_add(1, Ordering::Relaxed);
        self.fragments_indexed
            .fetch_add(fragment_count, Ordering::Relaxed);
    }

    /// Record a request refused by the gate.
    pub fn record_rejection(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request that failed after the gate.
    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            posts_indexed: self.posts_indexed.load(Ordering::Relaxed),
            fragments_indexed: self.fragments_indexed.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of sync counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Posts written to the index since startup.
    pub posts_indexed: u64,
    /// Fragments written across all posts.
    pub fragments_indexed: u64,
    /// Requests refused for a bad key or caller.
    pub requests_rejected: u64,
    /// Requests that ended in a 500.
    pub requests_failed: u64,
}
