//! Process-wide request counters and latency window
//!
//! One `Metrics` value is constructed at startup and shared behind an `Arc`;
//! it is never ambient global state. Counters are lock-free atomics; the
//! latency window is a small mutex-guarded ring that writers touch only long
//! enough to push one sample, so snapshots never block writers for long. A
//! snapshot is consistent with itself but makes no cross-counter atomicity
//! promise.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::Serialize;

/// Default number of latency samples retained
const DEFAULT_LATENCY_WINDOW: usize = 1024;

/// Shared counters plus a bounded latency sample store
#[derive(Debug)]
pub struct Metrics {
    received: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
    window: usize,
    latencies_ms: Mutex<VecDeque<u64>>,
}

/// Point-in-time view of the metrics, shaped for the /metrics endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub retried: u64,
    pub avg_latency_ms: f64,
    pub p95_latency_ms: f64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::with_window(DEFAULT_LATENCY_WINDOW)
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build with a custom latency window capacity
    pub fn with_window(window: usize) -> Self {
        Self {
            received: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            retried: AtomicU64::new(0),
            window: window.max(1),
            latencies_ms: Mutex::new(VecDeque::with_capacity(window.max(1))),
        }
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retried(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one latency sample, evicting the oldest when over capacity
    pub fn observe_latency(&self, ms: u64) {
        let mut latencies = self.latencies_ms.lock().unwrap_or_else(|e| e.into_inner());
        latencies.push_back(ms);
        while latencies.len() > self.window {
            latencies.pop_front();
        }
    }

    /// Mean and 95th percentile (nearest-rank) of the retained samples
    ///
    /// Returns `(0.0, 0.0)` when no samples have been recorded yet.
    pub fn latency_stats(&self) -> (f64, f64) {
        let samples: Vec<u64> = {
            let latencies = self.latencies_ms.lock().unwrap_or_else(|e| e.into_inner());
            latencies.iter().copied().collect()
        };
        if samples.is_empty() {
            return (0.0, 0.0);
        }
        let avg = samples.iter().sum::<u64>() as f64 / samples.len() as f64;
        let mut sorted = samples;
        sorted.sort_unstable();
        let rank = (sorted.len() as f64 * 0.95).ceil() as usize;
        let idx = rank.saturating_sub(1).min(sorted.len() - 1);
        (avg, sorted[idx] as f64)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let (avg_latency_ms, p95_latency_ms) = self.latency_stats();
        MetricsSnapshot {
            total: self.received.load(Ordering::Relaxed),
            success: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            avg_latency_ms,
            p95_latency_ms,
        }
    }
}
