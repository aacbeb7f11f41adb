//! # Metrics Collection Module
//!
//! Lock-free metrics for the inference server. All counters use atomic
//! operations so the request path never blocks on observability.
//!
//! ## Metric Categories
//!
//! - **Request Metrics**: totals, in-flight count, error count
//! - **Prediction Metrics**: per-class prediction counts
//! - **System Metrics**: process uptime

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use crate::artifacts::CLASS_COUNT;

/// Thread-safe metrics collector for the inference server
///
/// Counter updates are single atomic increments; snapshot collection reads
/// every counter with relaxed ordering, which is sufficient for monitoring
/// output.
#[derive(Debug)]
pub struct MetricsCollector {
    /// Total number of prediction requests received
    total_requests: AtomicU64,

    /// Number of requests currently being processed
    active_requests: AtomicUsize,

    /// Number of requests that resulted in an error response
    total_errors: AtomicU64,

    /// Predictions returned, indexed by class label
    predictions: [AtomicU64; CLASS_COUNT],

    /// Process start time for uptime reporting
    start_time: Instant,
}

impl MetricsCollector {
    /// Creates a new collector with all counters at zero
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            active_requests: AtomicUsize::new(0),
            total_errors: AtomicU64::new(0),
            predictions: Default::default(),
            start_time: Instant::now(),
        }
    }

    /// Records an incoming prediction request
    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.active_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Records completion of a prediction request
    ///
    /// `class` is the predicted label on success, `None` on error.
    pub fn record_completion(&self, class: Option<usize>) {
        self.active_requests.fetch_sub(1, Ordering::Relaxed);
        match class {
            Some(class) if class < CLASS_COUNT => {
                self.predictions[class].fetch_add(1, Ordering::Relaxed);
            }
            Some(_) => {}
            None => {
                self.total_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Takes a consistent-enough snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut predictions = [0_u64; CLASS_COUNT];
        for (i, counter) in self.predictions.iter().enumerate() {
            predictions[i] = counter.load(Ordering::Relaxed);
        }
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            active_requests: self.active_requests.load(Ordering::Relaxed),
            total_errors: self.total_errors.load(Ordering::Relaxed),
            predictions,
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the collector, serialized at `GET /metrics`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricsSnapshot {
    /// Total prediction requests received
    pub total_requests: u64,
    /// Requests currently in flight
    pub active_requests: usize,
    /// Requests that returned an error response
    pub total_errors: u64,
    /// Successful predictions per class label
    pub predictions: [u64; CLASS_COUNT],
    /// Seconds since the collector was created
    pub uptime_seconds: u64,
}
