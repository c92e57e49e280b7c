//! Dispatch counters for the metrics endpoint.
//!
//! Failed dispatches are otherwise only visible in logs; the counters make
//! them visible to operators through `GET /system/metrics`.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters maintained by the dispatch engine and the movement
/// orchestrator. Cheap to share; all updates are relaxed atomics.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    completed_trips: AtomicU64,
    failed_dispatches: AtomicU64,
    capacity_rejections: AtomicU64,
}

/// Point-in-time snapshot of [`DispatchMetrics`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DispatchCounters {
    /// Trips that ran to completion (including immediate arrivals).
    pub completed_trips: u64,
    /// Dispatches that found no available lift or failed outright.
    pub failed_dispatches: u64,
    /// Calls rejected because the floor was at its assignment cap.
    pub capacity_rejections: u64,
}

impl DispatchMetrics {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A trip ran to completion.
    pub fn record_completed_trip(&self) {
        self.completed_trips.fetch_add(1, Ordering::Relaxed);
    }

    /// A dispatch failed: no available lift, or a handler error.
    pub fn record_failed_dispatch(&self) {
        self.failed_dispatches.fetch_add(1, Ordering::Relaxed);
    }

    /// A call was rejected at the capacity cap.
    pub fn record_capacity_rejection(&self) {
        self.capacity_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters.
    #[must_use]
    pub fn snapshot(&self) -> DispatchCounters {
        DispatchCounters {
            completed_trips: self.completed_trips.load(Ordering::Relaxed),
            failed_dispatches: self.failed_dispatches.load(Ordering::Relaxed),
            capacity_rejections: self.capacity_rejections.load(Ordering::Relaxed),
        }
    }
}
