//! Relay counters
//!
//! Lock-free counters shared by every request handler and exposed as a JSON
//! snapshot on the `/metrics` endpoint.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

#[derive(Debug, Default)]
struct MethodCounters {
    submitted: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone)]
pub struct RelayMetrics {
    started_at: Instant,
    ledger_reads: Arc<AtomicU64>,
    methods: Arc<DashMap<&'static str, MethodCounters>>,
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            ledger_reads: Arc::new(AtomicU64::new(0)),
            methods: Arc::new(DashMap::new()),
        }
    }

    pub fn record_read(&self, records: u64) {
        self.ledger_reads.fetch_add(records, Ordering::Relaxed);
    }

    pub fn record_submitted(&self, method: &'static str) {
        trace!(method, "transaction submitted");
        self.methods
            .entry(method)
            .or_default()
            .submitted
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self, method: &'static str) {
        trace!(method, "transaction failed");
        self.methods
            .entry(method)
            .or_default()
            .failed
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut methods = BTreeMap::new();
        let mut submitted = 0;
        let mut failed = 0;

        for entry in self.methods.iter() {
            let counts = MethodSnapshot {
                submitted: entry.submitted.load(Ordering::Relaxed),
                failed: entry.failed.load(Ordering::Relaxed),
            };
            submitted += counts.submitted;
            failed += counts.failed;
            methods.insert(entry.key().to_string(), counts);
        }

        MetricsSnapshot {
            uptime_seconds: self.started_at.elapsed().as_secs(),
            ledger_reads: self.ledger_reads.load(Ordering::Relaxed),
            transactions_submitted: submitted,
            transactions_failed: failed,
            methods,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSnapshot {
    pub submitted: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: u64,
    pub ledger_reads: u64,
    pub transactions_submitted: u64,
    pub transactions_failed: u64,
    pub methods: BTreeMap<String, MethodSnapshot>,
}
