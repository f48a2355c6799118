//! Counters and gauges for the sequence generator.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::histogram::{Histogram, ATTEMPT_BUCKETS, LATENCY_BUCKETS_US};

/// Metrics shared by every generator built on the same store.
pub struct SequenceMetrics {
    /// Successful `next_value` calls
    pub next_value_total: AtomicU64,
    /// Failed `next_value` calls (exhaustion, invalid input, fatal store errors)
    pub next_value_errors_total: AtomicU64,
    /// Inserts rejected by the unique index
    pub conflicts_total: AtomicU64,
    /// Store failures other than conflicts, retried or not
    pub store_errors_total: AtomicU64,
    /// Calls that ran out of attempts
    pub exhausted_total: AtomicU64,
    /// Superseded records whose delete failed
    pub cleanup_failures_total: AtomicU64,
    /// Records removed by sweeps
    pub swept_records_total: AtomicU64,
    /// Known orphaned records per namespace
    orphans: DashMap<String, u64>,
    /// Attempts needed per successful call
    pub attempts: Histogram,
    /// Wall time of successful calls in microseconds
    pub next_value_duration_us: Histogram,
}

impl Default for SequenceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceMetrics {
    pub fn new() -> Self {
        Self {
            next_value_total: AtomicU64::new(0),
            next_value_errors_total: AtomicU64::new(0),
            conflicts_total: AtomicU64::new(0),
            store_errors_total: AtomicU64::new(0),
            exhausted_total: AtomicU64::new(0),
            cleanup_failures_total: AtomicU64::new(0),
            swept_records_total: AtomicU64::new(0),
            orphans: DashMap::new(),
            attempts: Histogram::with_buckets(ATTEMPT_BUCKETS),
            next_value_duration_us: Histogram::with_buckets(LATENCY_BUCKETS_US),
        }
    }

    #[inline]
    pub fn record_success(&self, attempts: u32, duration_us: u64) {
        self.next_value_total.fetch_add(1, Ordering::Relaxed);
        self.attempts.observe(u64::from(attempts));
        self.next_value_duration_us.observe(duration_us);
    }

    #[inline]
    pub fn record_failure(&self) {
        self.next_value_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_conflict(&self) {
        self.conflicts_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_store_error(&self) {
        self.store_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_exhausted(&self) {
        self.exhausted_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed cleanup delete, leaving one more orphan behind.
    pub fn record_cleanup_failure(&self, namespace: &str) {
        self.cleanup_failures_total.fetch_add(1, Ordering::Relaxed);
        *self.orphans.entry(namespace.to_string()).or_insert(0) += 1;
    }

    /// Records a sweep of `removed` records that left `remaining` orphans.
    pub fn record_sweep(&self, namespace: &str, removed: u64, remaining: u64) {
        self.swept_records_total.fetch_add(removed, Ordering::Relaxed);
        if remaining == 0 {
            self.orphans.remove(namespace);
        } else {
            self.orphans.insert(namespace.to_string(), remaining);
        }
    }

    /// Orphans known for `namespace` from failed cleanups since the last sweep.
    pub fn orphans(&self, namespace: &str) -> u64 {
        self.orphans.get(namespace).map(|v| *v).unwrap_or(0)
    }

    /// Formats all metrics in Prometheus exposition format.
    pub fn format_prometheus(&self) -> String {
        let mut output = String::with_capacity(4096);

        let counters = [
            (
                "autoinc_next_value_total",
                "Sequence values handed out",
                &self.next_value_total,
            ),
            (
                "autoinc_next_value_errors_total",
                "next_value calls that failed",
                &self.next_value_errors_total,
            ),
            (
                "autoinc_conflicts_total",
                "Inserts rejected by the unique index",
                &self.conflicts_total,
            ),
            (
                "autoinc_store_errors_total",
                "Store errors other than conflicts",
                &self.store_errors_total,
            ),
            (
                "autoinc_exhausted_total",
                "Calls that exhausted their attempt budget",
                &self.exhausted_total,
            ),
            (
                "autoinc_cleanup_failures_total",
                "Superseded records left behind by failed deletes",
                &self.cleanup_failures_total,
            ),
            (
                "autoinc_swept_records_total",
                "Superseded records removed by sweeps",
                &self.swept_records_total,
            ),
        ];
        for (name, help, value) in counters {
            let _ = writeln!(output, "# HELP {} {}", name, help);
            let _ = writeln!(output, "# TYPE {} counter", name);
            let _ = writeln!(output, "{} {}", name, value.load(Ordering::Relaxed));
            output.push('\n');
        }

        let _ = writeln!(
            output,
            "# HELP autoinc_orphaned_records Superseded records still stored per namespace"
        );
        let _ = writeln!(output, "# TYPE autoinc_orphaned_records gauge");
        // Sorted for deterministic output
        let mut orphans: Vec<(String, u64)> = self
            .orphans
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        orphans.sort();
        for (namespace, count) in &orphans {
            let _ = writeln!(
                output,
                "autoinc_orphaned_records{{namespace=\"{}\"}} {}",
                namespace, count
            );
        }
        output.push('\n');

        output.push_str(
            &self
                .attempts
                .format_prometheus("autoinc_attempts", "Attempts per successful call"),
        );
        output.push('\n');
        output.push_str(&self.next_value_duration_us.format_prometheus(
            "autoinc_next_value_duration_us",
            "next_value latency in microseconds",
        ));

        output
    }
}
