//! Thread-safe fixed-bucket histogram.
//!
//! Bucket counts are cumulative so the output works with Prometheus
//! `histogram_quantile()`.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Latency buckets in microseconds.
/// Fsynced inserts land in the 0.1ms to 50ms range on most disks.
pub const LATENCY_BUCKETS_US: &[u64] = &[
    100,       // 100μs
    250,       // 250μs
    500,       // 500μs
    1_000,     // 1ms
    2_500,     // 2.5ms
    5_000,     // 5ms
    10_000,    // 10ms
    25_000,    // 25ms
    50_000,    // 50ms
    100_000,   // 100ms
    500_000,   // 500ms
    1_000_000, // 1s
];

/// Buckets for attempts needed per call.
pub const ATTEMPT_BUCKETS: &[u64] = &[1, 2, 3, 5, 10, 25, 50, 100];

/// Thread-safe histogram over a fixed set of upper bounds.
///
/// # Example
///
/// ```
/// use autoinc::metrics::{Histogram, ATTEMPT_BUCKETS};
///
/// let histogram = Histogram::with_buckets(ATTEMPT_BUCKETS);
/// histogram.observe(2);
///
/// let (sum, count, buckets) = histogram.snapshot();
/// assert_eq!(count, 1);
/// assert_eq!(sum, 2);
/// assert_eq!(buckets[0], 0);
/// assert_eq!(buckets[1], 1);
/// ```
pub struct Histogram {
    bounds: &'static [u64],
    sum: AtomicU64,
    count: AtomicU64,
    /// Cumulative: each bucket includes smaller values
    buckets: Vec<AtomicU64>,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::with_buckets(LATENCY_BUCKETS_US)
    }
}

impl Histogram {
    /// Creates an empty histogram with the given ascending upper bounds.
    pub fn with_buckets(bounds: &'static [u64]) -> Self {
        Self {
            bounds,
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
            buckets: bounds.iter().map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Records an observation. Lock-free.
    #[inline]
    pub fn observe(&self, value: u64) {
        self.sum.fetch_add(value, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (bucket, &bound) in self.buckets.iter().zip(self.bounds) {
            if value <= bound {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Returns `(sum, count, cumulative_bucket_counts)`.
    pub fn snapshot(&self) -> (u64, u64, Vec<u64>) {
        let buckets = self
            .buckets
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect();
        (
            self.sum.load(Ordering::Relaxed),
            self.count.load(Ordering::Relaxed),
            buckets,
        )
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    /// Formats the histogram in Prometheus exposition format.
    pub fn format_prometheus(&self, name: &str, help: &str) -> String {
        let (sum, count, buckets) = self.snapshot();
        let mut output = String::with_capacity(512);

        let _ = writeln!(output, "# HELP {} {}", name, help);
        let _ = writeln!(output, "# TYPE {} histogram", name);
        for (bound, value) in self.bounds.iter().zip(&buckets) {
            let _ = writeln!(output, "{}_bucket{{le=\"{}\"}} {}", name, bound, value);
        }
        let _ = writeln!(output, "{}_bucket{{le=\"+Inf\"}} {}", name, count);
        let _ = writeln!(output, "{}_sum {}", name, sum);
        let _ = writeln!(output, "{}_count {}", name, count);

        output
    }
}
