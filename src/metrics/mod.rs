//! Observability metrics for the sequence generator.
//!
//! Lock-free atomics for counters, a concurrent map for per-namespace
//! gauges, and Prometheus text output.

pub mod histogram;
pub mod registry;

pub use histogram::{Histogram, ATTEMPT_BUCKETS, LATENCY_BUCKETS_US};
pub use registry::SequenceMetrics;
