//! Optimistic insert-conflict sequence generator.
//!
//! Every caller reads the highest record of a namespace, proposes
//! `value + 1` by inserting a new record, and lets the store's unique index
//! on `(namespace, value)` pick the winner. Losers re-read and try again,
//! up to `max_attempts` times. The winner then deletes the record it
//! superseded; if that delete fails the orphan is harmless because reads
//! always take the maximum.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use backon::{BackoffBuilder, ExponentialBuilder};
use rayon::prelude::*;

use crate::contracts::{
    Durability, NewRecord, RecordId, RecordStore, SequenceError, SequenceGenerator, StoreError,
};
use crate::metrics::SequenceMetrics;
use crate::storage::validate_namespace;

/// Attempts per call before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Log a contention warning every this many failed attempts.
const CONTENTION_WARN_EVERY: u32 = 10;

/// Optional sleep between failed attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay after the first failed attempt in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper limit for any single delay in milliseconds.
    pub max_delay_ms: u64,
}

impl BackoffConfig {
    /// Creates a jittered exponential schedule with at most `max_times` delays.
    pub fn backoff(&self, max_times: usize) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms.max(self.initial_delay_ms)))
            .with_max_times(max_times)
            .with_jitter()
    }
}

/// Configuration for [`Incrementor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementorConfig {
    /// Attempts per call before `ExhaustedRetries`.
    pub max_attempts: u32,
    /// Durability of the proposing insert.
    pub insert_durability: Durability,
    /// Sleep between failed attempts; `None` retries immediately.
    pub backoff: Option<BackoffConfig>,
}

impl Default for IncrementorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            insert_durability: Durability::Fsync,
            backoff: None,
        }
    }
}

impl IncrementorConfig {
    /// Creates an IncrementorConfig from environment variables.
    ///
    /// Environment variables:
    /// - `AUTOINC_MAX_ATTEMPTS`: Attempts per call (default: 100)
    /// - `AUTOINC_INSERT_FSYNC`: `false` or `0` to skip fsync on insert (default: true)
    /// - `AUTOINC_BACKOFF_INITIAL_MS`: Enables backoff with this first delay
    /// - `AUTOINC_BACKOFF_MAX_MS`: Largest backoff delay (default: 100)
    pub fn from_env() -> Self {
        let default = Self::default();

        let max_attempts = std::env::var("AUTOINC_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(default.max_attempts);

        let insert_durability = match std::env::var("AUTOINC_INSERT_FSYNC") {
            Ok(v) if v == "0" || v.eq_ignore_ascii_case("false") => Durability::Default,
            _ => default.insert_durability,
        };

        let backoff = std::env::var("AUTOINC_BACKOFF_INITIAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(|initial_delay_ms| BackoffConfig {
                initial_delay_ms,
                max_delay_ms: std::env::var("AUTOINC_BACKOFF_MAX_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(100),
            });

        Self {
            max_attempts,
            insert_durability,
            backoff,
        }
    }
}

/// Outcome of one read-propose round.
enum Attempt {
    Committed {
        value: u64,
        superseded: Option<RecordId>,
    },
    Conflicted(StoreError),
}

/// Sequence generator over any [`RecordStore`].
///
/// Holds no lock across store round-trips. Share it behind an `Arc`.
pub struct Incrementor<S: RecordStore> {
    store: Arc<S>,
    config: IncrementorConfig,
    metrics: Arc<SequenceMetrics>,
    /// Set once the store confirmed the unique index
    index_ready: AtomicBool,
}

impl<S: RecordStore> Incrementor<S> {
    /// Creates a generator with the default configuration.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, IncrementorConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: IncrementorConfig) -> Self {
        Self::with_metrics(store, config, Arc::new(SequenceMetrics::new()))
    }

    /// Creates a generator reporting into shared metrics.
    pub fn with_metrics(
        store: Arc<S>,
        config: IncrementorConfig,
        metrics: Arc<SequenceMetrics>,
    ) -> Self {
        Self {
            store,
            config,
            metrics,
            index_ready: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &IncrementorConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<SequenceMetrics> {
        &self.metrics
    }

    /// Number of superseded records still stored for `namespace`.
    pub fn orphan_count(&self, namespace: &str) -> Result<usize, SequenceError> {
        validate_namespace(namespace)?;
        Ok(self.store.records(namespace)?.len().saturating_sub(1))
    }

    /// Deletes every record of `namespace` except the current one.
    ///
    /// Returns how many records were removed. Failed deletes are logged and
    /// left for the next sweep.
    pub fn sweep_superseded(&self, namespace: &str) -> Result<usize, SequenceError> {
        validate_namespace(namespace)?;

        let records = self.store.records(namespace)?;
        let Some(max) = records.iter().map(|r| r.value).max() else {
            self.metrics.record_sweep(namespace, 0, 0);
            return Ok(0);
        };

        let mut removed = 0usize;
        let mut remaining = 0u64;
        for record in records.iter().filter(|r| r.value < max) {
            match self.store.delete(record.record_id, Durability::Default) {
                Ok(true) => removed += 1,
                // A concurrent cleanup got there first
                Ok(false) => {}
                Err(e) => {
                    remaining += 1;
                    tracing::warn!(
                        namespace,
                        record_id = %record.record_id,
                        value = record.value,
                        error = %e,
                        "Failed to sweep superseded record"
                    );
                }
            }
        }

        self.metrics
            .record_sweep(namespace, removed as u64, remaining);
        if removed > 0 {
            tracing::info!(namespace, removed, remaining, "Swept superseded records");
        }
        Ok(removed)
    }

    /// Sweeps every namespace in the store, namespaces in parallel.
    pub fn sweep_all(&self) -> Result<usize, SequenceError> {
        let namespaces = self.store.namespaces()?;
        let removed: Vec<usize> = namespaces
            .par_iter()
            .map(|namespace| self.sweep_superseded(namespace))
            .collect::<Result<_, _>>()?;
        Ok(removed.into_iter().sum())
    }

    /// Lists namespaces with at least one record.
    pub fn namespaces(&self) -> Result<Vec<String>, SequenceError> {
        Ok(self.store.namespaces()?)
    }

    fn ensure_unique_index(&self) -> Result<(), StoreError> {
        if self.index_ready.load(Ordering::Acquire) {
            return Ok(());
        }
        self.store.ensure_unique_index()?;
        self.index_ready.store(true, Ordering::Release);
        Ok(())
    }

    /// Read-step failures: transient ones cost an attempt, the rest are fatal.
    fn retry_or_fail(&self, err: StoreError) -> Result<Attempt, SequenceError> {
        if err.is_retryable() {
            Ok(Attempt::Conflicted(err))
        } else {
            self.metrics.record_store_error();
            Err(SequenceError::Store(err))
        }
    }

    /// One round: read the current maximum, then propose its successor.
    fn attempt(&self, namespace: &str, initial_value: u64) -> Result<Attempt, SequenceError> {
        if let Err(e) = self.ensure_unique_index() {
            return self.retry_or_fail(e);
        }

        let current = match self.store.find_max(namespace) {
            Ok(current) => current,
            Err(e) => return self.retry_or_fail(e),
        };
        let (value, superseded) = match current {
            Some(record) => (record.value, Some(record.record_id)),
            None => (initial_value, None),
        };
        let value = value.checked_add(1).ok_or_else(|| SequenceError::Overflow {
            namespace: namespace.to_string(),
        })?;

        let proposal = NewRecord {
            namespace: namespace.to_string(),
            value,
        };
        match self.store.insert(&proposal, self.config.insert_durability) {
            Ok(_) => Ok(Attempt::Committed { value, superseded }),
            // Any insert failure means re-read and try again
            Err(e) => Ok(Attempt::Conflicted(e)),
        }
    }

    /// Best-effort delete of the record a successful insert superseded.
    fn remove_superseded(&self, namespace: &str, record_id: RecordId) {
        match self.store.delete(record_id, Durability::Default) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(namespace, record_id = %record_id, "Superseded record already gone")
            }
            Err(e) => {
                self.metrics.record_cleanup_failure(namespace);
                tracing::warn!(
                    namespace,
                    record_id = %record_id,
                    error = %e,
                    "Failed to delete superseded record, leaving orphan"
                );
            }
        }
    }

    fn try_next_value(&self, namespace: &str, initial_value: u64) -> Result<u64, SequenceError> {
        validate_namespace(namespace)?;

        let started = Instant::now();
        let max_attempts = self.config.max_attempts.max(1);
        let mut delays = self
            .config
            .backoff
            .as_ref()
            .map(|b| b.backoff(max_attempts as usize).build());

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let failure = match self.attempt(namespace, initial_value)? {
                Attempt::Committed { value, superseded } => {
                    if let Some(record_id) = superseded {
                        self.remove_superseded(namespace, record_id);
                    }
                    self.metrics
                        .record_success(attempt, started.elapsed().as_micros() as u64);
                    return Ok(value);
                }
                Attempt::Conflicted(failure) => failure,
            };

            if failure.is_conflict() {
                self.metrics.record_conflict();
            } else {
                self.metrics.record_store_error();
            }
            tracing::debug!(namespace, attempt, error = %failure, "Attempt failed, retrying");

            if attempt >= max_attempts {
                self.metrics.record_exhausted();
                tracing::error!(
                    namespace,
                    attempts = attempt,
                    error = %failure,
                    "Exhausted attempts for next value"
                );
                return Err(SequenceError::ExhaustedRetries {
                    namespace: namespace.to_string(),
                    attempts: attempt,
                    source: failure,
                });
            }

            if attempt % CONTENTION_WARN_EVERY == 0 {
                tracing::warn!(
                    namespace,
                    attempt,
                    max_attempts,
                    "Sustained contention on sequence"
                );
            }

            if let Some(delay) = delays.as_mut().and_then(|d| d.next()) {
                std::thread::sleep(delay);
            }
        }
    }
}

impl<S: RecordStore> SequenceGenerator for Incrementor<S> {
    fn next_value(&self, namespace: &str, initial_value: u64) -> Result<u64, SequenceError> {
        let result = self.try_next_value(namespace, initial_value);
        if result.is_err() {
            self.metrics.record_failure();
        }
        result
    }

    fn current_value(&self, namespace: &str) -> Result<Option<u64>, SequenceError> {
        validate_namespace(namespace)?;
        Ok(self.store.find_max(namespace)?.map(|record| record.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;

    use crate::contracts::SequenceRecord;
    use crate::storage::MemoryRecordStore;

    /// Wraps a store and injects failures.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryRecordStore,
        /// Inserts still to reject before letting one through
        failing_inserts: AtomicU32,
        /// Error returned for rejected inserts
        insert_error: Mutex<Option<StoreError>>,
        failing_deletes: AtomicBool,
        failing_reads: Mutex<Option<StoreError>>,
        insert_calls: AtomicU32,
        writes: Mutex<Vec<(&'static str, Durability)>>,
    }

    impl FlakyStore {
        fn fail_inserts(&self, count: u32, error: StoreError) {
            self.failing_inserts.store(count, Ordering::SeqCst);
            *self.insert_error.lock().unwrap() = Some(error);
        }

        fn insert_calls(&self) -> u32 {
            self.insert_calls.load(Ordering::SeqCst)
        }
    }

    impl RecordStore for FlakyStore {
        fn ensure_unique_index(&self) -> Result<(), StoreError> {
            self.inner.ensure_unique_index()
        }

        fn find_max(&self, namespace: &str) -> Result<Option<SequenceRecord>, StoreError> {
            if let Some(err) = self.failing_reads.lock().unwrap().clone() {
                return Err(err);
            }
            self.inner.find_max(namespace)
        }

        fn insert(
            &self,
            record: &NewRecord,
            durability: Durability,
        ) -> Result<RecordId, StoreError> {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            self.writes.lock().unwrap().push(("insert", durability));
            let rejected = self
                .failing_inserts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if rejected {
                return Err(self.insert_error.lock().unwrap().clone().unwrap());
            }
            self.inner.insert(record, durability)
        }

        fn delete(&self, record_id: RecordId, durability: Durability) -> Result<bool, StoreError> {
            self.writes.lock().unwrap().push(("delete", durability));
            if self.failing_deletes.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("delete refused".into()));
            }
            self.inner.delete(record_id, durability)
        }

        fn records(&self, namespace: &str) -> Result<Vec<SequenceRecord>, StoreError> {
            self.inner.records(namespace)
        }

        fn namespaces(&self) -> Result<Vec<String>, StoreError> {
            self.inner.namespaces()
        }
    }

    fn conflict(namespace: &str, value: u64) -> StoreError {
        StoreError::ConstraintConflict {
            namespace: namespace.into(),
            value,
        }
    }

    fn incrementor_at(namespace: &str, value: u64) -> (Incrementor<FlakyStore>, Arc<FlakyStore>) {
        let store = Arc::new(FlakyStore::default());
        let gen = Incrementor::new(Arc::clone(&store));
        if value > 0 {
            assert_eq!(gen.next_value(namespace, value - 1).unwrap(), value);
        }
        (gen, store)
    }

    #[test]
    fn first_call_starts_after_initial_value() {
        let gen = Incrementor::new(Arc::new(MemoryRecordStore::new()));
        assert_eq!(gen.next_value("ANSWERS", 0).unwrap(), 1);
        assert_eq!(gen.next_value("ANSWERS", 0).unwrap(), 2);
    }

    #[test]
    fn seed_only_used_for_fresh_namespace() {
        let gen = Incrementor::new(Arc::new(MemoryRecordStore::new()));
        assert_eq!(gen.next_value("fresh", 500).unwrap(), 501);
        assert_eq!(gen.next_value("fresh", 0).unwrap(), 502);
        assert_eq!(gen.next_value("fresh", 9_000).unwrap(), 503);
    }

    #[test]
    fn single_conflict_is_retried() {
        let (gen, store) = incrementor_at("ANSWERS", 7);
        store.fail_inserts(1, conflict("ANSWERS", 8));

        assert_eq!(gen.next_value("ANSWERS", 0).unwrap(), 8);
        assert_eq!(gen.metrics().conflicts_total.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn unavailable_store_is_retried_like_a_conflict() {
        let (gen, store) = incrementor_at("ANSWERS", 3);
        store.fail_inserts(5, StoreError::Unavailable("connection reset".into()));

        assert_eq!(gen.next_value("ANSWERS", 0).unwrap(), 4);
        assert_eq!(gen.metrics().store_errors_total.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn exhausts_after_max_attempts() {
        let (gen, store) = incrementor_at("ANSWERS", 7);
        let before = store.insert_calls();
        store.fail_inserts(u32::MAX, conflict("ANSWERS", 8));

        let err = gen.next_value("ANSWERS", 0).unwrap_err();
        match err {
            SequenceError::ExhaustedRetries {
                namespace,
                attempts,
                source,
            } => {
                assert_eq!(namespace, "ANSWERS");
                assert_eq!(attempts, DEFAULT_MAX_ATTEMPTS);
                assert!(source.is_conflict());
            }
            other => panic!("expected ExhaustedRetries, got {:?}", other),
        }

        assert_eq!(store.insert_calls() - before, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(gen.current_value("ANSWERS").unwrap(), Some(7));
        assert_eq!(gen.metrics().exhausted_total.load(Ordering::Relaxed), 1);
        assert_eq!(gen.metrics().next_value_errors_total.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn configured_attempt_budget_is_respected() {
        let store = Arc::new(FlakyStore::default());
        let config = IncrementorConfig {
            max_attempts: 3,
            ..IncrementorConfig::default()
        };
        let gen = Incrementor::with_config(Arc::clone(&store), config);
        store.fail_inserts(u32::MAX, conflict("ANSWERS", 1));

        assert!(matches!(
            gen.next_value("ANSWERS", 0),
            Err(SequenceError::ExhaustedRetries { attempts: 3, .. })
        ));
        assert_eq!(store.insert_calls(), 3);
    }

    #[test]
    fn backoff_still_resolves_conflicts() {
        let store = Arc::new(FlakyStore::default());
        let config = IncrementorConfig {
            backoff: Some(BackoffConfig {
                initial_delay_ms: 1,
                max_delay_ms: 2,
            }),
            ..IncrementorConfig::default()
        };
        let gen = Incrementor::with_config(Arc::clone(&store), config);
        store.fail_inserts(2, conflict("ANSWERS", 1));

        assert_eq!(gen.next_value("ANSWERS", 0).unwrap(), 1);
    }

    #[test]
    fn failed_cleanup_leaves_harmless_orphan() {
        let (gen, store) = incrementor_at("ANSWERS", 1);
        store.failing_deletes.store(true, Ordering::SeqCst);

        assert_eq!(gen.next_value("ANSWERS", 0).unwrap(), 2);
        assert_eq!(gen.next_value("ANSWERS", 0).unwrap(), 3);
        assert_eq!(gen.orphan_count("ANSWERS").unwrap(), 2);
        assert_eq!(gen.metrics().orphans("ANSWERS"), 2);

        store.failing_deletes.store(false, Ordering::SeqCst);
        assert_eq!(gen.next_value("ANSWERS", 0).unwrap(), 4);
        assert_eq!(gen.current_value("ANSWERS").unwrap(), Some(4));
    }

    #[test]
    fn sweep_removes_orphans_and_keeps_current() {
        let (gen, store) = incrementor_at("ANSWERS", 1);
        store.failing_deletes.store(true, Ordering::SeqCst);
        for _ in 0..3 {
            gen.next_value("ANSWERS", 0).unwrap();
        }
        store.failing_deletes.store(false, Ordering::SeqCst);

        assert_eq!(gen.orphan_count("ANSWERS").unwrap(), 3);
        assert_eq!(gen.sweep_superseded("ANSWERS").unwrap(), 3);
        assert_eq!(gen.orphan_count("ANSWERS").unwrap(), 0);
        assert_eq!(gen.metrics().orphans("ANSWERS"), 0);
        assert_eq!(gen.current_value("ANSWERS").unwrap(), Some(4));
        assert_eq!(gen.next_value("ANSWERS", 0).unwrap(), 5);
    }

    #[test]
    fn sweep_all_covers_every_namespace() {
        let (gen, store) = incrementor_at("ANSWERS", 1);
        gen.next_value("QUESTIONS", 0).unwrap();
        store.failing_deletes.store(true, Ordering::SeqCst);
        gen.next_value("ANSWERS", 0).unwrap();
        gen.next_value("QUESTIONS", 0).unwrap();
        gen.next_value("QUESTIONS", 0).unwrap();
        store.failing_deletes.store(false, Ordering::SeqCst);

        assert_eq!(gen.sweep_all().unwrap(), 3);
        assert_eq!(gen.namespaces().unwrap(), vec!["ANSWERS", "QUESTIONS"]);
    }

    #[test]
    fn insert_is_fsynced_and_delete_is_not() {
        let (gen, store) = incrementor_at("ANSWERS", 1);
        store.writes.lock().unwrap().clear();

        gen.next_value("ANSWERS", 0).unwrap();

        let writes = store.writes.lock().unwrap().clone();
        assert_eq!(
            writes,
            vec![("insert", Durability::Fsync), ("delete", Durability::Default)]
        );
    }

    #[test]
    fn non_retryable_read_error_fails_fast() {
        let (gen, store) = incrementor_at("ANSWERS", 1);
        *store.failing_reads.lock().unwrap() =
            Some(StoreError::Serialization("corrupt record".into()));
        let before = store.insert_calls();

        assert!(matches!(
            gen.next_value("ANSWERS", 0),
            Err(SequenceError::Store(StoreError::Serialization(_)))
        ));
        assert_eq!(store.insert_calls(), before);
    }

    #[test]
    fn transient_read_errors_use_the_attempt_budget() {
        let store = Arc::new(FlakyStore::default());
        let config = IncrementorConfig {
            max_attempts: 4,
            ..IncrementorConfig::default()
        };
        let gen = Incrementor::with_config(Arc::clone(&store), config);
        *store.failing_reads.lock().unwrap() = Some(StoreError::Unavailable("down".into()));

        assert!(matches!(
            gen.next_value("ANSWERS", 0),
            Err(SequenceError::ExhaustedRetries { attempts: 4, .. })
        ));
        assert_eq!(store.insert_calls(), 0);
    }

    #[test]
    fn invalid_namespace_never_reaches_store() {
        let store = Arc::new(FlakyStore::default());
        let gen = Incrementor::new(Arc::clone(&store));

        assert!(matches!(
            gen.next_value("", 0),
            Err(SequenceError::InvalidNamespace(_))
        ));
        assert!(matches!(
            gen.next_value("a:b", 0),
            Err(SequenceError::InvalidNamespace(_))
        ));
        assert_eq!(store.insert_calls(), 0);
    }

    #[test]
    fn overflow_is_reported() {
        let gen = Incrementor::new(Arc::new(MemoryRecordStore::new()));
        assert!(matches!(
            gen.next_value("ANSWERS", u64::MAX),
            Err(SequenceError::Overflow { .. })
        ));
    }

    #[test]
    fn namespaces_are_independent() {
        let gen = Incrementor::new(Arc::new(MemoryRecordStore::new()));
        let mut a = vec![];
        let mut b = vec![];
        for _ in 0..5 {
            a.push(gen.next_value("a", 0).unwrap());
            b.push(gen.next_value("b", 0).unwrap());
        }
        assert_eq!(a, vec![1, 2, 3, 4, 5]);
        assert_eq!(b, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn unique_index_is_created_on_first_call() {
        let store = Arc::new(MemoryRecordStore::new());
        let gen = Incrementor::new(Arc::clone(&store));
        assert!(!store.has_unique_index().unwrap());

        gen.next_value("ANSWERS", 0).unwrap();
        assert!(store.has_unique_index().unwrap());
    }

    #[test]
    fn current_value_of_unknown_namespace_is_none() {
        let gen = Incrementor::new(Arc::new(MemoryRecordStore::new()));
        assert_eq!(gen.current_value("ANSWERS").unwrap(), None);
    }

    #[test]
    fn from_env_reads_overrides_and_ignores_garbage() {
        std::env::set_var("AUTOINC_MAX_ATTEMPTS", "12");
        std::env::set_var("AUTOINC_INSERT_FSYNC", "false");
        std::env::set_var("AUTOINC_BACKOFF_INITIAL_MS", "5");
        std::env::set_var("AUTOINC_BACKOFF_MAX_MS", "not_a_number");

        let config = IncrementorConfig::from_env();
        assert_eq!(config.max_attempts, 12);
        assert_eq!(config.insert_durability, Durability::Default);
        assert_eq!(
            config.backoff,
            Some(BackoffConfig {
                initial_delay_ms: 5,
                max_delay_ms: 100
            })
        );

        std::env::set_var("AUTOINC_MAX_ATTEMPTS", "0");
        assert_eq!(IncrementorConfig::from_env().max_attempts, DEFAULT_MAX_ATTEMPTS);

        std::env::remove_var("AUTOINC_MAX_ATTEMPTS");
        std::env::remove_var("AUTOINC_INSERT_FSYNC");
        std::env::remove_var("AUTOINC_BACKOFF_INITIAL_MS");
        std::env::remove_var("AUTOINC_BACKOFF_MAX_MS");
    }
}
