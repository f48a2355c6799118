use std::sync::{PoisonError, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

/// Extension trait for converting lock errors to StoreError.
pub trait LockResultExt<T> {
    /// Converts a lock error to a StoreError.
    fn map_lock_err(self) -> Result<T, StoreError>;
}

impl<'a, T> LockResultExt<RwLockReadGuard<'a, T>>
    for Result<RwLockReadGuard<'a, T>, PoisonError<RwLockReadGuard<'a, T>>>
{
    #[inline]
    fn map_lock_err(self) -> Result<RwLockReadGuard<'a, T>, StoreError> {
        self.map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl<'a, T> LockResultExt<RwLockWriteGuard<'a, T>>
    for Result<RwLockWriteGuard<'a, T>, PoisonError<RwLockWriteGuard<'a, T>>>
{
    #[inline]
    fn map_lock_err(self) -> Result<RwLockWriteGuard<'a, T>, StoreError> {
        self.map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

/// Errors raised by a [`RecordStore`](crate::contracts::RecordStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another writer already holds this `(namespace, value)` pair.
    #[error("Constraint conflict: {namespace} already has value {value}")]
    ConstraintConflict { namespace: String, value: u64 },

    /// Transient failure: the store could not serve the request right now.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("RocksDB error: {0}")]
    RocksDb(String),

    /// Existing data breaks the unique index and it cannot be built.
    #[error("Unique index violation: {0}")]
    UniqueViolation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StoreError {
    /// Returns true if repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::ConstraintConflict { .. } | StoreError::Unavailable(_)
        )
    }

    /// Returns true if this is a uniqueness-constraint rejection.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::ConstraintConflict { .. })
    }
}

#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Unable to get next value for {namespace} after {attempts} attempts")]
    ExhaustedRetries {
        namespace: String,
        attempts: u32,
        #[source]
        source: StoreError,
    },

    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    #[error("Sequence overflow for {namespace}")]
    Overflow { namespace: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
