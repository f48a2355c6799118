use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contracts::error::StoreError;

/// Document store holding sequence records.
///
/// # Invariants
/// - At most one record per `(namespace, value)` once `ensure_unique_index`
///   has succeeded. `insert` reports a duplicate as
///   [`StoreError::ConstraintConflict`], never as success.
/// - Once the index exists, each namespace has a high-water mark: the
///   largest value ever inserted. `insert` rejects any value at or below it
///   as a conflict, and deletes never lower it, so a deleted value is never
///   reissued.
/// - Record ids are assigned by the store and unique among stored records.
pub trait RecordStore: Send + Sync {
    /// Creates the unique index on `(namespace, value)` if it does not exist.
    /// Idempotent.
    fn ensure_unique_index(&self) -> Result<(), StoreError>;

    /// Returns the record with the highest value for `namespace`.
    fn find_max(&self, namespace: &str) -> Result<Option<SequenceRecord>, StoreError>;

    /// Inserts a new record and returns the id the store assigned to it.
    fn insert(&self, record: &NewRecord, durability: Durability) -> Result<RecordId, StoreError>;

    /// Deletes a record by id. Returns false if it was already gone.
    fn delete(&self, record_id: RecordId, durability: Durability) -> Result<bool, StoreError>;

    /// Lists every record stored for `namespace`, ordered by ascending value.
    fn records(&self, namespace: &str) -> Result<Vec<SequenceRecord>, StoreError>;

    /// Lists namespaces that have at least one record, sorted.
    fn namespaces(&self) -> Result<Vec<String>, StoreError>;
}

/// Storage-assigned identifier of one stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A persisted high-water mark for one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub namespace: String,
    pub value: u64,
    pub record_id: RecordId,
}

/// Insert payload. The store assigns the record id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub namespace: String,
    pub value: u64,
}

/// Durability requested for a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Durability {
    /// Acknowledge once the store accepted the write.
    #[default]
    Default,
    /// Acknowledge only after the write reached stable storage.
    Fsync,
}
