use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::contracts::{
    Durability, LockResultExt, NewRecord, RecordId, RecordStore, SequenceRecord, StoreError,
};
use crate::storage::RecordIdAllocator;

/// In-process record store.
///
/// Behaves like a document collection: until `ensure_unique_index` is called
/// duplicate `(namespace, value)` inserts are accepted. After that, values
/// at or below a namespace's high-water mark are rejected. Durability is
/// accepted and ignored.
#[derive(Default)]
pub struct MemoryRecordStore {
    state: RwLock<MemoryState>,
    ids: RecordIdAllocator,
}

#[derive(Default)]
struct MemoryState {
    records: HashMap<RecordId, SequenceRecord>,
    /// namespace -> value -> ids holding that value (more than one only without the index)
    by_namespace: BTreeMap<String, BTreeMap<u64, Vec<RecordId>>>,
    /// namespace -> largest value ever inserted; never lowered by deletes
    high_water: HashMap<String, u64>,
    unique_index: bool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once the unique index has been created.
    pub fn has_unique_index(&self) -> Result<bool, StoreError> {
        Ok(self.state.read().map_lock_err()?.unique_index)
    }

    /// Total number of stored records across namespaces.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.state.read().map_lock_err()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl RecordStore for MemoryRecordStore {
    fn ensure_unique_index(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().map_lock_err()?;
        if state.unique_index {
            return Ok(());
        }

        for (namespace, values) in &state.by_namespace {
            if let Some((value, _)) = values.iter().find(|(_, ids)| ids.len() > 1) {
                return Err(StoreError::UniqueViolation(format!(
                    "{} has duplicate records for value {}",
                    namespace, value
                )));
            }
        }

        state.unique_index = true;
        Ok(())
    }

    fn find_max(&self, namespace: &str) -> Result<Option<SequenceRecord>, StoreError> {
        let state = self.state.read().map_lock_err()?;
        let max = state
            .by_namespace
            .get(namespace)
            .and_then(|values| values.iter().next_back())
            .and_then(|(_, ids)| ids.first())
            .and_then(|id| state.records.get(id))
            .cloned();
        Ok(max)
    }

    fn insert(&self, record: &NewRecord, _durability: Durability) -> Result<RecordId, StoreError> {
        let mut state = self.state.write().map_lock_err()?;

        let taken = state
            .high_water
            .get(&record.namespace)
            .is_some_and(|head| record.value <= *head);
        if state.unique_index && taken {
            return Err(StoreError::ConstraintConflict {
                namespace: record.namespace.clone(),
                value: record.value,
            });
        }

        let record_id = self.ids.allocate()?;
        let head = state.high_water.entry(record.namespace.clone()).or_insert(0);
        *head = (*head).max(record.value);
        state
            .by_namespace
            .entry(record.namespace.clone())
            .or_default()
            .entry(record.value)
            .or_default()
            .push(record_id);
        state.records.insert(
            record_id,
            SequenceRecord {
                namespace: record.namespace.clone(),
                value: record.value,
                record_id,
            },
        );

        Ok(record_id)
    }

    fn delete(&self, record_id: RecordId, _durability: Durability) -> Result<bool, StoreError> {
        let mut state = self.state.write().map_lock_err()?;
        let Some(record) = state.records.remove(&record_id) else {
            return Ok(false);
        };

        if let Some(values) = state.by_namespace.get_mut(&record.namespace) {
            if let Some(ids) = values.get_mut(&record.value) {
                ids.retain(|id| *id != record_id);
                if ids.is_empty() {
                    values.remove(&record.value);
                }
            }
            if values.is_empty() {
                state.by_namespace.remove(&record.namespace);
            }
        }

        Ok(true)
    }

    fn records(&self, namespace: &str) -> Result<Vec<SequenceRecord>, StoreError> {
        let state = self.state.read().map_lock_err()?;
        let Some(values) = state.by_namespace.get(namespace) else {
            return Ok(Vec::new());
        };

        Ok(values
            .values()
            .flatten()
            .filter_map(|id| state.records.get(id).cloned())
            .collect())
    }

    fn namespaces(&self) -> Result<Vec<String>, StoreError> {
        let state = self.state.read().map_lock_err()?;
        Ok(state.by_namespace.keys().cloned().collect())
    }
}
