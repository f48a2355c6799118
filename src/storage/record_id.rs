use std::sync::atomic::{AtomicU64, Ordering};

use crate::contracts::{RecordId, StoreError};

/// Hands out storage record ids.
///
/// Lock-free; ids are unique for the lifetime of the process. Stores recover
/// the starting point from the highest id they have persisted.
#[derive(Debug)]
pub struct RecordIdAllocator {
    last: AtomicU64,
}

impl RecordIdAllocator {
    /// Creates an allocator whose first id is 1.
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    /// Creates an allocator whose first id is `last + 1`.
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    /// Returns a fresh record id.
    pub fn allocate(&self) -> Result<RecordId, StoreError> {
        // Relaxed is enough: only uniqueness matters, ids do not order other memory
        let prev = self.last.fetch_add(1, Ordering::Relaxed);
        let id = prev
            .checked_add(1)
            .ok_or_else(|| StoreError::InvalidInput("record id space exhausted".into()))?;
        Ok(RecordId(id))
    }

    /// Returns the most recently allocated id (0 if none).
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}

impl Default for RecordIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
