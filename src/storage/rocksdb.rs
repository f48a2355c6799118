use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use rocksdb::{
    BlockBasedOptions, ErrorKind, IteratorMode, OptimisticTransactionDB,
    OptimisticTransactionOptions, Options, ReadOptions, WriteOptions,
};

use crate::contracts::{
    Durability, NewRecord, RecordId, RecordStore, SequenceRecord, StoreError,
};
use crate::storage::RecordIdAllocator;

/// Key prefix for record documents
const RECORD_PREFIX: &str = "rec";
/// Key prefix for the (namespace, value) unique index
const INDEX_PREFIX: &str = "idx";
/// Key prefix for a namespace's high-water mark
const HEAD_PREFIX: &str = "head";
/// Marker written once the unique index has been verified
const UNIQUE_INDEX_MARKER: &str = "meta:unique_index";

/// RocksDB tuning knobs.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    pub create_if_missing: bool,
    /// LRU block cache size in bytes
    pub block_cache_bytes: usize,
    /// Memtable size in bytes
    pub write_buffer_bytes: usize,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            block_cache_bytes: 8 * 1024 * 1024,
            write_buffer_bytes: 4 * 1024 * 1024,
        }
    }
}

impl RocksDbConfig {
    /// Creates a RocksDbConfig from environment variables.
    ///
    /// Environment variables:
    /// - `AUTOINC_ROCKSDB_CACHE_MB`: Block cache size in MB (default: 8)
    /// - `AUTOINC_ROCKSDB_WRITE_BUFFER_MB`: Write buffer size in MB (default: 4)
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            create_if_missing: default.create_if_missing,
            block_cache_bytes: std::env::var("AUTOINC_ROCKSDB_CACHE_MB")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(default.block_cache_bytes),
            write_buffer_bytes: std::env::var("AUTOINC_ROCKSDB_WRITE_BUFFER_MB")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(default.write_buffer_bytes),
        }
    }
}

/// RocksDB-backed record store.
///
/// Inserts run in optimistic transactions that read the index key and the
/// namespace's high-water mark with `get_for_update`, so two writers racing
/// for the same namespace cannot both commit. The high-water mark only
/// rises: a value at or below it is rejected even after the record that
/// held it was deleted.
pub struct RocksDbRecordStore {
    db: OptimisticTransactionDB,
    ids: RecordIdAllocator,
    unique_index_ready: AtomicBool,
}

impl RocksDbRecordStore {
    /// Opens or creates a store at the given path with default tuning.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_config(path, &RocksDbConfig::default())
    }

    /// Opens or creates a store at the given path.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: &RocksDbConfig,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_write_buffer_size(config.write_buffer_bytes);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_bytes));
        opts.set_block_based_table_factory(&block_opts);

        let db: OptimisticTransactionDB =
            OptimisticTransactionDB::open(&opts, path).map_err(map_rocksdb_err)?;

        let unique_index_ready = db
            .get(UNIQUE_INDEX_MARKER.as_bytes())
            .map_err(map_rocksdb_err)?
            .is_some();

        let mut store = Self {
            db,
            ids: RecordIdAllocator::new(),
            unique_index_ready: AtomicBool::new(unique_index_ready),
        };
        let last_id = store.last_record_id()?;
        store.ids = RecordIdAllocator::starting_after(last_id);

        tracing::info!(
            path = %path.display(),
            last_record_id = last_id,
            unique_index = unique_index_ready,
            "Opened sequence store"
        );

        Ok(store)
    }

    /// Creates a record key.
    /// Format: rec:{record_id_hex}
    fn record_key(record_id: RecordId) -> String {
        format!("{}:{}", RECORD_PREFIX, record_id)
    }

    /// Creates a unique index key.
    /// Format: idx:{namespace}:{value_hex}
    fn index_key(namespace: &str, value: u64) -> String {
        format!("{}:{}:{:016x}", INDEX_PREFIX, namespace, value)
    }

    /// Creates a high-water mark key.
    /// Format: head:{namespace}
    fn head_key(namespace: &str) -> String {
        format!("{}:{}", HEAD_PREFIX, namespace)
    }

    /// Key prefix covering every index entry of a namespace.
    fn index_prefix(namespace: &str) -> String {
        format!("{}:{}:", INDEX_PREFIX, namespace)
    }

    /// Exclusive upper bound for a key prefix ending in ':'.
    fn upper_bound(prefix: &str) -> Vec<u8> {
        let mut bound = prefix.as_bytes().to_vec();
        if let Some(last) = bound.last_mut() {
            *last += 1;
        }
        bound
    }

    fn bounded_read_options(prefix: &str) -> ReadOptions {
        let mut opts = ReadOptions::default();
        opts.set_iterate_lower_bound(prefix.as_bytes().to_vec());
        opts.set_iterate_upper_bound(Self::upper_bound(prefix));
        opts
    }

    fn write_options(durability: Durability) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(durability == Durability::Fsync);
        opts
    }

    fn transaction_options() -> OptimisticTransactionOptions {
        let mut opts = OptimisticTransactionOptions::new();
        opts.set_snapshot(true);
        opts
    }

    fn serialize_record(record: &SequenceRecord) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn deserialize_record(bytes: &[u8]) -> Result<SequenceRecord, StoreError> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    #[inline]
    fn parse_record_id(bytes: &[u8]) -> Result<RecordId, StoreError> {
        bytes
            .try_into()
            .map(|b| RecordId(u64::from_be_bytes(b)))
            .map_err(|_| StoreError::Serialization("Invalid record id bytes".into()))
    }

    /// Parses the value from an index key's hex suffix.
    fn parse_index_value(key: &[u8], prefix_len: usize) -> Result<u64, StoreError> {
        std::str::from_utf8(&key[prefix_len..])
            .ok()
            .and_then(|hex| u64::from_str_radix(hex, 16).ok())
            .ok_or_else(|| {
                StoreError::Serialization(format!(
                    "Malformed index key: {}",
                    String::from_utf8_lossy(key)
                ))
            })
    }

    /// Returns the highest record id still stored (0 for an empty store).
    fn last_record_id(&self) -> Result<u64, StoreError> {
        let prefix = format!("{}:", RECORD_PREFIX);
        let mut iter = self
            .db
            .iterator_opt(IteratorMode::End, Self::bounded_read_options(&prefix));

        match iter.next() {
            Some(item) => {
                let (key, _) = item.map_err(map_rocksdb_err)?;
                std::str::from_utf8(&key[prefix.len()..])
                    .ok()
                    .and_then(|hex| u64::from_str_radix(hex, 16).ok())
                    .ok_or_else(|| {
                        StoreError::Serialization(format!(
                            "Malformed record key: {}",
                            String::from_utf8_lossy(&key)
                        ))
                    })
            }
            None => Ok(0),
        }
    }

    /// Resolves a failed delete commit.
    ///
    /// A conflict means a concurrent delete touched the record first; if the
    /// record is gone the delete is reported as a no-op.
    fn settle_delete(
        &self,
        record_key: &str,
        committed: Result<(), rocksdb::Error>,
    ) -> Result<bool, StoreError> {
        let Err(e) = committed else {
            return Ok(true);
        };
        match e.kind() {
            ErrorKind::Busy | ErrorKind::TryAgain => {
                let still_there = self
                    .db
                    .get(record_key.as_bytes())
                    .map_err(map_rocksdb_err)?
                    .is_some();
                if still_there {
                    Err(map_rocksdb_err(e))
                } else {
                    Ok(false)
                }
            }
            _ => Err(map_rocksdb_err(e)),
        }
    }
}

impl RecordStore for RocksDbRecordStore {
    fn ensure_unique_index(&self) -> Result<(), StoreError> {
        if self.unique_index_ready.load(Ordering::Acquire) {
            return Ok(());
        }

        // Every insert writes its index entry in the same transaction, so the
        // index is always complete and only the marker needs writing.
        self.db
            .put_opt(
                UNIQUE_INDEX_MARKER.as_bytes(),
                b"namespace,value",
                &Self::write_options(Durability::Fsync),
            )
            .map_err(map_rocksdb_err)?;

        self.unique_index_ready.store(true, Ordering::Release);
        tracing::info!("Unique index on (namespace, value) ready");
        Ok(())
    }

    fn find_max(&self, namespace: &str) -> Result<Option<SequenceRecord>, StoreError> {
        let prefix = Self::index_prefix(namespace);
        let mut iter = self
            .db
            .iterator_opt(IteratorMode::End, Self::bounded_read_options(&prefix));

        let Some(item) = iter.next() else {
            return Ok(None);
        };
        let (key, id_bytes) = item.map_err(map_rocksdb_err)?;
        if !key.starts_with(prefix.as_bytes()) {
            return Ok(None);
        }

        Ok(Some(SequenceRecord {
            namespace: namespace.to_string(),
            value: Self::parse_index_value(&key, prefix.len())?,
            record_id: Self::parse_record_id(&id_bytes)?,
        }))
    }

    fn insert(&self, record: &NewRecord, durability: Durability) -> Result<RecordId, StoreError> {
        let index_key = Self::index_key(&record.namespace, record.value);
        let head_key = Self::head_key(&record.namespace);
        let conflict = || StoreError::ConstraintConflict {
            namespace: record.namespace.clone(),
            value: record.value,
        };

        let txn = self
            .db
            .transaction_opt(&Self::write_options(durability), &Self::transaction_options());

        if txn
            .get_for_update(index_key.as_bytes(), true)
            .map_err(map_rocksdb_err)?
            .is_some()
        {
            return Err(conflict());
        }

        let head = txn
            .get_for_update(head_key.as_bytes(), true)
            .map_err(map_rocksdb_err)?;
        if let Some(bytes) = head {
            let head = bytes
                .as_slice()
                .try_into()
                .map(u64::from_be_bytes)
                .map_err(|_| StoreError::Serialization("Invalid high-water bytes".into()))?;
            if record.value <= head {
                return Err(conflict());
            }
        }

        let record_id = self.ids.allocate()?;
        let stored = SequenceRecord {
            namespace: record.namespace.clone(),
            value: record.value,
            record_id,
        };

        txn.put(index_key.as_bytes(), record_id.0.to_be_bytes())
            .map_err(map_rocksdb_err)?;
        txn.put(head_key.as_bytes(), record.value.to_be_bytes())
            .map_err(map_rocksdb_err)?;
        txn.put(
            Self::record_key(record_id).as_bytes(),
            Self::serialize_record(&stored)?,
        )
        .map_err(map_rocksdb_err)?;

        // Commit fails with Busy when another writer touched the index key
        // or the high-water mark after our read.
        txn.commit().map_err(|e| match e.kind() {
            ErrorKind::Busy | ErrorKind::TryAgain => conflict(),
            _ => map_rocksdb_err(e),
        })?;

        Ok(record_id)
    }

    fn delete(&self, record_id: RecordId, durability: Durability) -> Result<bool, StoreError> {
        let record_key = Self::record_key(record_id);
        let txn = self
            .db
            .transaction_opt(&Self::write_options(durability), &Self::transaction_options());

        let Some(bytes) = txn
            .get_for_update(record_key.as_bytes(), true)
            .map_err(map_rocksdb_err)?
        else {
            return Ok(false);
        };
        let record = Self::deserialize_record(&bytes)?;

        let index_key = Self::index_key(&record.namespace, record.value);
        let owner = txn
            .get_for_update(index_key.as_bytes(), true)
            .map_err(map_rocksdb_err)?;
        if let Some(owner) = owner {
            if Self::parse_record_id(&owner)? == record_id {
                txn.delete(index_key.as_bytes()).map_err(map_rocksdb_err)?;
            }
        }
        txn.delete(record_key.as_bytes()).map_err(map_rocksdb_err)?;

        self.settle_delete(&record_key, txn.commit())
    }

    fn records(&self, namespace: &str) -> Result<Vec<SequenceRecord>, StoreError> {
        let prefix = Self::index_prefix(namespace);
        let iter = self
            .db
            .iterator_opt(IteratorMode::Start, Self::bounded_read_options(&prefix));

        let mut records = Vec::new();
        for item in iter {
            let (key, id_bytes) = item.map_err(map_rocksdb_err)?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            records.push(SequenceRecord {
                namespace: namespace.to_string(),
                value: Self::parse_index_value(&key, prefix.len())?,
                record_id: Self::parse_record_id(&id_bytes)?,
            });
        }
        Ok(records)
    }

    fn namespaces(&self) -> Result<Vec<String>, StoreError> {
        let prefix = format!("{}:", INDEX_PREFIX);
        let iter = self
            .db
            .iterator_opt(IteratorMode::Start, Self::bounded_read_options(&prefix));

        let mut namespaces: Vec<String> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(map_rocksdb_err)?;
            let Some(rest) = key.strip_prefix(prefix.as_bytes()) else {
                break;
            };
            let Some(end) = rest.iter().position(|b| *b == b':') else {
                continue;
            };
            let namespace = String::from_utf8_lossy(&rest[..end]);
            // Keys are sorted, so repeats of a namespace are adjacent
            if namespaces.last().map(String::as_str) != Some(&*namespace) {
                namespaces.push(namespace.into_owned());
            }
        }
        Ok(namespaces)
    }
}

/// Classifies RocksDB errors: transient kinds become `Unavailable`.
fn map_rocksdb_err(e: rocksdb::Error) -> StoreError {
    match e.kind() {
        ErrorKind::Busy
        | ErrorKind::TryAgain
        | ErrorKind::TimedOut
        | ErrorKind::Incomplete
        | ErrorKind::ShutdownInProgress
        | ErrorKind::Aborted
        | ErrorKind::IOError => StoreError::Unavailable(e.to_string()),
        _ => StoreError::RocksDb(e.to_string()),
    }
}
