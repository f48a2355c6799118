mod incrementor;
mod memory;
mod namespace;
mod record_id;
mod rocksdb;

pub use incrementor::{BackoffConfig, Incrementor, IncrementorConfig, DEFAULT_MAX_ATTEMPTS};
pub use memory::MemoryRecordStore;
pub use namespace::{validate_namespace, MAX_NAMESPACE_LEN};
pub use record_id::RecordIdAllocator;
pub use self::rocksdb::{RocksDbConfig, RocksDbRecordStore};
