pub mod error;
pub mod sequence;
pub mod store;

pub use error::{LockResultExt, SequenceError, StoreError};
pub use sequence::SequenceGenerator;
pub use store::{Durability, NewRecord, RecordId, RecordStore, SequenceRecord};
