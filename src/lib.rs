pub mod contracts;
pub mod metrics;
pub mod storage;
