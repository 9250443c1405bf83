//! Save-record storage for the farm game server.
//! - `storage` owns the keyed JSON documents and their access protocol.
//! - `runtime` builds the configured store once at process start.
//! - Errors are per-request and carry stable codes for the HTTP layer.

pub mod errors;
pub mod runtime;
pub mod storage;

pub use errors::StoreError;
pub use storage::{RecordStore, StoreOptions};
