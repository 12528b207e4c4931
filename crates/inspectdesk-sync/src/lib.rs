//! Sync layer: read-only list endpoints for the directory records.

mod source;
pub use source::{ListSource, MemorySource, SyncError, decode_list, extract_list};

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::ListClient;
