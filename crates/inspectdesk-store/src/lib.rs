//! Storage layer: ordered in-memory collections, follow-up link resolution
//! and CSV exchange.

mod error;
pub use error::StoreError;

pub mod exchange;
pub mod link;
mod store;

pub use exchange::{ExchangeError, Exportable, Sheet};
pub use link::{LinkError, Preview};
pub use store::{RecordStore, next_id};
