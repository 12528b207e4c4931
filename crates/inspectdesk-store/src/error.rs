use inspectdesk_core::{EntityKind, RecordId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: RecordId },

    #[error("cannot apply update to {kind} {id}: {source}")]
    Patch {
        kind: EntityKind,
        id: RecordId,
        source: serde_json::Error,
    },

    #[error("{0}")]
    Other(String),
}
