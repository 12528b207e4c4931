use inspectdesk_core::{EntityKind, FormError, RecordId, ValidationError};
use inspectdesk_store::{ExchangeError, LinkError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: RecordId },

    #[error("no form is open")]
    NoOpenForm,

    #[error("{command} does not apply to the {kind} form")]
    WrongForm {
        command: &'static str,
        kind: EntityKind,
    },

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command}: {reason}")]
    BadArguments {
        command: &'static str,
        reason: String,
    },
}
