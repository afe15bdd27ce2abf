//! Errors that abort a whole turn.
//!
//! Collaborator failures (catalog, exporter, describer) never end up here:
//! they are answered with a retry prompt and the session stays where it was.

use thiserror::Error;

use crate::domain::conversation::{Action, Reply};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::StoreError;

#[derive(Debug, Clone, Error)]
pub enum TurnError {
    /// The backend could not be reached; nothing was written.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(StoreError),

    /// A flow tried to take an undeclared stage transition.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TurnError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TurnError::StorageUnavailable(_) => ErrorCode::StorageUnavailable,
            TurnError::Storage(StoreError::Corrupt { .. }) => ErrorCode::StorageCorrupt,
            TurnError::Storage(_) => ErrorCode::StorageUnavailable,
            TurnError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Message safe to show in the chat. Never includes backend details.
    pub fn user_reply(&self) -> Reply {
        match self {
            TurnError::StorageUnavailable(_) | TurnError::Storage(_) => Reply::text(
                "I can't reach my notebook right now, so I didn't change anything. \
                 Please try again in a moment.",
            )
            .button("Try again", Action::Retry),
            TurnError::Internal(_) => {
                Reply::text("Something went wrong on my side. Send /start to begin again.")
            }
        }
    }
}

impl From<StoreError> for TurnError {
    fn from(err: StoreError) -> Self {
        if err.is_unavailable() {
            TurnError::StorageUnavailable(err.to_string())
        } else {
            TurnError::Storage(err)
        }
    }
}

impl From<DomainError> for TurnError {
    fn from(err: DomainError) -> Self {
        TurnError::Internal(err.to_string())
    }
}
