use engine_core::error::CursorError;
use thiserror::Error;

/// Common error type for all actors in the runtime.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActorError {
    #[error("Mailbox closed")]
    MailboxClosed,

    #[error("Actor dropped the reply channel")]
    ReplyDropped,
}

impl From<ActorError> for CursorError {
    fn from(err: ActorError) -> Self {
        match err {
            ActorError::MailboxClosed | ActorError::ReplyDropped => CursorError::Disconnected,
        }
    }
}
