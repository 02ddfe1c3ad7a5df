//! Error kinds surfaced to the embedding UI. One user-visible message per
//! triggering action; nothing here is retried automatically.

use thiserror::Error;

/// Which mutation failed. Carried inside [`ClientError::MutationFailed`] so the
/// caller can phrase the message per action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationOp {
    Create,
    Update,
    Delete,
    AddAttendee,
    Join,
}

impl MutationOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationOp::Create => "create event",
            MutationOp::Update => "update event",
            MutationOp::Delete => "delete event",
            MutationOp::AddAttendee => "add attendee",
            MutationOp::Join => "join event",
        }
    }
}

impl std::fmt::Display for MutationOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Snapshot or single-event fetch failed (transport error or non-2xx).
    #[error("failed to fetch events: {0}")]
    FetchFailed(String),

    /// A create/update/delete/add-attendee/join call failed.
    #[error("failed to {op}: {message}")]
    MutationFailed { op: MutationOp, message: String },

    /// Server declined the credential (401). The session clears the held
    /// credential when this comes back from an authenticated call, forcing
    /// re-authentication; this is the only kind with a side effect.
    #[error("authentication declined, please log in again")]
    Unauthorized,

    /// Client-side validation rejected the input before any request was sent.
    #[error("{0}")]
    ValidationFailed(String),

    /// The push-channel websocket could not be established. Disconnects after
    /// a successful connect just end the consumer task (no auto-reconnect).
    #[error("stream connection failed: {0}")]
    StreamFailed(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}
