//! Presence core error types.

use handraise_proto::{MessageError, ParticipantId};
use thiserror::Error;

use crate::SyncState;

/// Errors from presence store and synchronization operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Operation targeted a participant that is not in the store.
    #[error("participant not found: {id}")]
    NotFound {
        /// The participant that was not found.
        id: ParticipantId,
    },

    /// Inbound payload could not be decoded.
    #[error("malformed message: {0}")]
    MalformedMessage(#[from] MessageError),

    /// Event is not valid in the current session state.
    #[error("invalid state: {event} not accepted while {state:?}")]
    InvalidState {
        /// State the machine was in.
        state: SyncState,
        /// Name of the rejected event.
        event: &'static str,
    },

    /// The session provider reported a failure.
    #[error("session error: {info}")]
    Session {
        /// Provider-supplied description.
        info: String,
    },
}

impl SyncError {
    /// Returns true if this error should be shown to the user.
    ///
    /// Only provider failures are user visible; they also end the call.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::Session { .. })
    }

    /// Returns true if this error is fatal to the process.
    ///
    /// Nothing in the presence core is fatal: missing records are recovered,
    /// malformed payloads are dropped, and session failures end only the call.
    pub fn is_fatal(&self) -> bool {
        false
    }
}
