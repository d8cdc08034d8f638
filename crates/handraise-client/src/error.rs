//! Client error types.

use handraise_core::SyncError;
use thiserror::Error;

/// Failures reported by a session provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Session could not be created or joined.
    #[error("session unavailable: {reason}")]
    Unavailable {
        /// Provider-supplied description.
        reason: String,
    },

    /// A message could not be handed to the channel.
    #[error("send failed: {reason}")]
    SendFailed {
        /// Provider-supplied description.
        reason: String,
    },

    /// The session handle is no longer valid.
    #[error("session closed")]
    Closed,
}

/// Errors from driver operations.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The presence state machine rejected the event.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The session provider failed. Shown to the user; the call has ended.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl DriverError {
    /// Returns true if this error should be shown to the user.
    pub fn is_user_visible(&self) -> bool {
        match self {
            Self::Sync(e) => e.is_user_visible(),
            Self::Session(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use handraise_core::SyncState;

    use super::*;

    #[test]
    fn session_errors_are_user_visible() {
        let err = DriverError::from(SessionError::Unavailable { reason: "404".to_string() });
        assert!(err.is_user_visible());
        assert_eq!(err.to_string(), "session unavailable: 404");
    }

    #[test]
    fn rejected_events_are_not_user_visible() {
        let err = DriverError::from(SyncError::InvalidState {
            state: SyncState::Ended,
            event: "toggle_local_hand",
        });
        assert!(!err.is_user_visible());
    }
}
