//! Wire decoding errors.

use thiserror::Error;

/// Errors from encoding or decoding a [`crate::HandStateMessage`].
#[derive(Debug, Error)]
pub enum MessageError {
    /// Payload is not valid JSON, or a field has the wrong type.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent.
    #[error("missing field: {field}")]
    MissingField {
        /// Wire name of the missing field.
        field: &'static str,
    },

    /// `participantId` is present but empty.
    #[error("empty participantId")]
    EmptyParticipantId,
}
