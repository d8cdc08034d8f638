//! Hand-state broadcast payload.

use serde::{Deserialize, Serialize};

use crate::{MessageError, ParticipantId};

/// Hand-state announcement broadcast to every peer in the call.
///
/// Sent by a peer when it joins, when another peer joins, and whenever its
/// local hand state is toggled. Receivers apply it to their presence store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandStateMessage {
    /// Participant whose hand state this is.
    pub participant_id: ParticipantId,
    /// Whether that participant's hand is raised.
    pub hand_raised: bool,
}

/// Lenient shape used for decoding so absent fields can be reported by name
/// instead of as an opaque serde error.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHandState {
    #[serde(default)]
    participant_id: Option<String>,
    #[serde(default)]
    hand_raised: Option<bool>,
}

impl HandStateMessage {
    /// Create a new message.
    pub fn new(participant_id: ParticipantId, hand_raised: bool) -> Self {
        Self { participant_id, hand_raised }
    }

    /// Encode to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>, MessageError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from JSON bytes.
    ///
    /// Extra fields are ignored. Missing or empty `participantId` and missing
    /// `handRaised` are rejected.
    pub fn from_json(bytes: &[u8]) -> Result<Self, MessageError> {
        let raw: RawHandState = serde_json::from_slice(bytes)?;
        Self::from_raw(raw)
    }

    /// Decode from an already-parsed JSON value, as handed over by providers
    /// that deliver structured app messages.
    pub fn from_value(value: serde_json::Value) -> Result<Self, MessageError> {
        let raw: RawHandState = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawHandState) -> Result<Self, MessageError> {
        let participant_id =
            raw.participant_id.ok_or(MessageError::MissingField { field: "participantId" })?;
        if participant_id.is_empty() {
            return Err(MessageError::EmptyParticipantId);
        }
        let hand_raised =
            raw.hand_raised.ok_or(MessageError::MissingField { field: "handRaised" })?;

        Ok(Self { participant_id: ParticipantId::new(participant_id), hand_raised })
    }
}
