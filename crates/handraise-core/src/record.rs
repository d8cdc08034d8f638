//! Per-participant presence record.

use std::fmt;

use handraise_proto::ParticipantId;
use serde::{Deserialize, Serialize};

/// Presence attributes of one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
    /// Provider-assigned identifier.
    pub participant_id: ParticipantId,
    /// Name shown next to the participant.
    pub display_label: String,
    /// Whether the participant's hand is raised. False on creation.
    pub hand_raised: bool,
}

impl PresenceRecord {
    pub(crate) fn new(participant_id: ParticipantId, display_label: String) -> Self {
        Self { participant_id, display_label, hand_raised: false }
    }

    /// Text indicator for this record's hand state.
    pub fn indicator(&self) -> HandIndicator {
        HandIndicator::from(self.hand_raised)
    }
}

/// Text form of a hand state, as shown under a participant's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandIndicator {
    /// Hand is raised.
    Raised,
    /// Hand is lowered.
    Lowered,
}

impl From<bool> for HandIndicator {
    fn from(raised: bool) -> Self {
        if raised { Self::Raised } else { Self::Lowered }
    }
}

impl fmt::Display for HandIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raised => f.write_str("Hand Raised"),
            Self::Lowered => f.write_str("Hand Lowered"),
        }
    }
}
