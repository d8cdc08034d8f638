//! Events consumed and actions produced by [`crate::PresenceSync`].

use handraise_proto::{HandStateMessage, ParticipantId};
use serde::{Deserialize, Serialize};

use crate::PresenceRecord;

/// Input to the presence state machine.
///
/// Provider lifecycle callbacks, inbound app messages and local UI intents
/// all arrive as one of these, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Begin acquiring a call session.
    Start {
        /// Room to join or create. `None` lets the provider decide.
        target_label: Option<String>,
    },

    /// The local participant joined the call.
    Joined {
        /// Provider-assigned id of the local participant.
        local_id: ParticipantId,
        /// Display label, if the provider has one.
        label: Option<String>,
    },

    /// A remote participant joined.
    PeerJoined {
        /// Remote participant id.
        id: ParticipantId,
        /// Display label, if the provider has one.
        label: Option<String>,
    },

    /// A remote participant's provider-side attributes changed.
    PeerUpdated {
        /// Remote participant id.
        id: ParticipantId,
        /// Display label, if the provider has one.
        label: Option<String>,
    },

    /// A remote participant left.
    PeerLeft {
        /// Remote participant id.
        id: ParticipantId,
    },

    /// An app message arrived on the broadcast channel.
    MessageReceived {
        /// Raw JSON payload.
        payload: Vec<u8>,
    },

    /// The user toggled their own hand.
    ToggleLocalHand,

    /// The provider reported an error. The call ends.
    SessionFailed {
        /// Provider-supplied description.
        info: String,
    },

    /// Leave the call.
    End,
}

impl SyncEvent {
    /// Short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Joined { .. } => "joined",
            Self::PeerJoined { .. } => "peer_joined",
            Self::PeerUpdated { .. } => "peer_updated",
            Self::PeerLeft { .. } => "peer_left",
            Self::MessageReceived { .. } => "message",
            Self::ToggleLocalHand => "toggle_local_hand",
            Self::SessionFailed { .. } => "session_failed",
            Self::End => "end",
        }
    }
}

/// Output of the presence state machine, executed by the caller in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Create or join a session through the provider.
    AcquireSession {
        /// Room to join or create.
        target_label: Option<String>,
    },

    /// Send a hand-state message to every peer. Fire and forget.
    Broadcast(HandStateMessage),

    /// Apply a rendering change.
    Render(ViewIntent),

    /// Show a provider failure to the user.
    SurfaceError {
        /// Provider-supplied description.
        info: String,
    },

    /// Release the session handle.
    ReleaseSession,
}

/// A rendering change. Views must apply these idempotently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ViewIntent {
    /// Show or refresh a participant.
    Upsert {
        /// Participant to show.
        id: ParticipantId,
        /// Display label.
        label: String,
        /// Hand state.
        #[serde(rename = "handRaised")]
        hand_raised: bool,
    },

    /// Remove a participant from the display.
    Remove {
        /// Participant to remove.
        id: ParticipantId,
    },
}

impl From<PresenceRecord> for ViewIntent {
    fn from(record: PresenceRecord) -> Self {
        Self::Upsert {
            id: record.participant_id,
            label: record.display_label,
            hand_raised: record.hand_raised,
        }
    }
}
