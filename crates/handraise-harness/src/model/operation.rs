//! Operations for model-based testing.
//!
//! Operations are generated randomly by proptest and applied to both the
//! model and the simulated call.

use arbitrary::Arbitrary;

use crate::hub::SlotId;

/// Operations that can be applied to a call.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Peer joins the room.
    Join {
        /// Peer joining.
        peer: SlotId,
    },

    /// Peer ends its call.
    Leave {
        /// Peer leaving.
        peer: SlotId,
    },

    /// Peer toggles its hand.
    ToggleHand {
        /// Peer toggling.
        peer: SlotId,
    },

    /// Peer changes the label others see.
    Rename {
        /// Peer renaming.
        peer: SlotId,
        /// Distinguishes successive names.
        suffix: u8,
    },

    /// Deliver a few pending callbacks.
    ///
    /// In the model this is a no-op (instant delivery).
    Deliver {
        /// Upper bound on deliveries.
        steps: u8,
    },

    /// Deliver every pending callback.
    DeliverPending,
}

impl Operation {
    /// Peer targeted by this operation, if any.
    pub fn peer(&self) -> Option<SlotId> {
        match self {
            Self::Join { peer }
            | Self::Leave { peer }
            | Self::ToggleHand { peer }
            | Self::Rename { peer, .. } => Some(*peer),
            Self::Deliver { .. } | Self::DeliverPending => None,
        }
    }
}

/// Label a peer joins with.
pub fn join_label(peer: SlotId) -> String {
    format!("Peer {peer}")
}

/// Label a peer takes on rename.
pub fn renamed_label(peer: SlotId, suffix: u8) -> String {
    format!("Peer {peer}.{suffix}")
}

/// Result of applying an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded.
    Ok,

    /// Operation failed with expected error.
    Error(OperationError),
}

/// Expected errors that can occur during operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Peer is already in the call.
    AlreadyJoined,

    /// Peer is not in the call.
    NotJoined,

    /// Invalid peer slot.
    InvalidPeer,
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}
