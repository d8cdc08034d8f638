//! Model world.
//!
//! Instant, lossless delivery: every peer in the call always knows the
//! current label and hand state of every other peer. This is the converged
//! state the real call must reach once its queues drain.

use super::operation::{
    Operation, OperationError, OperationResult, join_label, renamed_label,
};
use crate::hub::SlotId;

/// One participant as seen from a peer: label and hand state.
pub type SeenParticipant = (String, bool);

/// Observable state for oracle comparison.
///
/// Per slot, `None` when not in the call, otherwise every participant that
/// peer displays, sorted by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Per-peer view of the room.
    pub views: Vec<Option<Vec<SeenParticipant>>>,
}

#[derive(Debug, Clone)]
struct ModelPeer {
    /// Label the peer shows for itself.
    join_label: String,
    /// Label everyone else shows.
    label: String,
    hand_raised: bool,
}

/// Model world - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    peers: Vec<Option<ModelPeer>>,
}

impl ModelWorld {
    /// Create a model with `num_peers` empty slots.
    pub fn new(num_peers: usize) -> Self {
        Self { peers: vec![None; num_peers] }
    }

    /// Number of slots.
    pub fn num_peers(&self) -> usize {
        self.peers.len()
    }

    /// Hand state of a peer in the call.
    pub fn is_hand_raised(&self, peer: SlotId) -> Option<bool> {
        self.peer(peer).map(|p| p.hand_raised)
    }

    /// Apply an operation and return the result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Join { peer } => {
                let Some(slot) = self.peers.get_mut(usize::from(*peer)) else {
                    return OperationResult::Error(OperationError::InvalidPeer);
                };
                if slot.is_some() {
                    return OperationResult::Error(OperationError::AlreadyJoined);
                }
                let label = join_label(*peer);
                *slot = Some(ModelPeer { join_label: label.clone(), label, hand_raised: false });
                OperationResult::Ok
            },
            Operation::Leave { peer } => match self.peers.get_mut(usize::from(*peer)) {
                None => OperationResult::Error(OperationError::InvalidPeer),
                Some(slot) => match slot.take() {
                    Some(_) => OperationResult::Ok,
                    None => OperationResult::Error(OperationError::NotJoined),
                },
            },
            Operation::ToggleHand { peer } => self.with_peer(*peer, |p| {
                p.hand_raised = !p.hand_raised;
            }),
            Operation::Rename { peer, suffix } => {
                let label = renamed_label(*peer, *suffix);
                self.with_peer(*peer, |p| p.label = label)
            },
            Operation::Deliver { .. } | Operation::DeliverPending => OperationResult::Ok,
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        let views = self
            .peers
            .iter()
            .enumerate()
            .map(|(viewer, slot)| {
                slot.as_ref().map(|_| {
                    let mut seen: Vec<SeenParticipant> = self
                        .peers
                        .iter()
                        .enumerate()
                        .filter_map(|(i, p)| {
                            let p = p.as_ref()?;
                            let label = if i == viewer { &p.join_label } else { &p.label };
                            Some((label.clone(), p.hand_raised))
                        })
                        .collect();
                    seen.sort();
                    seen
                })
            })
            .collect();

        ObservableState { views }
    }

    fn peer(&self, peer: SlotId) -> Option<&ModelPeer> {
        self.peers.get(usize::from(peer))?.as_ref()
    }

    fn with_peer(&mut self, peer: SlotId, f: impl FnOnce(&mut ModelPeer)) -> OperationResult {
        match self.peers.get_mut(usize::from(peer)) {
            None => OperationResult::Error(OperationError::InvalidPeer),
            Some(None) => OperationResult::Error(OperationError::NotJoined),
            Some(Some(p)) => {
                f(p);
                OperationResult::Ok
            },
        }
    }
}
