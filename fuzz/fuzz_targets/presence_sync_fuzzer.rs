//! Fuzz target for the [`PresenceSync`] state machine
//!
//! Every provider callback can arrive in any order relative to the others,
//! and app messages carry whatever a remote peer chose to send.
//!
//! # Strategy
//!
//! - Event sequences: arbitrary lifecycle callbacks, user intents and
//!   messages, including ones invalid for the current state
//! - Payloads: well-formed hand states for a small id space plus raw bytes
//! - Id collisions: peer events naming the local participant
//!
//! # Invariants
//!
//! - No transition FROM `Ended` (terminal invariant)
//! - Each participant appears at most once in the snapshot
//! - While `Active`, the local participant is present
//! - Rejected events leave state and snapshot untouched
//! - Messages about the local participant never change local hand state
//! - `Ended` holds no records
//! - Peer updates never add a record
//! - NEVER panic on any payload

#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use handraise_core::{
    HandStateMessage, ParticipantId, PresenceSync, SyncAction, SyncEvent, SyncState,
};
use libfuzzer_sys::fuzz_target;

const LOCAL: &str = "local";

#[derive(Debug, Clone, Arbitrary)]
enum FuzzEvent {
    Start { room: Option<u8> },
    Joined { label: Option<u8> },
    PeerJoined { peer: u8, label: Option<u8> },
    PeerUpdated { peer: u8, label: Option<u8> },
    PeerLeft { peer: u8 },
    Message(FuzzedPayload),
    Toggle,
    SessionFailed,
    End,
}

#[derive(Debug, Clone, Arbitrary)]
enum FuzzedPayload {
    HandState { peer: u8, raised: bool },
    RandomBytes(Vec<u8>),
}

/// Small id space so events collide; 0 is the local participant.
fn peer_id(peer: u8) -> ParticipantId {
    match peer % 8 {
        0 => ParticipantId::new(LOCAL),
        n => ParticipantId::new(format!("peer-{n}")),
    }
}

fn label(label: Option<u8>) -> Option<String> {
    label.map(|l| format!("L{}", l % 4))
}

fn to_event(event: FuzzEvent) -> SyncEvent {
    match event {
        FuzzEvent::Start { room } => {
            SyncEvent::Start { target_label: room.map(|r| format!("room-{r}")) }
        },
        FuzzEvent::Joined { label: l } => {
            SyncEvent::Joined { local_id: ParticipantId::new(LOCAL), label: label(l) }
        },
        FuzzEvent::PeerJoined { peer, label: l } => {
            SyncEvent::PeerJoined { id: peer_id(peer), label: label(l) }
        },
        FuzzEvent::PeerUpdated { peer, label: l } => {
            SyncEvent::PeerUpdated { id: peer_id(peer), label: label(l) }
        },
        FuzzEvent::PeerLeft { peer } => SyncEvent::PeerLeft { id: peer_id(peer) },
        FuzzEvent::Message(FuzzedPayload::HandState { peer, raised }) => {
            let payload = HandStateMessage::new(peer_id(peer), raised)
                .to_json()
                .unwrap_or_default();
            SyncEvent::MessageReceived { payload }
        },
        FuzzEvent::Message(FuzzedPayload::RandomBytes(payload)) => {
            SyncEvent::MessageReceived { payload }
        },
        FuzzEvent::Toggle => SyncEvent::ToggleLocalHand,
        FuzzEvent::SessionFailed => SyncEvent::SessionFailed { info: "fuzz".to_string() },
        FuzzEvent::End => SyncEvent::End,
    }
}

fuzz_target!(|events: Vec<FuzzEvent>| {
    let mut sync = PresenceSync::default();
    let local = ParticipantId::new(LOCAL);

    for event in events {
        let previous_state = sync.state();
        let previous_snapshot = sync.snapshot();
        let local_before = sync.local_id().is_some().then(|| sync.is_hand_raised(&local));
        let is_toggle = matches!(event, FuzzEvent::Toggle);
        let is_message = matches!(event, FuzzEvent::Message(_));
        let is_update = matches!(event, FuzzEvent::PeerUpdated { .. });

        match sync.handle(to_event(event)) {
            Ok(actions) => {
                if previous_state == SyncState::Ended {
                    assert_eq!(sync.state(), SyncState::Ended, "left Ended");
                }

                if is_message {
                    if let Some(before) = local_before {
                        assert_eq!(sync.is_hand_raised(&local), before, "echo changed local hand");
                    }
                    assert!(actions.len() <= 1);
                }

                if is_update {
                    let grew = sync.snapshot().len() != previous_snapshot.len();
                    assert!(!grew, "update added a record");
                }

                if is_toggle {
                    let broadcasts =
                        actions.iter().filter(|a| matches!(a, SyncAction::Broadcast(_))).count();
                    assert_eq!(broadcasts, 1);
                }
            },
            Err(_) => {
                assert_eq!(sync.state(), previous_state, "rejected event changed state");
                assert_eq!(sync.snapshot(), previous_snapshot, "rejected event changed records");
            },
        }

        let snapshot = sync.snapshot();
        let unique: HashSet<_> = snapshot.iter().map(|r| &r.participant_id).collect();
        assert_eq!(unique.len(), snapshot.len(), "duplicate participant");

        match sync.state() {
            SyncState::Active => assert!(sync.local_id().is_some_and(|id| unique.contains(id))),
            SyncState::Ended => assert!(snapshot.is_empty()),
            SyncState::Idle | SyncState::Joining => {},
        }
    }
});
