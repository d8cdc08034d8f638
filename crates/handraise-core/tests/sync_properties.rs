//! Property and scenario tests for `PresenceSync`.

use handraise_core::{
    HandStateMessage, ParticipantId, PresenceSync, SyncAction, SyncEvent, SyncState, ViewIntent,
};
use proptest::prelude::*;

fn pid(s: &str) -> ParticipantId {
    ParticipantId::new(s)
}

fn message(id: &str, raised: bool) -> SyncEvent {
    let payload = HandStateMessage::new(pid(id), raised).to_json().unwrap();
    SyncEvent::MessageReceived { payload }
}

fn joined_sync() -> PresenceSync {
    let mut sync = PresenceSync::default();
    sync.handle(SyncEvent::Start { target_label: None }).unwrap();
    sync.handle(SyncEvent::Joined { local_id: pid("L"), label: Some("Local".into()) }).unwrap();
    sync
}

#[test]
fn scenario_toggle_after_peer_join() {
    let mut sync = PresenceSync::default();
    sync.handle(SyncEvent::Start { target_label: None }).unwrap();
    sync.handle(SyncEvent::Joined { local_id: pid("L"), label: Some("Local".into()) })
        .unwrap();
    sync.handle(SyncEvent::PeerJoined { id: pid("P1"), label: Some("Bob".into()) })
        .unwrap();

    let actions = sync.handle(SyncEvent::ToggleLocalHand).unwrap();

    assert!(actions.contains(&SyncAction::Broadcast(HandStateMessage::new(pid("L"), true))));
    assert_eq!(sync.is_hand_raised(&pid("L")), Some(true));
}

#[test]
fn scenario_peer_left_emits_one_remove() {
    let mut sync = joined_sync();
    sync.handle(SyncEvent::PeerJoined { id: pid("P1"), label: Some("Bob".into()) })
        .unwrap();

    let actions = sync.handle(SyncEvent::PeerLeft { id: pid("P1") }).unwrap();

    let removes: Vec<_> = actions
        .iter()
        .filter(|a| matches!(a, SyncAction::Render(ViewIntent::Remove { .. })))
        .collect();
    assert_eq!(removes.len(), 1);
    assert!(sync.record(&pid("P1")).is_none());
}

#[test]
fn scenario_session_failure_during_join() {
    let mut sync = PresenceSync::default();
    sync.handle(SyncEvent::Start { target_label: Some("hello".into()) }).unwrap();

    let actions =
        sync.handle(SyncEvent::SessionFailed { info: "no such room".into() }).unwrap();

    assert_eq!(
        actions,
        vec![SyncAction::SurfaceError { info: "no such room".into() }, SyncAction::ReleaseSession]
    );
    assert_eq!(sync.state(), SyncState::Ended);
}

proptest! {
    /// A message for p9 and p9's join converge to the same record in either
    /// delivery order.
    #[test]
    fn prop_message_join_order_independent(
        raised in any::<bool>(),
        message_first in any::<bool>()
    ) {
        let mut sync = joined_sync();
        let join = SyncEvent::PeerJoined { id: pid("p9"), label: Some("X".into()) };

        if message_first {
            prop_assert!(sync.handle(message("p9", raised)).is_ok());
            prop_assert!(sync.handle(join).is_ok());
        } else {
            prop_assert!(sync.handle(join).is_ok());
            prop_assert!(sync.handle(message("p9", raised)).is_ok());
        }

        let record = sync.record(&pid("p9")).unwrap();
        prop_assert_eq!(record.hand_raised, raised);
        prop_assert_eq!(record.display_label, "X");
    }

    /// Any number of toggles followed by arbitrary echoes leaves the local
    /// state equal to the parity of the toggles.
    #[test]
    fn prop_echo_never_changes_local_state(
        toggles in 0..10usize,
        echoes in prop::collection::vec(any::<bool>(), 0..10)
    ) {
        let mut sync = joined_sync();
        for _ in 0..toggles {
            prop_assert!(sync.handle(SyncEvent::ToggleLocalHand).is_ok());
        }
        for echo in echoes {
            let actions = sync.handle(message("L", echo));
            prop_assert_eq!(actions.map(|a| a.len()).ok(), Some(0));
        }

        prop_assert_eq!(sync.is_hand_raised(&pid("L")), Some(toggles % 2 == 1));
    }

    /// Repeating a peer join is idempotent.
    #[test]
    fn prop_peer_join_idempotent(label in "[A-Za-z]{1,6}", repeats in 1..5usize) {
        let join = SyncEvent::PeerJoined { id: pid("P1"), label: Some(label) };

        let mut once = joined_sync();
        let result = once.handle(join.clone());
        prop_assert!(result.is_ok());

        let mut many = joined_sync();
        for _ in 0..repeats {
            let result = many.handle(join.clone());
            prop_assert!(result.is_ok());
        }

        prop_assert_eq!(once.snapshot(), many.snapshot());
    }

    /// Arbitrary bytes as a message payload never mutate the store unless
    /// they decode.
    #[test]
    fn prop_garbage_payload_is_dropped(payload in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut sync = joined_sync();
        let before = sync.snapshot();
        let decodes = HandStateMessage::from_json(&payload).is_ok();

        let result = sync.handle(SyncEvent::MessageReceived { payload });
        prop_assert!(result.is_ok());
        if !decodes {
            prop_assert_eq!(sync.snapshot(), before);
        }
    }
}
