//! Property tests for `PresenceStore` ordering and uniqueness.

use std::collections::HashSet;

use handraise_core::{ParticipantId, PresenceStore};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum StoreOp {
    Upsert { id: u8, label: Option<String> },
    Remove { id: u8 },
    SetHand { id: u8, raised: bool },
}

fn pid(n: u8) -> ParticipantId {
    ParticipantId::new(format!("p{n}"))
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    let id = 0..8u8;
    prop_oneof![
        4 => (id.clone(), proptest::option::of("[a-z]{0,4}"))
            .prop_map(|(id, label)| StoreOp::Upsert { id, label }),
        2 => id.clone().prop_map(|id| StoreOp::Remove { id }),
        2 => (id, any::<bool>()).prop_map(|(id, raised)| StoreOp::SetHand { id, raised }),
    ]
}

proptest! {
    /// No duplicates, and the listing order equals a reference join log
    /// where removal drops an id and re-adding appends it.
    #[test]
    fn prop_list_is_unique_and_join_ordered(
        ops in prop::collection::vec(store_op_strategy(), 0..100)
    ) {
        let mut store = PresenceStore::new();
        let mut expected: Vec<u8> = Vec::new();

        for op in &ops {
            match op {
                StoreOp::Upsert { id, label } => {
                    store.upsert(&pid(*id), label.as_deref());
                    if !expected.contains(id) {
                        expected.push(*id);
                    }
                },
                StoreOp::Remove { id } => {
                    store.remove(&pid(*id));
                    expected.retain(|e| e != id);
                },
                StoreOp::SetHand { id, raised } => {
                    let result = store.set_hand_raised(&pid(*id), *raised);
                    prop_assert_eq!(result.is_ok(), expected.contains(id));
                },
            }

            let listed: Vec<ParticipantId> =
                store.list_ordered().into_iter().map(|r| r.participant_id).collect();
            let unique: HashSet<_> = listed.iter().collect();
            prop_assert_eq!(unique.len(), listed.len(), "duplicate ids after {:?}", op);

            let want: Vec<ParticipantId> = expected.iter().copied().map(pid).collect();
            prop_assert_eq!(listed, want);
        }
    }

    /// Upserting an existing id never changes its hand state.
    #[test]
    fn prop_upsert_preserves_hand_state(
        raised in any::<bool>(),
        label in proptest::option::of("[a-z]{0,4}")
    ) {
        let mut store = PresenceStore::new();
        store.upsert(&pid(1), Some("first"));
        prop_assert!(store.set_hand_raised(&pid(1), raised).is_ok());

        let record = store.upsert(&pid(1), label.as_deref());
        prop_assert_eq!(record.hand_raised, raised);
        prop_assert_eq!(store.len(), 1);
    }

    /// Listing is restartable: two snapshots without intervening mutation
    /// are identical.
    #[test]
    fn prop_snapshot_restartable(ops in prop::collection::vec(store_op_strategy(), 0..40)) {
        let mut store = PresenceStore::new();
        for op in ops {
            match op {
                StoreOp::Upsert { id, label } => {
                    store.upsert(&pid(id), label.as_deref());
                },
                StoreOp::Remove { id } => {
                    store.remove(&pid(id));
                },
                StoreOp::SetHand { id, raised } => {
                    let _ = store.set_hand_raised(&pid(id), raised);
                },
            }
        }

        prop_assert_eq!(store.list_ordered(), store.list_ordered());
    }
}
