//! Fuzz target for [`HandStateMessage`] decoding
//!
//! Inbound app messages come from any participant in the room, so the decoder
//! sees arbitrary bytes.
//!
//! # Invariants
//!
//! - NEVER panic on any input
//! - A decoded message has a non-empty participant id
//! - A decoded message survives re-encoding unchanged

#![no_main]

use handraise_proto::HandStateMessage;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(message) = HandStateMessage::from_json(data) else {
        return;
    };

    assert!(!message.participant_id.is_empty());

    let encoded = message.to_json().expect("decoded message must encode");
    let decoded = HandStateMessage::from_json(&encoded).expect("re-encoded message must decode");
    assert_eq!(decoded, message);

    let value: serde_json::Value =
        serde_json::from_slice(&encoded).expect("encoding must be JSON");
    assert!(value.get("participantId").is_some());
    assert!(value.get("handRaised").is_some());
});
