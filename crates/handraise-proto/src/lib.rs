//! Handraise wire protocol.
//!
//! Peers in a call exchange a single application-level message over the
//! provider's broadcast channel:
//!
//! ```json
//! { "participantId": "L", "handRaised": true }
//! ```
//!
//! There is no version field. All peers run the same build, so any change to
//! [`HandStateMessage`] is a breaking change for every peer at once.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod message;
mod participant;

pub use error::MessageError;
pub use message::HandStateMessage;
pub use participant::ParticipantId;
