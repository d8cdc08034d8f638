//! Presence client
//!
//! Binds the [`handraise_core::PresenceSync`] state machine to the outside
//! world: a session provider that owns call transport, and a view that owns
//! the display surface.
//!
//! ## Architecture
//!
//! ```text
//! provider callbacks ──► PresenceDriver ──► PresenceSync ──► actions
//!   (SessionListener)          │                               │
//!                              ◄───────────────────────────────┘
//!                              ├─► SessionProvider (acquire, send, close)
//!                              └─► PresenceView    (render intents, errors)
//! ```
//!
//! The driver is single-threaded: every callback runs to completion,
//! including executing the resulting actions, before the next one.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod driver;
mod error;
mod provider;
mod view;

pub use config::DriverConfig;
pub use driver::PresenceDriver;
pub use error::{DriverError, SessionError};
pub use handraise_core::{
    HandIndicator, HandStateMessage, ParticipantId, PresenceRecord, SyncConfig, SyncState,
    ViewIntent,
};
pub use provider::{MessageChannel, SendScope, SessionHandle, SessionListener, SessionProvider};
pub use view::{ParticipantList, ParticipantRow, PresenceView};
