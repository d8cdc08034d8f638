//! Presence core
//!
//! Provider-agnostic presence synchronization for a video call: who is in
//! the call, in join order, and whose hand is raised.
//!
//! # Architecture
//!
//! The core is a pure state machine that:
//! - Receives events from the caller (provider lifecycle callbacks, inbound
//!   app messages, local UI intents)
//! - Produces actions for the caller to execute (broadcast, render, acquire or
//!   release the session, surface an error)
//! - Never performs I/O and never touches a rendering surface
//!
//! # Components
//!
//! - [`PresenceStore`]: insertion-ordered participant records plus local id
//! - [`PresenceSync`]: the session state machine owning the store
//! - [`SyncEvent`]: events fed into the state machine
//! - [`SyncAction`]: actions produced by the state machine
//! - [`ViewIntent`]: rendering changes, decoupled from the rendering mechanism

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod event;
mod record;
mod store;
mod sync;

pub use config::SyncConfig;
pub use error::SyncError;
pub use event::{SyncAction, SyncEvent, ViewIntent};
pub use handraise_proto::{HandStateMessage, MessageError, ParticipantId};
pub use record::{HandIndicator, PresenceRecord};
pub use store::PresenceStore;
pub use sync::{PresenceSync, SyncState};
