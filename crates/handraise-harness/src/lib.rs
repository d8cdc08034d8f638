//! Simulation harness for presence testing.
//!
//! An in-memory hub stands in for the call provider so several real
//! [`handraise_client::PresenceDriver`]s can share a room inside one process,
//! with reproducible (optionally shuffled) delivery order.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and a [`SimWorld`], and
//! their observable states are compared once delivery has drained.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod hub;
pub mod model;
pub mod sim_world;

pub use hub::{DEFAULT_ROOM, Delivery, HubConfig, SharedHub, SimHub, SimProvider, SlotId};
pub use model::{
    ModelWorld, ObservableState, Operation, OperationError, OperationResult, SeenParticipant,
    join_label, renamed_label,
};
pub use sim_world::{SimConfig, SimDriver, SimError, SimWorld};
