//! Reference model for model-based testing.
//!
//! The model captures what every participant should eventually see, without
//! transports, queues, or delivery order. It serves as the oracle against
//! which the simulated call is verified.

pub mod operation;
mod world;

pub use operation::{
    Operation, OperationError, OperationResult, join_label, renamed_label,
};
pub use world::{ModelWorld, ObservableState, SeenParticipant};
