//! Driver configuration.

use handraise_core::SyncConfig;

/// Configuration for [`crate::PresenceDriver`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverConfig {
    /// Room to join or create on start. `None` lets the provider pick.
    pub target_label: Option<String>,
    /// Presence synchronization policy.
    pub sync: SyncConfig,
}

impl DriverConfig {
    /// Configuration targeting a specific room.
    pub fn for_room(target_label: impl Into<String>) -> Self {
        Self { target_label: Some(target_label.into()), ..Self::default() }
    }
}
