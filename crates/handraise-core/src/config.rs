//! Synchronization policy knobs.

/// Configuration for [`crate::PresenceSync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Label for the local participant when the provider supplies none.
    pub local_label: String,
    /// Prefix for generated remote labels ("Participant 3").
    pub label_prefix: String,
    /// Re-broadcast local hand state whenever a peer joins.
    ///
    /// The channel offers no reliable addressing of a single new peer, so the
    /// whole room receives the announcement.
    pub rebroadcast_on_peer_join: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            local_label: "Local".to_string(),
            label_prefix: "Participant".to_string(),
            rebroadcast_on_peer_join: true,
        }
    }
}

impl SyncConfig {
    /// Generated label for the `n`th participant in the store.
    pub(crate) fn generated_label(&self, n: usize) -> String {
        format!("{} {n}", self.label_prefix)
    }
}
