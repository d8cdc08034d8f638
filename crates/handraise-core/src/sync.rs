//! Presence synchronization state machine.
//!
//! `PresenceSync` turns provider lifecycle events and inbound hand-state
//! messages into presence store mutations, and returns the broadcasts and
//! rendering changes that follow from them. Each event is applied exactly
//! once, in delivery order, and runs to completion before the next.
//!
//! ## States
//!
//! ```text
//! Idle --start--> Joining --joined--> Active --end--> Ended
//!                    |                            ^
//!                    +------------end-------------+
//! ```
//!
//! ## Policies
//!
//! - Broadcast on join: local hand state is announced when we join and again
//!   whenever a peer joins, so newcomers learn it without a targeted send
//! - Echo suppression: a message carrying the local id is never applied
//! - Self-healing: a message for an unknown peer creates the record instead
//!   of being dropped, since join and message delivery order is not
//!   guaranteed

use handraise_proto::{HandStateMessage, ParticipantId};
use tracing::{debug, info, warn};

use crate::{
    PresenceRecord, PresenceStore, SyncAction, SyncConfig, SyncError, SyncEvent, ViewIntent,
};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// No session.
    Idle,
    /// Session acquisition in progress.
    Joining,
    /// Joined; presence is being synchronized.
    Active,
    /// Call is over. Terminal.
    Ended,
}

/// Presence synchronization state machine.
///
/// Owns the [`PresenceStore`] for one call. Pure state machine - returns
/// actions, caller handles I/O.
#[derive(Debug)]
pub struct PresenceSync {
    state: SyncState,
    store: PresenceStore,
    config: SyncConfig,
}

impl Default for PresenceSync {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

impl PresenceSync {
    /// Create an idle state machine with an empty store.
    pub fn new(config: SyncConfig) -> Self {
        Self { state: SyncState::Idle, store: PresenceStore::new(), config }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Local participant, once joined.
    pub fn local_id(&self) -> Option<&ParticipantId> {
        self.store.local()
    }

    /// Look up one participant.
    pub fn record(&self, id: &ParticipantId) -> Option<PresenceRecord> {
        self.store.get(id)
    }

    /// Hand state of one participant, if present.
    pub fn is_hand_raised(&self, id: &ParticipantId) -> Option<bool> {
        self.store.get(id).map(|r| r.hand_raised)
    }

    /// All participants in join order.
    pub fn snapshot(&self) -> Vec<PresenceRecord> {
        self.store.list_ordered()
    }

    /// Decode an inbound app message.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::MalformedMessage` for invalid JSON, missing
    /// fields, wrong types or an empty participant id.
    pub fn decode_message(payload: &[u8]) -> Result<HandStateMessage, SyncError> {
        Ok(HandStateMessage::from_json(payload)?)
    }

    /// Process an event and return resulting actions.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidState` if the event is not accepted in the
    /// current state; nothing is changed in that case.
    pub fn handle(&mut self, event: SyncEvent) -> Result<Vec<SyncAction>, SyncError> {
        let name = event.name();

        match (self.state, event) {
            (SyncState::Idle, SyncEvent::Start { target_label }) => {
                Ok(self.handle_start(target_label))
            },
            (SyncState::Joining, SyncEvent::Joined { local_id, label }) => {
                Ok(self.handle_joined(local_id, label.as_deref()))
            },
            (SyncState::Joining | SyncState::Active, SyncEvent::PeerJoined { id, label }) => {
                Ok(self.handle_peer_joined(&id, label.as_deref()))
            },
            (SyncState::Joining | SyncState::Active, SyncEvent::PeerUpdated { id, label }) => {
                Ok(self.handle_peer_updated(&id, label.as_deref()))
            },
            (SyncState::Joining | SyncState::Active, SyncEvent::PeerLeft { id }) => {
                Ok(self.handle_peer_left(&id))
            },
            (SyncState::Joining | SyncState::Active, SyncEvent::MessageReceived { payload }) => {
                self.handle_message(&payload)
            },
            (SyncState::Active, SyncEvent::ToggleLocalHand) => self.handle_toggle(),
            (_, SyncEvent::SessionFailed { info }) => Ok(self.handle_session_failed(info)),
            (_, SyncEvent::End) => Ok(self.handle_end()),
            (state, _) => {
                warn!(?state, event = name, "rejecting event");
                Err(SyncError::InvalidState { state, event: name })
            },
        }
    }

    fn transition(&mut self, to: SyncState) {
        debug!(from = ?self.state, ?to, "presence sync transition");
        self.state = to;
    }

    /// Handle session start.
    fn handle_start(&mut self, target_label: Option<String>) -> Vec<SyncAction> {
        info!(target = ?target_label, "acquiring session");
        self.transition(SyncState::Joining);
        vec![SyncAction::AcquireSession { target_label }]
    }

    /// Handle the local participant joining.
    fn handle_joined(&mut self, local_id: ParticipantId, label: Option<&str>) -> Vec<SyncAction> {
        let label =
            label.filter(|l| !l.is_empty()).unwrap_or(self.config.local_label.as_str()).to_owned();

        self.store.set_local(local_id.clone());
        let record = self.store.upsert(&local_id, Some(&label));
        self.transition(SyncState::Active);
        info!(local = %local_id, "joined call");

        let announcement = HandStateMessage::new(local_id, record.hand_raised);
        vec![SyncAction::Render(record.into()), SyncAction::Broadcast(announcement)]
    }

    /// Handle a remote participant joining.
    fn handle_peer_joined(&mut self, id: &ParticipantId, label: Option<&str>) -> Vec<SyncAction> {
        if self.is_local(id) {
            debug!(%id, "ignoring peer join for local participant");
            return vec![];
        }

        let record = self.upsert_peer(id, label);
        debug!(%id, label = %record.display_label, "peer joined");

        let mut actions = vec![SyncAction::Render(record.into())];
        if self.config.rebroadcast_on_peer_join {
            if let Some(announcement) = self.local_announcement() {
                actions.push(SyncAction::Broadcast(announcement));
            }
        }
        actions
    }

    /// Handle a provider-side attribute change. Renders only on change.
    ///
    /// Updates never create records: a late update for a peer that already
    /// left must not bring it back.
    fn handle_peer_updated(&mut self, id: &ParticipantId, label: Option<&str>) -> Vec<SyncAction> {
        if self.is_local(id) {
            debug!(%id, "ignoring peer update for local participant");
            return vec![];
        }
        let Some(before) = self.store.get(id) else {
            debug!(%id, "ignoring update for unknown participant");
            return vec![];
        };

        let after = self.upsert_peer(id, label);
        if before == after {
            return vec![];
        }
        vec![SyncAction::Render(after.into())]
    }

    /// Handle a remote participant leaving.
    fn handle_peer_left(&mut self, id: &ParticipantId) -> Vec<SyncAction> {
        if self.is_local(id) {
            warn!(%id, "ignoring peer leave for local participant");
            return vec![];
        }

        match self.store.remove(id) {
            Some(record) => {
                debug!(%id, "peer left");
                vec![SyncAction::Render(ViewIntent::Remove { id: record.participant_id })]
            },
            None => vec![],
        }
    }

    /// Handle an inbound hand-state message.
    fn handle_message(&mut self, payload: &[u8]) -> Result<Vec<SyncAction>, SyncError> {
        let message = match Self::decode_message(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, len = payload.len(), "dropping malformed hand-state message");
                return Ok(vec![]);
            },
        };

        if self.is_local(&message.participant_id) {
            debug!(id = %message.participant_id, "suppressing echo of local hand state");
            return Ok(vec![]);
        }

        let record = match self.store.set_hand_raised(&message.participant_id, message.hand_raised)
        {
            Ok(record) => record,
            Err(SyncError::NotFound { id }) => {
                debug!(%id, "hand state for unknown participant, creating record");
                self.upsert_peer(&id, None);
                self.store.set_hand_raised(&id, message.hand_raised)?
            },
            Err(e) => return Err(e),
        };

        Ok(vec![SyncAction::Render(record.into())])
    }

    /// Handle the user toggling their own hand.
    fn handle_toggle(&mut self) -> Result<Vec<SyncAction>, SyncError> {
        let local = self
            .store
            .local()
            .cloned()
            .ok_or(SyncError::InvalidState { state: self.state, event: "toggle_local_hand" })?;

        let raised = self
            .store
            .get(&local)
            .map(|r| !r.hand_raised)
            .ok_or_else(|| SyncError::NotFound { id: local.clone() })?;
        let record = self.store.set_hand_raised(&local, raised)?;
        debug!(%local, raised, "toggled local hand");

        Ok(vec![
            SyncAction::Broadcast(HandStateMessage::new(local, raised)),
            SyncAction::Render(record.into()),
        ])
    }

    /// Handle a provider failure: surface it, then end the call.
    fn handle_session_failed(&mut self, info: String) -> Vec<SyncAction> {
        let error = SyncError::Session { info: info.clone() };
        warn!(state = ?self.state, %error, "session failed");

        let mut actions = vec![SyncAction::SurfaceError { info }];
        if matches!(self.state, SyncState::Joining | SyncState::Active) {
            actions.extend(self.handle_end());
        }
        actions
    }

    /// Handle leaving the call.
    fn handle_end(&mut self) -> Vec<SyncAction> {
        match self.state {
            SyncState::Ended => vec![],
            SyncState::Idle => {
                self.transition(SyncState::Ended);
                vec![]
            },
            SyncState::Joining | SyncState::Active => {
                let removed = self.store.clear();
                self.transition(SyncState::Ended);
                info!(participants = removed.len(), "call ended");

                let mut actions = Vec::with_capacity(removed.len() + 1);
                actions.push(SyncAction::ReleaseSession);
                actions.extend(removed.into_iter().map(|record| {
                    SyncAction::Render(ViewIntent::Remove { id: record.participant_id })
                }));
                actions
            },
        }
    }

    /// Insert or refresh a remote record, generating a label for new
    /// participants that arrive without one.
    fn upsert_peer(&mut self, id: &ParticipantId, label: Option<&str>) -> PresenceRecord {
        let label = label.filter(|l| !l.is_empty());
        if label.is_some() || self.store.contains(id) {
            return self.store.upsert(id, label);
        }

        let generated = self.config.generated_label(self.store.len() + 1);
        self.store.upsert(id, Some(&generated))
    }

    fn local_announcement(&self) -> Option<HandStateMessage> {
        let local = self.store.local()?;
        let record = self.store.get(local)?;
        Some(HandStateMessage::new(record.participant_id, record.hand_raised))
    }

    fn is_local(&self, id: &ParticipantId) -> bool {
        self.store.local() == Some(id)
    }
}
