//! Presence driver.
//!
//! Feeds provider callbacks and user intents into [`PresenceSync`] and
//! executes the returned actions against the session provider and the view.

use std::collections::VecDeque;

use handraise_core::{
    ParticipantId, PresenceRecord, PresenceSync, SyncAction, SyncEvent, SyncState,
};
use tracing::{debug, error, warn};

use crate::{
    DriverConfig, DriverError, PresenceView, SendScope, SessionError, SessionHandle,
    SessionListener, SessionProvider,
};

/// Executes presence actions against a provider and a view.
///
/// # Type Parameters
///
/// - `P`: session provider (transport)
/// - `V`: render target
pub struct PresenceDriver<P, V>
where
    P: SessionProvider,
    V: PresenceView,
{
    sync: PresenceSync,
    provider: P,
    view: V,
    session: Option<SessionHandle>,
    target_label: Option<String>,
}

impl<P, V> PresenceDriver<P, V>
where
    P: SessionProvider,
    V: PresenceView,
{
    /// Create an idle driver.
    pub fn new(provider: P, view: V, config: DriverConfig) -> Self {
        Self {
            sync: PresenceSync::new(config.sync),
            provider,
            view,
            session: None,
            target_label: config.target_label,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SyncState {
        self.sync.state()
    }

    /// Local participant, once joined.
    pub fn local_id(&self) -> Option<&ParticipantId> {
        self.sync.local_id()
    }

    /// Presence snapshot in join order.
    pub fn snapshot(&self) -> Vec<PresenceRecord> {
        self.sync.snapshot()
    }

    /// Hand state of one participant, if present.
    pub fn is_hand_raised(&self, id: &ParticipantId) -> Option<bool> {
        self.sync.is_hand_raised(id)
    }

    /// Active session handle, if any.
    pub fn session(&self) -> Option<&SessionHandle> {
        self.session.as_ref()
    }

    /// The view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// The provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Create or join the configured room.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Session` if the provider could not supply a
    /// session; the error has already been shown and the call has ended.
    pub fn start(&mut self) -> Result<(), DriverError> {
        let target_label = self.target_label.clone();
        self.process_event(SyncEvent::Start { target_label })
    }

    /// Toggle the local hand and broadcast the new state.
    pub fn toggle_hand(&mut self) -> Result<(), DriverError> {
        self.process_event(SyncEvent::ToggleLocalHand)
    }

    /// Leave the call.
    pub fn end(&mut self) -> Result<(), DriverError> {
        self.process_event(SyncEvent::End)
    }

    /// Process one event and execute everything that follows from it.
    pub fn process_event(&mut self, event: SyncEvent) -> Result<(), DriverError> {
        let actions = self.sync.handle(event)?;
        self.execute(actions)
    }

    /// Execute actions in order.
    ///
    /// A failed acquisition feeds `SessionFailed` back into the state
    /// machine; its actions run before this returns.
    fn execute(&mut self, actions: Vec<SyncAction>) -> Result<(), DriverError> {
        let mut queue = VecDeque::from(actions);
        let mut failure = None;

        while let Some(action) = queue.pop_front() {
            match action {
                SyncAction::AcquireSession { target_label } => {
                    match self.provider.create_or_join(target_label.as_deref()) {
                        Ok(handle) => {
                            debug!(session = handle.id, room = %handle.room, "session acquired");
                            self.session = Some(handle);
                        },
                        Err(e) => {
                            error!(error = %e, "session acquisition failed");
                            let info = e.to_string();
                            failure = Some(e);
                            queue.extend(self.sync.handle(SyncEvent::SessionFailed { info })?);
                        },
                    }
                },
                SyncAction::Broadcast(message) => match &self.session {
                    Some(session) => {
                        if let Err(e) = self.provider.send(session, &message, SendScope::All) {
                            warn!(error = %e, "hand-state broadcast failed");
                        }
                    },
                    None => warn!("no session, dropping hand-state broadcast"),
                },
                SyncAction::Render(intent) => self.view.apply(&intent),
                SyncAction::SurfaceError { info } => {
                    error!(%info, "session error");
                    self.view.show_error(&info);
                },
                SyncAction::ReleaseSession => {
                    if let Some(session) = self.session.take() {
                        debug!(session = session.id, "releasing session");
                        self.provider.close(session);
                    }
                },
            }
        }

        match failure {
            Some(e) => Err(DriverError::Session(e)),
            None => Ok(()),
        }
    }

    /// Feed a provider callback, logging rejections instead of returning
    /// them: callbacks have nobody to report to.
    fn dispatch(&mut self, event: SyncEvent) {
        let name = event.name();
        if let Err(e) = self.process_event(event) {
            warn!(event = name, error = %e, "provider callback not applied");
        }
    }

    /// Report a provider failure that arrived outside a callback.
    pub fn fail(&mut self, error: &SessionError) {
        self.dispatch(SyncEvent::SessionFailed { info: error.to_string() });
    }
}

impl<P, V> SessionListener for PresenceDriver<P, V>
where
    P: SessionProvider,
    V: PresenceView,
{
    fn on_joined(&mut self, local_id: ParticipantId, label: Option<String>) {
        self.dispatch(SyncEvent::Joined { local_id, label });
    }

    fn on_peer_joined(&mut self, id: ParticipantId, label: Option<String>) {
        self.dispatch(SyncEvent::PeerJoined { id, label });
    }

    fn on_peer_updated(&mut self, id: ParticipantId, label: Option<String>) {
        self.dispatch(SyncEvent::PeerUpdated { id, label });
    }

    fn on_peer_left(&mut self, id: ParticipantId) {
        self.dispatch(SyncEvent::PeerLeft { id });
    }

    fn on_app_message(&mut self, payload: &[u8]) {
        self.dispatch(SyncEvent::MessageReceived { payload: payload.to_vec() });
    }

    fn on_error(&mut self, info: String) {
        self.dispatch(SyncEvent::SessionFailed { info });
    }
}

impl<P, V> std::fmt::Debug for PresenceDriver<P, V>
where
    P: SessionProvider,
    V: PresenceView,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceDriver")
            .field("state", &self.sync.state())
            .field("participants", &self.sync.snapshot().len())
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use handraise_core::HandStateMessage;

    use super::*;
    use crate::{HandIndicator, MessageChannel, ParticipantList};

    /// Provider double that records every call.
    #[derive(Default)]
    struct FakeProvider {
        fail_join: bool,
        fail_send: bool,
        sent: Vec<HandStateMessage>,
        closed: Vec<SessionHandle>,
    }

    impl MessageChannel for FakeProvider {
        fn send(
            &mut self,
            _session: &SessionHandle,
            message: &HandStateMessage,
            _scope: SendScope,
        ) -> Result<(), SessionError> {
            if self.fail_send {
                return Err(SessionError::SendFailed { reason: "offline".to_string() });
            }
            self.sent.push(message.clone());
            Ok(())
        }
    }

    impl SessionProvider for FakeProvider {
        fn create_or_join(
            &mut self,
            target_label: Option<&str>,
        ) -> Result<SessionHandle, SessionError> {
            if self.fail_join {
                return Err(SessionError::Unavailable { reason: "no such room".to_string() });
            }
            Ok(SessionHandle { id: 1, room: target_label.unwrap_or("default").to_string() })
        }

        fn close(&mut self, session: SessionHandle) {
            self.closed.push(session);
        }
    }

    fn driver(provider: FakeProvider) -> PresenceDriver<FakeProvider, ParticipantList> {
        PresenceDriver::new(provider, ParticipantList::new(), DriverConfig::for_room("hello"))
    }

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    #[test]
    fn start_acquires_configured_room() {
        let mut driver = driver(FakeProvider::default());
        driver.start().unwrap();

        assert_eq!(driver.state(), SyncState::Joining);
        assert_eq!(driver.session().unwrap().room, "hello");
    }

    #[test]
    fn join_renders_and_broadcasts() {
        let mut driver = driver(FakeProvider::default());
        driver.start().unwrap();
        driver.on_joined(pid("L"), None);

        assert_eq!(driver.view().lines(), ["Local: Hand Lowered"]);
        assert_eq!(driver.provider().sent, [HandStateMessage::new(pid("L"), false)]);
    }

    #[test]
    fn toggle_sends_and_renders() {
        let mut driver = driver(FakeProvider::default());
        driver.start().unwrap();
        driver.on_joined(pid("L"), None);
        driver.on_peer_joined(pid("P1"), Some("Bob".to_string()));
        driver.toggle_hand().unwrap();

        assert_eq!(driver.provider().sent.last(), Some(&HandStateMessage::new(pid("L"), true)));
        assert_eq!(driver.view().lines(), ["Local: Hand Raised", "Bob: Hand Lowered"]);
    }

    #[test]
    fn inbound_message_updates_view() {
        let mut driver = driver(FakeProvider::default());
        driver.start().unwrap();
        driver.on_joined(pid("L"), None);
        driver.on_peer_joined(pid("P1"), Some("Bob".to_string()));
        driver.on_app_message(br#"{"participantId":"P1","handRaised":true}"#);

        assert_eq!(driver.view().row(&pid("P1")).unwrap().indicator, HandIndicator::Raised);
    }

    #[test]
    fn failed_join_surfaces_and_ends() {
        let provider = FakeProvider { fail_join: true, ..FakeProvider::default() };
        let mut driver = driver(provider);

        let result = driver.start();

        assert!(matches!(result, Err(DriverError::Session(SessionError::Unavailable { .. }))));
        assert_eq!(driver.state(), SyncState::Ended);
        assert_eq!(driver.view().errors(), ["session unavailable: no such room"]);
        assert!(driver.session().is_none());
    }

    #[test]
    fn failed_send_is_not_an_error() {
        let provider = FakeProvider { fail_send: true, ..FakeProvider::default() };
        let mut driver = driver(provider);
        driver.start().unwrap();
        driver.on_joined(pid("L"), None);

        assert!(driver.toggle_hand().is_ok());
        assert_eq!(driver.is_hand_raised(&pid("L")), Some(true));
    }

    #[test]
    fn end_closes_session_and_clears_view() {
        let mut driver = driver(FakeProvider::default());
        driver.start().unwrap();
        driver.on_joined(pid("L"), None);
        driver.on_peer_joined(pid("P1"), None);

        driver.end().unwrap();

        assert_eq!(driver.provider().closed.len(), 1);
        assert!(driver.session().is_none());
        assert!(driver.view().rows().is_empty());
        assert!(driver.snapshot().is_empty());
    }

    #[test]
    fn provider_error_ends_call() {
        let mut driver = driver(FakeProvider::default());
        driver.start().unwrap();
        driver.on_joined(pid("L"), None);

        driver.on_error("network lost".to_string());

        assert_eq!(driver.state(), SyncState::Ended);
        assert_eq!(driver.view().errors(), ["network lost"]);
        assert_eq!(driver.provider().closed.len(), 1);
    }

    #[test]
    fn callbacks_after_end_are_ignored() {
        let mut driver = driver(FakeProvider::default());
        driver.start().unwrap();
        driver.on_joined(pid("L"), None);
        driver.end().unwrap();

        driver.on_peer_joined(pid("P1"), Some("Bob".to_string()));
        assert!(driver.view().rows().is_empty());
        assert!(driver.toggle_hand().is_err());
    }
}
