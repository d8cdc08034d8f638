//! Session provider contracts.
//!
//! The call transport (connection, media, room lifecycle) lives outside this
//! crate. It is reached through [`SessionProvider`] and reports lifecycle
//! events back through [`SessionListener`].

use handraise_core::{HandStateMessage, ParticipantId};

use crate::SessionError;

/// Opaque handle to an acquired call session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    /// Provider-assigned session id.
    pub id: u64,
    /// Room the session belongs to.
    pub room: String,
}

/// Delivery scope for app messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendScope {
    /// Every other participant in the room.
    #[default]
    All,
}

/// Broadcast capability supplied by the transport.
///
/// Delivery is best effort: a successful `send` means the provider accepted
/// the message, not that any peer received it.
pub trait MessageChannel {
    /// Hand a message to the transport for delivery.
    fn send(
        &mut self,
        session: &SessionHandle,
        message: &HandStateMessage,
        scope: SendScope,
    ) -> Result<(), SessionError>;
}

/// Session acquisition and release.
pub trait SessionProvider: MessageChannel {
    /// Create or join a session for `target_label`.
    ///
    /// Lifecycle callbacks (joined, peers) are delivered later through the
    /// driver's [`SessionListener`] implementation.
    fn create_or_join(&mut self, target_label: Option<&str>) -> Result<SessionHandle, SessionError>;

    /// Release a session. Infallible from the caller's point of view.
    fn close(&mut self, session: SessionHandle);
}

/// Lifecycle callbacks a provider delivers.
///
/// Every callback is processed to completion before returning.
pub trait SessionListener {
    /// The local participant joined.
    fn on_joined(&mut self, local_id: ParticipantId, label: Option<String>);

    /// A remote participant joined.
    fn on_peer_joined(&mut self, id: ParticipantId, label: Option<String>);

    /// A remote participant's attributes changed.
    fn on_peer_updated(&mut self, id: ParticipantId, label: Option<String>);

    /// A remote participant left.
    fn on_peer_left(&mut self, id: ParticipantId);

    /// An app message arrived.
    fn on_app_message(&mut self, payload: &[u8]);

    /// The provider failed.
    fn on_error(&mut self, info: String);
}
