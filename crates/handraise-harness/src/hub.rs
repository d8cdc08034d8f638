//! In-memory session provider.
//!
//! `SimHub` plays the role of the call provider for any number of local
//! peers. Instead of invoking callbacks directly, it queues a [`Delivery`] per
//! receiving peer; the [`crate::SimWorld`] decides when (and in what order)
//! to hand them to the drivers. This keeps every callback a separate,
//! run-to-completion step and lets tests reorder deliveries.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap, VecDeque},
    rc::Rc,
};

use handraise_client::{
    HandStateMessage, MessageChannel, ParticipantId, SendScope, SessionError, SessionHandle,
    SessionProvider,
};
use tracing::trace;

/// Local peer slot (0-indexed).
pub type SlotId = u8;

/// Room used when the caller names none.
pub const DEFAULT_ROOM: &str = "default";

/// A provider callback waiting to be delivered to one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The receiving peer joined.
    Joined {
        /// Id assigned to the receiving peer.
        local_id: ParticipantId,
        /// Label the peer joined with.
        label: String,
    },
    /// Another participant is in the room.
    PeerJoined {
        /// Remote participant.
        id: ParticipantId,
        /// Remote label.
        label: String,
    },
    /// Another participant changed its label.
    PeerUpdated {
        /// Remote participant.
        id: ParticipantId,
        /// New label.
        label: String,
    },
    /// Another participant left.
    PeerLeft {
        /// Remote participant.
        id: ParticipantId,
    },
    /// An app message from another participant.
    AppMessage(Vec<u8>),
    /// The provider failed for this peer.
    Error(String),
}

impl Delivery {
    /// True for app messages, the only deliveries allowed to overtake.
    pub fn is_app_message(&self) -> bool {
        matches!(self, Self::AppMessage(_))
    }
}

/// Hub behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubConfig {
    /// Deliver broadcasts back to the sender too.
    pub echo_to_sender: bool,
}

#[derive(Debug, Clone)]
struct Member {
    slot: SlotId,
    id: ParticipantId,
    label: String,
    session: u64,
}

/// Shared handle to a hub.
pub type SharedHub = Rc<RefCell<SimHub>>;

/// In-memory rooms and per-peer delivery queues.
#[derive(Debug, Default)]
pub struct SimHub {
    config: HubConfig,
    rooms: BTreeMap<String, Vec<Member>>,
    queues: HashMap<SlotId, VecDeque<Delivery>>,
    next_session: u64,
    refuse_joins: bool,
    messages_sent: u64,
}

impl SimHub {
    /// Create a hub.
    pub fn new(config: HubConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Create a hub behind a shared handle.
    pub fn shared(config: HubConfig) -> SharedHub {
        Rc::new(RefCell::new(Self::new(config)))
    }

    /// Make subsequent joins fail.
    pub fn refuse_joins(&mut self, refuse: bool) {
        self.refuse_joins = refuse;
    }

    /// Number of app messages accepted so far.
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent
    }

    /// Deliveries waiting for `slot`.
    pub fn pending(&self, slot: SlotId) -> usize {
        self.queues.get(&slot).map_or(0, VecDeque::len)
    }

    /// Slots with at least one waiting delivery, ascending.
    pub fn slots_with_pending(&self) -> Vec<SlotId> {
        let mut slots: Vec<_> =
            self.queues.iter().filter(|(_, q)| !q.is_empty()).map(|(s, _)| *s).collect();
        slots.sort_unstable();
        slots
    }

    /// Take the next delivery for `slot` in order.
    pub fn pop(&mut self, slot: SlotId) -> Option<Delivery> {
        self.queues.get_mut(&slot)?.pop_front()
    }

    /// Take the earliest app message for `slot`, overtaking any lifecycle
    /// deliveries queued before it. Messages stay in order among themselves.
    pub fn pop_first_message(&mut self, slot: SlotId) -> Option<Delivery> {
        let queue = self.queues.get_mut(&slot)?;
        let pos = queue.iter().position(Delivery::is_app_message)?;
        queue.remove(pos)
    }

    /// Drop everything queued for `slot`.
    pub fn discard(&mut self, slot: SlotId) {
        self.queues.remove(&slot);
    }

    /// Current participant id of `slot`, if in a room.
    pub fn participant(&self, slot: SlotId) -> Option<ParticipantId> {
        self.rooms.values().flatten().find(|m| m.slot == slot).map(|m| m.id.clone())
    }

    /// Change the label of `slot` and tell the rest of its room.
    pub fn rename(&mut self, slot: SlotId, label: &str) -> Result<(), SessionError> {
        let (room, id) = self
            .rooms
            .iter_mut()
            .find_map(|(room, members)| {
                members.iter_mut().find(|m| m.slot == slot).map(|m| {
                    label.clone_into(&mut m.label);
                    (room.clone(), m.id.clone())
                })
            })
            .ok_or(SessionError::Closed)?;

        self.notify_others(&room, slot, &Delivery::PeerUpdated { id, label: label.to_owned() });
        Ok(())
    }

    /// Queue a provider failure for `slot`.
    pub fn fail(&mut self, slot: SlotId, info: &str) {
        self.queue(slot, Delivery::Error(info.to_owned()));
    }

    fn join(
        &mut self,
        slot: SlotId,
        label: &str,
        target_label: Option<&str>,
    ) -> Result<SessionHandle, SessionError> {
        if self.refuse_joins {
            return Err(SessionError::Unavailable { reason: "joins refused".to_string() });
        }

        let room = target_label.unwrap_or(DEFAULT_ROOM).to_owned();
        self.next_session += 1;
        let session = self.next_session;
        let id = ParticipantId::new(format!("s{slot}-{session}"));

        self.queue(slot, Delivery::Joined { local_id: id.clone(), label: label.to_owned() });

        let existing = self.rooms.get(&room).cloned().unwrap_or_default();
        for member in existing {
            self.queue(slot, Delivery::PeerJoined { id: member.id, label: member.label });
        }
        let announce = Delivery::PeerJoined { id: id.clone(), label: label.to_owned() };
        self.notify_others(&room, slot, &announce);

        self.rooms.entry(room.clone()).or_default().push(Member {
            slot,
            id,
            label: label.to_owned(),
            session,
        });
        trace!(slot, session, %room, "hub join");

        Ok(SessionHandle { id: session, room })
    }

    fn broadcast(
        &mut self,
        session: &SessionHandle,
        message: &HandStateMessage,
    ) -> Result<(), SessionError> {
        let sender = self
            .rooms
            .get(&session.room)
            .and_then(|members| members.iter().find(|m| m.session == session.id))
            .map(|m| m.slot)
            .ok_or(SessionError::Closed)?;

        let payload = message
            .to_json()
            .map_err(|e| SessionError::SendFailed { reason: e.to_string() })?;

        let delivery = Delivery::AppMessage(payload);
        self.notify_others(&session.room, sender, &delivery);
        if self.config.echo_to_sender {
            self.queue(sender, delivery);
        }
        self.messages_sent += 1;
        Ok(())
    }

    fn leave(&mut self, session: &SessionHandle) {
        let Some(members) = self.rooms.get_mut(&session.room) else {
            return;
        };
        let Some(pos) = members.iter().position(|m| m.session == session.id) else {
            return;
        };

        let member = members.remove(pos);
        self.discard(member.slot);
        self.notify_others(&session.room, member.slot, &Delivery::PeerLeft { id: member.id });
        trace!(slot = member.slot, session = session.id, "hub leave");
    }

    fn notify_others(&mut self, room: &str, except: SlotId, delivery: &Delivery) {
        let slots: Vec<SlotId> = self
            .rooms
            .get(room)
            .map(|members| members.iter().map(|m| m.slot).filter(|s| *s != except).collect())
            .unwrap_or_default();
        for slot in slots {
            self.queue(slot, delivery.clone());
        }
    }

    fn queue(&mut self, slot: SlotId, delivery: Delivery) {
        self.queues.entry(slot).or_default().push_back(delivery);
    }
}

/// Session provider for one peer, backed by a shared hub.
#[derive(Debug, Clone)]
pub struct SimProvider {
    hub: SharedHub,
    slot: SlotId,
    label: String,
}

impl SimProvider {
    /// Provider for `slot` joining under `label`.
    pub fn new(hub: SharedHub, slot: SlotId, label: impl Into<String>) -> Self {
        Self { hub, slot, label: label.into() }
    }
}

impl MessageChannel for SimProvider {
    fn send(
        &mut self,
        session: &SessionHandle,
        message: &HandStateMessage,
        _scope: SendScope,
    ) -> Result<(), SessionError> {
        self.hub.borrow_mut().broadcast(session, message)
    }
}

impl SessionProvider for SimProvider {
    fn create_or_join(
        &mut self,
        target_label: Option<&str>,
    ) -> Result<SessionHandle, SessionError> {
        self.hub.borrow_mut().join(self.slot, &self.label, target_label)
    }

    fn close(&mut self, session: SessionHandle) {
        self.hub.borrow_mut().leave(&session);
    }
}
