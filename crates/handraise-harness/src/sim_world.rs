//! Multi-peer call simulation.
//!
//! Every local peer is a real [`PresenceDriver`] over a [`SimProvider`]
//! sharing one [`SimHub`]. Deliveries are pulled from the hub one at a time,
//! either in FIFO order or, with a seed, in a reproducible shuffled order
//! where app messages may overtake lifecycle events.

use std::rc::Rc;

use handraise_client::{
    DriverConfig, DriverError, ParticipantList, PresenceDriver, SessionListener, SyncConfig,
    SyncState,
};
use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    hub::{Delivery, HubConfig, SharedHub, SimHub, SimProvider, SlotId},
    model::{ObservableState, SeenParticipant},
};

/// Driver type used for every simulated peer.
pub type SimDriver = PresenceDriver<SimProvider, ParticipantList>;

/// Simulation setup.
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    /// Room every peer joins (`None` uses the hub default).
    pub room: Option<String>,
    /// Hub switches.
    pub hub: HubConfig,
    /// Presence configuration for every peer.
    pub sync: SyncConfig,
    /// Shuffle deliveries with this seed. `None` delivers FIFO.
    pub shuffle_seed: Option<u64>,
}

/// Errors from simulation operations.
#[derive(Debug, Error)]
pub enum SimError {
    /// Slot out of range or holds no driver.
    #[error("peer {slot} is not in the call")]
    NoPeer {
        /// Slot addressed.
        slot: SlotId,
    },

    /// The peer's driver failed.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// A call with several local peers.
#[derive(Debug)]
pub struct SimWorld {
    hub: SharedHub,
    peers: Vec<Option<SimDriver>>,
    config: SimConfig,
    rng: Option<ChaCha8Rng>,
}

impl SimWorld {
    /// Create a world with `num_peers` empty slots.
    pub fn new(num_peers: usize, config: SimConfig) -> Self {
        let hub = SimHub::shared(config.hub);
        let rng = config.shuffle_seed.map(ChaCha8Rng::seed_from_u64);
        let peers = (0..num_peers).map(|_| None).collect();

        Self { hub, peers, config, rng }
    }

    /// The shared hub.
    pub fn hub(&self) -> &SharedHub {
        &self.hub
    }

    /// Number of slots.
    pub fn num_peers(&self) -> usize {
        self.peers.len()
    }

    /// Driver in `slot`, if any.
    pub fn driver(&self, slot: SlotId) -> Option<&SimDriver> {
        self.peers.get(usize::from(slot))?.as_ref()
    }

    /// Slots whose driver is in the call.
    pub fn active_slots(&self) -> Vec<SlotId> {
        (0..self.peers.len())
            .filter_map(|i| SlotId::try_from(i).ok())
            .filter(|slot| self.driver(*slot).is_some_and(|d| d.state() == SyncState::Active))
            .collect()
    }

    /// Join `slot` under `label` and deliver its own join callback.
    ///
    /// A slot whose driver is still live is asked to start again, which the
    /// driver rejects.
    pub fn join(&mut self, slot: SlotId, label: &str) -> Result<(), SimError> {
        let entry = self.peers.get_mut(usize::from(slot)).ok_or(SimError::NoPeer { slot })?;

        if let Some(driver) = entry.as_mut().filter(|d| d.state() != SyncState::Ended) {
            return driver.start().map_err(SimError::from);
        }

        let provider = SimProvider::new(Rc::clone(&self.hub), slot, label);
        let config = DriverConfig {
            target_label: self.config.room.clone(),
            sync: self.config.sync.clone(),
        };
        let driver = entry.insert(PresenceDriver::new(provider, ParticipantList::new(), config));

        self.hub.borrow_mut().discard(slot);
        driver.start()?;
        debug!(slot, label, "peer joined");

        // Joined is always first in a fresh queue.
        let joined = self.hub.borrow_mut().pop(slot);
        if let Some(delivery) = joined {
            deliver(driver, delivery);
        }
        Ok(())
    }

    /// End the call for `slot` and drop its driver.
    pub fn leave(&mut self, slot: SlotId) -> Result<(), SimError> {
        let mut driver = self
            .peers
            .get_mut(usize::from(slot))
            .and_then(Option::take)
            .ok_or(SimError::NoPeer { slot })?;

        driver.end()?;
        debug!(slot, "peer left");
        Ok(())
    }

    /// Toggle the hand of `slot`.
    pub fn toggle(&mut self, slot: SlotId) -> Result<(), SimError> {
        self.driver_mut(slot)?.toggle_hand().map_err(SimError::from)
    }

    /// Change the label `slot` is known by to the rest of the room.
    pub fn rename(&mut self, slot: SlotId, label: &str) -> Result<(), SimError> {
        self.driver_mut(slot)?;
        self.hub
            .borrow_mut()
            .rename(slot, label)
            .map_err(|e| SimError::Driver(DriverError::Session(e)))
    }

    /// Queue a provider failure for `slot`.
    pub fn fail(&mut self, slot: SlotId, info: &str) {
        self.hub.borrow_mut().fail(slot, info);
    }

    /// Deliver one pending callback. Returns false when nothing is pending.
    pub fn step(&mut self) -> bool {
        let slots = self.hub.borrow().slots_with_pending();
        let slot = match self.rng.as_mut() {
            Some(rng) => slots.choose(rng).copied(),
            None => slots.first().copied(),
        };
        let Some(slot) = slot else {
            return false;
        };

        let overtake = self.rng.as_mut().is_some_and(|rng| rng.gen_bool(0.5));
        let delivery = {
            let mut hub = self.hub.borrow_mut();
            let first_message = if overtake { hub.pop_first_message(slot) } else { None };
            first_message.or_else(|| hub.pop(slot))
        };

        match (delivery, self.peers.get_mut(usize::from(slot)).and_then(Option::as_mut)) {
            (Some(delivery), Some(driver)) => deliver(driver, delivery),
            (Some(delivery), None) => trace!(slot, ?delivery, "no driver, dropping delivery"),
            (None, _) => {},
        }
        true
    }

    /// Deliver up to `max` callbacks. Returns how many were delivered.
    pub fn deliver(&mut self, max: usize) -> usize {
        (0..max).take_while(|_| self.step()).count()
    }

    /// Deliver until every queue is empty. Returns how many were delivered.
    pub fn flush(&mut self) -> usize {
        let mut delivered = 0;
        while self.step() {
            delivered += 1;
        }
        delivered
    }

    /// End every live driver.
    pub fn end_all(&mut self) {
        for slot in 0..self.peers.len() {
            if let Ok(slot) = SlotId::try_from(slot) {
                if let Err(e) = self.leave(slot) {
                    trace!(slot, error = %e, "skipping end");
                }
            }
        }
    }

    /// What each active peer displays, sorted by label.
    ///
    /// Peers that are joining or have ended count as absent.
    pub fn observable_state(&self) -> ObservableState {
        let views = self
            .peers
            .iter()
            .map(|slot| {
                slot.as_ref().filter(|d| d.state() == SyncState::Active).map(|driver| {
                    let mut seen: Vec<SeenParticipant> = driver
                        .snapshot()
                        .into_iter()
                        .map(|r| (r.display_label, r.hand_raised))
                        .collect();
                    seen.sort();
                    seen
                })
            })
            .collect();

        ObservableState { views }
    }

    fn driver_mut(&mut self, slot: SlotId) -> Result<&mut SimDriver, SimError> {
        self.peers
            .get_mut(usize::from(slot))
            .and_then(Option::as_mut)
            .ok_or(SimError::NoPeer { slot })
    }
}

fn deliver(driver: &mut SimDriver, delivery: Delivery) {
    match delivery {
        Delivery::Joined { local_id, label } => driver.on_joined(local_id, Some(label)),
        Delivery::PeerJoined { id, label } => driver.on_peer_joined(id, Some(label)),
        Delivery::PeerUpdated { id, label } => driver.on_peer_updated(id, Some(label)),
        Delivery::PeerLeft { id } => driver.on_peer_left(id),
        Delivery::AppMessage(payload) => driver.on_app_message(&payload),
        Delivery::Error(info) => driver.on_error(info),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lines(world: &SimWorld, slot: SlotId) -> Vec<String> {
        world.driver(slot).unwrap().view().lines()
    }

    #[test]
    fn two_peers_see_each_other() {
        let mut world = SimWorld::new(2, SimConfig::default());
        world.join(0, "Alice").unwrap();
        world.join(1, "Bob").unwrap();
        world.flush();

        assert_eq!(lines(&world, 0), ["Alice: Hand Lowered", "Bob: Hand Lowered"]);
        assert_eq!(lines(&world, 1), ["Bob: Hand Lowered", "Alice: Hand Lowered"]);
    }

    #[test]
    fn toggle_reaches_other_peer() {
        let mut world = SimWorld::new(2, SimConfig::default());
        world.join(0, "Alice").unwrap();
        world.join(1, "Bob").unwrap();
        world.flush();

        world.toggle(0).unwrap();
        world.flush();

        assert_eq!(lines(&world, 1), ["Bob: Hand Lowered", "Alice: Hand Raised"]);
    }

    #[test]
    fn late_joiner_learns_raised_hand() {
        let mut world = SimWorld::new(2, SimConfig::default());
        world.join(0, "Alice").unwrap();
        world.toggle(0).unwrap();
        world.flush();

        world.join(1, "Bob").unwrap();
        world.flush();

        assert_eq!(lines(&world, 1), ["Bob: Hand Lowered", "Alice: Hand Raised"]);
    }

    #[test]
    fn leave_removes_row_elsewhere() {
        let mut world = SimWorld::new(2, SimConfig::default());
        world.join(0, "Alice").unwrap();
        world.join(1, "Bob").unwrap();
        world.flush();

        world.leave(0).unwrap();
        world.flush();

        assert!(world.driver(0).is_none());
        assert_eq!(lines(&world, 1), ["Bob: Hand Lowered"]);
    }

    #[test]
    fn echoed_broadcast_is_suppressed() {
        let config = SimConfig {
            hub: HubConfig { echo_to_sender: true },
            ..SimConfig::default()
        };
        let mut world = SimWorld::new(1, config);
        world.join(0, "Alice").unwrap();
        world.toggle(0).unwrap();
        world.flush();

        assert_eq!(lines(&world, 0), ["Alice: Hand Raised"]);
    }

    #[test]
    fn rejoining_live_slot_is_rejected() {
        let mut world = SimWorld::new(1, SimConfig::default());
        world.join(0, "Alice").unwrap();

        assert!(matches!(world.join(0, "Alice"), Err(SimError::Driver(_))));
    }

    #[test]
    fn provider_failure_ends_peer() {
        let mut world = SimWorld::new(1, SimConfig::default());
        world.join(0, "Alice").unwrap();
        world.fail(0, "network lost");
        world.flush();

        let driver = world.driver(0).unwrap();
        assert_eq!(driver.state(), SyncState::Ended);
        assert_eq!(driver.view().errors(), ["network lost"]);
    }

    #[test]
    fn unknown_slot_is_an_error() {
        let mut world = SimWorld::new(1, SimConfig::default());
        assert!(matches!(world.toggle(3), Err(SimError::NoPeer { slot: 3 })));
        assert!(matches!(world.leave(0), Err(SimError::NoPeer { slot: 0 })));
    }
}
