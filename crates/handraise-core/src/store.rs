//! Presence store.
//!
//! Authoritative participant-id → [`PresenceRecord`] mapping for one call,
//! kept in join order for rendering.
//!
//! # Invariants
//!
//! - No duplicate participant ids
//! - Iteration order is first-insertion order; a removed and re-added id goes
//!   to the back
//! - The local id, once set and inserted, stays a key until removed or the
//!   store is cleared
//! - `remove` is the only way a participant disappears

use std::collections::{BTreeMap, HashMap};

use handraise_proto::ParticipantId;

use crate::{PresenceRecord, SyncError};

/// Insertion-ordered presence records plus the local participant id.
#[derive(Debug, Default, Clone)]
pub struct PresenceStore {
    /// Records keyed by join sequence number.
    records: BTreeMap<u64, PresenceRecord>,
    /// Participant id to join sequence number.
    index: HashMap<ParticipantId, u64>,
    /// Next join sequence number. Never reused.
    next_seq: u64,
    /// Local participant, if joined.
    local: Option<ParticipantId>,
}

impl PresenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` if absent, otherwise refresh its label.
    ///
    /// A new record starts with its hand lowered. An existing record keeps
    /// its label unless `label` is non-empty.
    pub fn upsert(&mut self, id: &ParticipantId, label: Option<&str>) -> PresenceRecord {
        let label = label.filter(|l| !l.is_empty());

        if let Some(record) = self.record_mut(id) {
            if let Some(label) = label {
                label.clone_into(&mut record.display_label);
            }
            return record.clone();
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        let record = PresenceRecord::new(id.clone(), label.unwrap_or_default().to_string());
        self.index.insert(id.clone(), seq);
        self.records.insert(seq, record.clone());
        record
    }

    /// Remove `id`. Absent ids are a no-op.
    ///
    /// Removing the local participant also forgets the local id.
    pub fn remove(&mut self, id: &ParticipantId) -> Option<PresenceRecord> {
        let seq = self.index.remove(id)?;
        if self.local.as_ref() == Some(id) {
            self.local = None;
        }
        self.records.remove(&seq)
    }

    /// Set the hand state of an existing record.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotFound` if `id` is not in the store.
    pub fn set_hand_raised(
        &mut self,
        id: &ParticipantId,
        raised: bool,
    ) -> Result<PresenceRecord, SyncError> {
        let record = self.record_mut(id).ok_or_else(|| SyncError::NotFound { id: id.clone() })?;
        record.hand_raised = raised;
        Ok(record.clone())
    }

    /// Look up a record.
    pub fn get(&self, id: &ParticipantId) -> Option<PresenceRecord> {
        self.index.get(id).and_then(|seq| self.records.get(seq)).cloned()
    }

    /// Check whether `id` is in the store.
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.index.contains_key(id)
    }

    /// Snapshot of all records in join order.
    pub fn list_ordered(&self) -> Vec<PresenceRecord> {
        self.records.values().cloned().collect()
    }

    /// Mark `id` as the local participant.
    pub fn set_local(&mut self, id: ParticipantId) {
        self.local = Some(id);
    }

    /// The local participant, if joined.
    pub fn local(&self) -> Option<&ParticipantId> {
        self.local.as_ref()
    }

    /// Number of participants.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nobody is in the store.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Tear down: drop every record and the local id.
    ///
    /// Returns the records that were present, in join order.
    pub fn clear(&mut self) -> Vec<PresenceRecord> {
        self.index.clear();
        self.local = None;
        std::mem::take(&mut self.records).into_values().collect()
    }

    fn record_mut(&mut self, id: &ParticipantId) -> Option<&mut PresenceRecord> {
        let seq = self.index.get(id)?;
        self.records.get_mut(seq)
    }
}
