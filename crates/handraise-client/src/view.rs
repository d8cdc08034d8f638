//! Render targets.

use handraise_core::{HandIndicator, ParticipantId, ViewIntent};

/// Display surface for presence.
///
/// Receives intents in order. Implementations must tolerate repeats: an
/// upsert for a shown participant refreshes it, a remove for an absent one
/// does nothing.
pub trait PresenceView {
    /// Apply one rendering change.
    fn apply(&mut self, intent: &ViewIntent);

    /// Show a provider failure to the user.
    fn show_error(&mut self, info: &str);
}

/// One displayed participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRow {
    /// Participant shown in this row.
    pub id: ParticipantId,
    /// Heading text.
    pub label: String,
    /// Hand state text.
    pub indicator: HandIndicator,
}

/// In-memory participant list, the headless equivalent of a DOM list with
/// one element per participant.
#[derive(Debug, Default, Clone)]
pub struct ParticipantList {
    rows: Vec<ParticipantRow>,
    errors: Vec<String>,
}

impl ParticipantList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows in display order.
    pub fn rows(&self) -> &[ParticipantRow] {
        &self.rows
    }

    /// Row for one participant.
    pub fn row(&self, id: &ParticipantId) -> Option<&ParticipantRow> {
        self.rows.iter().find(|r| &r.id == id)
    }

    /// Errors shown so far.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Render as `label: indicator` lines.
    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(|r| format!("{}: {}", r.label, r.indicator)).collect()
    }
}

impl PresenceView for ParticipantList {
    fn apply(&mut self, intent: &ViewIntent) {
        match intent {
            ViewIntent::Upsert { id, label, hand_raised } => {
                let indicator = HandIndicator::from(*hand_raised);
                match self.rows.iter_mut().find(|r| &r.id == id) {
                    Some(row) => {
                        row.label.clone_from(label);
                        row.indicator = indicator;
                    },
                    None => self.rows.push(ParticipantRow {
                        id: id.clone(),
                        label: label.clone(),
                        indicator,
                    }),
                }
            },
            ViewIntent::Remove { id } => self.rows.retain(|r| &r.id != id),
        }
    }

    fn show_error(&mut self, info: &str) {
        self.errors.push(info.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(id: &str, label: &str, hand_raised: bool) -> ViewIntent {
        ViewIntent::Upsert { id: ParticipantId::new(id), label: label.to_string(), hand_raised }
    }

    #[test]
    fn upsert_appends_then_refreshes_in_place() {
        let mut list = ParticipantList::new();
        list.apply(&upsert("L", "Local", false));
        list.apply(&upsert("p1", "Bob", false));
        list.apply(&upsert("L", "Local", true));

        assert_eq!(list.lines(), ["Local: Hand Raised", "Bob: Hand Lowered"]);
    }

    #[test]
    fn repeated_intents_are_idempotent() {
        let mut list = ParticipantList::new();
        let intent = upsert("p1", "Bob", true);
        list.apply(&intent);
        list.apply(&intent);

        let remove = ViewIntent::Remove { id: ParticipantId::new("p1") };
        list.apply(&remove);
        list.apply(&remove);

        assert!(list.rows().is_empty());
    }

    #[test]
    fn errors_are_kept() {
        let mut list = ParticipantList::new();
        list.show_error("room expired");
        assert_eq!(list.errors(), ["room expired"]);
    }
}
