// Draw data model and the resolution pipeline that turns rooms into messages.

pub mod category;
pub mod links;
pub mod position;
pub mod resolver;

use std::collections::HashMap;

use crate::chat::UserId;

/// One pairing in a round: a venue, the teams debating in it and the panel
/// judging it.
///
/// `team_ids` and `side_names` are aligned index-for-index; the team at
/// index `i` speaks on side `side_names[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Room {
    pub venue_id: String,
    pub team_ids: Vec<String>,
    pub side_names: Vec<String>,
    /// Empty when the draw has no chair allocated yet.
    pub chair_id: String,
    pub panellist_ids: Vec<String>,
    pub trainee_ids: Vec<String>,
}

impl Room {
    /// Chair, then panellists, then trainees, each in draw order. Index 0 is
    /// always the chair slot, even when no chair is allocated.
    pub fn judge_ids(&self) -> Vec<String> {
        let mut ids = Vec::with_capacity(1 + self.panellist_ids.len() + self.trainee_ids.len());
        ids.push(self.chair_id.clone());
        ids.extend(self.panellist_ids.iter().cloned());
        ids.extend(self.trainee_ids.iter().cloned());
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Venue {
    pub id: String,
    pub name: String,
}

/// Build the venue id → display name map used during resolution.
pub fn venue_names(venues: &[Venue]) -> HashMap<String, String> {
    venues
        .iter()
        .map(|v| (v.id.clone(), v.name.clone()))
        .collect()
}

/// A message addressed to a single participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub recipient: UserId,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
