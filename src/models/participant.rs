use serde::{Deserialize, Serialize};

use super::Tip;

/// Column handle of a participant in the tip sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot(pub i64);

/// A player of the tipping game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Forum nick, unique within the league
    pub name: String,

    /// Where this participant's tips are written back
    pub slot: Slot,

    /// Predictions for the current matchday, empty or one per fixture
    #[serde(default)]
    pub tips: Vec<Tip>,
}

impl Participant {
    pub fn new(name: impl Into<String>, slot: Slot) -> Self {
        Self {
            name: name.into(),
            slot,
            tips: Vec::new(),
        }
    }

    /// Case-insensitive comparison against a forum author name
    pub fn is_named(&self, author: &str) -> bool {
        self.name.to_lowercase() == author.to_lowercase()
    }

    /// The tip given for a fixture, if any
    pub fn tip_for(&self, home: &str, away: &str) -> Option<&Tip> {
        self.tips
            .iter()
            .find(|t| t.fixture.home == home && t.fixture.away == away)
    }
}

/// Two participants facing each other on the matchday
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pairing {
    pub first: String,
    pub second: String,
}

impl Pairing {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn involves(&self, name: &str) -> bool {
        self.first == name || self.second == name
    }
}

// Pairings are unordered
impl PartialEq for Pairing {
    fn eq(&self, other: &Self) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }
}

impl Eq for Pairing {}
