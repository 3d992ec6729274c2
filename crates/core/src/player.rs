use crate::{CardId, Collection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deck {
    pub name: String,
    pub cards: Vec<CardId>,
    #[serde(default)]
    pub is_starter: bool,
}

impl Deck {
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub gold: f64,
    pub last_gold_update: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub collection: Collection,
    #[serde(default)]
    pub decks: Vec<Deck>,
}

impl Player {
    pub fn new(id: PlayerId, username: impl Into<String>, gold: f64, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: username.into(),
            gold,
            last_gold_update: now,
            created_at: now,
            collection: Collection::new(),
            decks: Vec::new(),
        }
    }

    /// First card the list uses more copies of than the collection holds.
    pub(crate) fn missing_copies(&self, cards: &[CardId]) -> Option<CardId> {
        cards.iter().copied().find(|card_id| {
            let wanted = cards.iter().filter(|other| *other == card_id).count();
            wanted > self.collection.quantity_of(*card_id) as usize
        })
    }
}
