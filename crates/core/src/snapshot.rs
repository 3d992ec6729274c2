use crate::{Catalog, DungeonInstance, GameError, Player};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Canonical export of everything the engine knows about one player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub version: u32,
    pub player: Player,
    #[serde(default)]
    pub dungeon: Option<DungeonInstance>,
}

impl GameSnapshot {
    pub fn validate(&self, catalog: &Catalog) -> Result<(), GameError> {
        let invalid = |message: String| Err(GameError::InvalidSnapshot(message));
        if self.version != SNAPSHOT_VERSION {
            return invalid(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                self.version
            ));
        }
        let player = &self.player;
        if player.username.trim().is_empty() {
            return invalid("username is empty".to_string());
        }
        if !(player.gold.is_finite() && player.gold >= 0.0) {
            return invalid(format!("gold balance {} is not valid", player.gold));
        }
        let mut seen = HashSet::new();
        for entry in player.collection.entries() {
            if !catalog.contains(entry.card_id) {
                return Err(GameError::UnknownCard(entry.card_id));
            }
            if entry.quantity == 0 {
                return invalid(format!("card {} has zero quantity", entry.card_id));
            }
            if !seen.insert(entry.card_id) {
                return invalid(format!("card {} listed twice", entry.card_id));
            }
        }
        for deck in &player.decks {
            if let Some(card_id) = deck.cards.iter().find(|id| !catalog.contains(**id)) {
                return Err(GameError::UnknownCard(*card_id));
            }
            if let Some(card_id) = player.missing_copies(&deck.cards) {
                return Err(GameError::CardNotOwned(card_id));
            }
        }
        Ok(())
    }
}
