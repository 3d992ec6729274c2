use crate::{Card, CardId, GameError, Rarity, RngState};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Shared, read-only set of cards the economy draws from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    cards: Vec<Card>,
}

impl Catalog {
    pub fn new(cards: Vec<Card>) -> Result<Self, GameError> {
        let mut ids = HashSet::new();
        for card in &cards {
            if !ids.insert(card.id) {
                return Err(GameError::InvalidConfiguration(format!(
                    "duplicate card id {}",
                    card.id
                )));
            }
        }
        Ok(Self { cards })
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn contains(&self, id: CardId) -> bool {
        self.card(id).is_some()
    }

    pub fn has_rarity(&self, rarity: Rarity) -> bool {
        self.cards.iter().any(|card| card.rarity == rarity)
    }

    pub fn pick_uniform<'a>(&'a self, rng: &mut RngState) -> Option<&'a Card> {
        rng.choose(&self.cards)
    }

    pub fn pick_by_rarity<'a>(&'a self, rarity: Rarity, rng: &mut RngState) -> Option<&'a Card> {
        let indices: Vec<usize> = self
            .cards
            .iter()
            .enumerate()
            .filter(|(_, card)| card.rarity == rarity)
            .map(|(idx, _)| idx)
            .collect();
        rng.pick_index(indices.len())
            .and_then(|slot| indices.get(slot))
            .map(|&idx| &self.cards[idx])
    }
}
