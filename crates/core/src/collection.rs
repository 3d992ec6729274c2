use crate::CardId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionEntry {
    pub card_id: CardId,
    pub quantity: u32,
}

/// Owned-card multiset. Entries keep insertion order and are never removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Collection {
    entries: Vec<CollectionEntry>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CollectionEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds one copy, creating the entry on first acquisition. Returns the new quantity.
    pub fn add_card(&mut self, card_id: CardId) -> u32 {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.card_id == card_id) {
            entry.quantity = entry.quantity.saturating_add(1);
            return entry.quantity;
        }
        self.entries.push(CollectionEntry {
            card_id,
            quantity: 1,
        });
        1
    }

    pub fn add_cards(&mut self, card_ids: impl IntoIterator<Item = CardId>) {
        for card_id in card_ids {
            self.add_card(card_id);
        }
    }

    pub fn quantity_of(&self, card_id: CardId) -> u32 {
        self.entries
            .iter()
            .find(|entry| entry.card_id == card_id)
            .map_or(0, |entry| entry.quantity)
    }

    pub fn total_cards(&self) -> u64 {
        self.entries.iter().map(|entry| u64::from(entry.quantity)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_add_increments_quantity() {
        let mut collection = Collection::new();
        for _ in 0..3 {
            collection.add_card(CardId(7));
        }
        assert_eq!(
            collection.entries(),
            &[CollectionEntry {
                card_id: CardId(7),
                quantity: 3
            }]
        );
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut collection = Collection::new();
        collection.add_cards([CardId(5), CardId(2), CardId(5), CardId(9)]);
        let ids: Vec<u32> = collection.entries().iter().map(|e| e.card_id.0).collect();
        assert_eq!(ids, vec![5, 2, 9]);
        assert_eq!(collection.quantity_of(CardId(5)), 2);
        assert_eq!(collection.quantity_of(CardId(3)), 0);
        assert_eq!(collection.total_cards(), 4);
    }
}
