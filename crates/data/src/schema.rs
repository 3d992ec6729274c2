use serde::{Deserialize, Serialize};

pub use delvecard_core::{
    Card, CardId, CellType, DungeonRule, EconomyRule, EncounterRule, GameConfig, GameSnapshot,
    Rarity, ShopPrices, ShopRule, StarterRule,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub cards: Vec<Card>,
}
