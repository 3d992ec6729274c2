use crate::{CardId, CellType, GameError, MerchantItem, Rarity, WeightedTable};
use serde::{Deserialize, Serialize};

pub const DEFAULT_GRID_SIZE: usize = 10;
pub const MAX_GRID_SIZE: usize = 256;
const MAX_REFRESH_HOURS: i64 = 24 * 365 * 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl IntRange {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyRule {
    pub seconds_per_gold: f64,
    pub starting_gold: f64,
    pub shop_refresh_hours: i64,
}

impl Default for EconomyRule {
    fn default() -> Self {
        Self {
            seconds_per_gold: 6.0,
            starting_gold: 0.0,
            shop_refresh_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopPrices {
    pub featured: f64,
    pub random: f64,
    pub pack: f64,
}

impl Default for ShopPrices {
    fn default() -> Self {
        Self {
            featured: 100.0,
            random: 50.0,
            pack: 150.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopRule {
    pub prices: ShopPrices,
    pub cards_per_pack: u8,
    pub rarity_weights: WeightedTable<Rarity>,
}

impl Default for ShopRule {
    fn default() -> Self {
        Self {
            prices: ShopPrices::default(),
            cards_per_pack: 5,
            rarity_weights: WeightedTable::new([
                (Rarity::Common, 0.60),
                (Rarity::Uncommon, 0.30),
                (Rarity::Rare, 0.08),
                (Rarity::Legendary, 0.02),
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterRule {
    pub monster_power: IntRange,
    pub miniboss_power: IntRange,
    pub miniboss_ability: String,
    pub treasure_gold: IntRange,
    pub trap_damage: IntRange,
    pub merchant_items: Vec<MerchantItem>,
}

impl Default for EncounterRule {
    fn default() -> Self {
        Self {
            monster_power: IntRange::new(2, 8),
            miniboss_power: IntRange::new(8, 12),
            miniboss_ability: "Power Strike".to_string(),
            treasure_gold: IntRange::new(10, 50),
            trap_damage: IntRange::new(1, 3),
            merchant_items: vec![
                MerchantItem::new("Health Potion", 20),
                MerchantItem::new("Power Boost", 30),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonRule {
    pub grid_size: usize,
    /// Tried in order for every empty cell; each weight is an independent probability.
    pub cell_weights: WeightedTable<CellType>,
    pub encounters: EncounterRule,
}

impl Default for DungeonRule {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            cell_weights: WeightedTable::new([
                (CellType::Monster, 0.30),
                (CellType::Treasure, 0.10),
                (CellType::Trap, 0.10),
                (CellType::Merchant, 0.05),
                (CellType::Shrine, 0.05),
                (CellType::Miniboss, 0.02),
                (CellType::Safe, 0.05),
            ]),
            encounters: EncounterRule::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StarterRule {
    pub deck_name: String,
    pub cards: Vec<CardId>,
}

impl Default for StarterRule {
    fn default() -> Self {
        Self {
            deck_name: "Starter Deck".to_string(),
            cards: vec![CardId(1), CardId(2), CardId(3)],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub economy: EconomyRule,
    pub shop: ShopRule,
    pub dungeon: DungeonRule,
    pub starter: StarterRule,
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        let invalid = |message: String| Err(GameError::InvalidConfiguration(message));
        if !(self.economy.seconds_per_gold.is_finite() && self.economy.seconds_per_gold > 0.0) {
            return invalid(format!(
                "seconds_per_gold must be positive, got {}",
                self.economy.seconds_per_gold
            ));
        }
        if self.economy.starting_gold < 0.0 {
            return invalid("starting_gold must not be negative".to_string());
        }
        if !(1..=MAX_REFRESH_HOURS).contains(&self.economy.shop_refresh_hours) {
            return invalid(format!(
                "shop_refresh_hours must be between 1 and {MAX_REFRESH_HOURS}"
            ));
        }
        let prices = &self.shop.prices;
        for (label, price) in [
            ("featured", prices.featured),
            ("random", prices.random),
            ("pack", prices.pack),
        ] {
            if !(price.is_finite() && price >= 0.0) {
                return invalid(format!("{label} price must be a non-negative number"));
            }
        }
        if self.shop.cards_per_pack == 0 {
            return invalid("cards_per_pack must be at least 1".to_string());
        }
        if !self.shop.rarity_weights.has_unit_sum() {
            return invalid(format!(
                "rarity weights must sum to 1.0, got {}",
                self.shop.rarity_weights.total_weight()
            ));
        }
        if !(2..=MAX_GRID_SIZE).contains(&self.dungeon.grid_size) {
            return invalid(format!(
                "grid size must be between 2 and {MAX_GRID_SIZE}, got {}",
                self.dungeon.grid_size
            ));
        }
        if !self.dungeon.cell_weights.has_probability_weights() {
            return invalid("cell weights must be probabilities in [0, 1]".to_string());
        }
        let encounters = &self.dungeon.encounters;
        for (label, range) in [
            ("monster_power", encounters.monster_power),
            ("miniboss_power", encounters.miniboss_power),
            ("treasure_gold", encounters.treasure_gold),
            ("trap_damage", encounters.trap_damage),
        ] {
            if range.min > range.max {
                return invalid(format!("{label} range is inverted"));
            }
        }
        Ok(())
    }
}
