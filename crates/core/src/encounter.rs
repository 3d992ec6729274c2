use crate::{CellType, EncounterRule, RngState};
use serde::{Deserialize, Serialize};

pub const LEVEL_COMPLETE_MESSAGE: &str = "Level complete!";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Enemy {
    pub name: String,
    pub power_level: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_ability: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MerchantItem {
    pub name: String,
    pub cost: i64,
}

impl MerchantItem {
    pub fn new(name: impl Into<String>, cost: i64) -> Self {
        Self {
            name: name.into(),
            cost,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ShrineEffect {
    #[serde(rename = "Temporary power boost")]
    TemporaryPowerBoost,
    #[serde(rename = "Heal wounds")]
    HealWounds,
    #[serde(rename = "Reveal nearby cells")]
    RevealNearbyCells,
}

impl ShrineEffect {
    pub const ALL: [ShrineEffect; 3] = [
        ShrineEffect::TemporaryPowerBoost,
        ShrineEffect::HealWounds,
        ShrineEffect::RevealNearbyCells,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShrineEffect::TemporaryPowerBoost => "Temporary power boost",
            ShrineEffect::HealWounds => "Heal wounds",
            ShrineEffect::RevealNearbyCells => "Reveal nearby cells",
        }
    }
}

/// Outcome of landing on a cell. Handed straight back to the caller, never stored.
///
/// `Empty` holds a unit payload and serializes with `"data": null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Encounter {
    Combat { enemy: Enemy },
    Treasure { gold: i64 },
    Trap { damage: i64 },
    Merchant { items: Vec<MerchantItem> },
    Shrine { effect: ShrineEffect },
    Miniboss { enemy: Enemy },
    Exit { message: String },
    Empty(()),
}

impl Encounter {
    pub fn kind(&self) -> &'static str {
        match self {
            Encounter::Combat { .. } => "combat",
            Encounter::Treasure { .. } => "treasure",
            Encounter::Trap { .. } => "trap",
            Encounter::Merchant { .. } => "merchant",
            Encounter::Shrine { .. } => "shrine",
            Encounter::Miniboss { .. } => "miniboss",
            Encounter::Exit { .. } => "exit",
            Encounter::Empty(()) => "empty",
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, Encounter::Exit { .. })
    }
}

/// Maps a cell type to its encounter. Payload values are drawn fresh from `rng`.
pub fn resolve_cell(cell: CellType, rule: &EncounterRule, rng: &mut RngState) -> Encounter {
    match cell {
        CellType::Monster => Encounter::Combat {
            enemy: Enemy {
                name: "Random Monster".to_string(),
                power_level: rng.range_inclusive(rule.monster_power.min, rule.monster_power.max),
                special_ability: None,
            },
        },
        CellType::Treasure => Encounter::Treasure {
            gold: rng.range_inclusive(rule.treasure_gold.min, rule.treasure_gold.max),
        },
        CellType::Trap => Encounter::Trap {
            damage: rng.range_inclusive(rule.trap_damage.min, rule.trap_damage.max),
        },
        CellType::Merchant => Encounter::Merchant {
            items: rule.merchant_items.clone(),
        },
        CellType::Shrine => {
            let effect = rng
                .choose(&ShrineEffect::ALL)
                .copied()
                .unwrap_or(ShrineEffect::HealWounds);
            Encounter::Shrine { effect }
        }
        CellType::Miniboss => Encounter::Miniboss {
            enemy: Enemy {
                name: "Miniboss".to_string(),
                power_level: rng
                    .range_inclusive(rule.miniboss_power.min, rule.miniboss_power.max),
                special_ability: Some(rule.miniboss_ability.clone()),
            },
        },
        CellType::Exit => Encounter::Exit {
            message: LEVEL_COMPLETE_MESSAGE.to_string(),
        },
        CellType::Empty | CellType::Safe => Encounter::Empty(()),
    }
}
