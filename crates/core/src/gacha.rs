use crate::{Card, Catalog, Rarity, RngState, ShopPrices, ShopRule, WeightedTable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseKind {
    Featured,
    Random,
    Pack,
}

impl PurchaseKind {
    pub fn price(self, prices: &ShopPrices) -> f64 {
        match self {
            PurchaseKind::Featured => prices.featured,
            PurchaseKind::Random => prices.random,
            PurchaseKind::Pack => prices.pack,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PurchaseKind::Featured => "featured",
            PurchaseKind::Random => "random",
            PurchaseKind::Pack => "pack",
        }
    }
}

impl fmt::Display for PurchaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PurchaseKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "featured" => Ok(PurchaseKind::Featured),
            "random" => Ok(PurchaseKind::Random),
            "pack" => Ok(PurchaseKind::Pack),
            other => Err(format!("unknown item type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub item: PurchaseKind,
    pub price: f64,
    pub cards_received: Vec<Card>,
    pub gold_remaining: f64,
}

/// Picks a rarity tier by weight, then a card uniformly inside it.
/// An unstocked tier yields `None` rather than falling through to another tier.
pub fn draw_by_rarity<'a>(
    catalog: &'a Catalog,
    weights: &WeightedTable<Rarity>,
    rng: &mut RngState,
) -> Option<&'a Card> {
    let rarity = weights.pick(rng)?;
    log::debug!("rarity roll: {}", rarity.label());
    catalog.pick_by_rarity(rarity, rng)
}

/// Like [`draw_by_rarity`], but only tiers the catalog stocks take part in the roll.
pub fn draw_stocked<'a>(
    catalog: &'a Catalog,
    weights: &WeightedTable<Rarity>,
    rng: &mut RngState,
) -> Option<&'a Card> {
    let stocked = weights.filtered(|rarity| catalog.has_rarity(*rarity));
    draw_by_rarity(catalog, &stocked, rng)
}

/// Independent draws for every pack slot; empty tiers leave their slot empty.
pub fn open_pack(catalog: &Catalog, rule: &ShopRule, rng: &mut RngState) -> Vec<Card> {
    (0..rule.cards_per_pack)
        .filter_map(|_| draw_by_rarity(catalog, &rule.rarity_weights, rng).cloned())
        .collect()
}
