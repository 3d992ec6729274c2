use crate::{Card, CardId, Catalog, GameError, RngState, ShopPrices};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accrual {
    pub balance: f64,
    pub last_update: DateTime<Utc>,
    pub earned: f64,
}

/// Gold earned between `last_update` and `now`, one unit per `seconds_per_gold`.
///
/// A clock that reads earlier than the last update earns nothing and keeps the
/// later timestamp, so balances never move backwards.
pub fn accrue(
    balance: f64,
    last_update: DateTime<Utc>,
    now: DateTime<Utc>,
    seconds_per_gold: f64,
) -> Accrual {
    let elapsed = (now - last_update)
        .to_std()
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0);
    let earned = if seconds_per_gold > 0.0 {
        elapsed / seconds_per_gold
    } else {
        0.0
    };
    Accrual {
        balance: balance + earned,
        last_update: last_update.max(now),
        earned,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopState {
    pub featured: Option<CardId>,
    pub last_refresh: Option<DateTime<Utc>>,
}

impl ShopState {
    pub fn should_refresh(&self, now: DateTime<Utc>, refresh_hours: i64) -> bool {
        match (self.featured, self.last_refresh) {
            (Some(_), Some(last)) => now - last > Duration::hours(refresh_hours),
            _ => true,
        }
    }

    /// Features a uniformly random catalog card and restarts the refresh clock.
    pub fn refresh<'a>(
        &mut self,
        catalog: &'a Catalog,
        rng: &mut RngState,
        now: DateTime<Utc>,
    ) -> Result<&'a Card, GameError> {
        let card = catalog.pick_uniform(rng).ok_or(GameError::EmptyCatalog)?;
        self.featured = Some(card.id);
        self.last_refresh = Some(now);
        log::info!("shop refreshed, featuring {} ({})", card.name, card.id);
        Ok(card)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopView {
    pub featured_card: Option<Card>,
    pub prices: ShopPrices,
    pub last_refresh: Option<DateTime<Utc>>,
}
