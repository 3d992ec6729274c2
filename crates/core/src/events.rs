use crate::{CardId, PlayerId, Position, PurchaseKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    PlayerCreated {
        player: PlayerId,
        username: String,
    },
    PlayerImported {
        player: PlayerId,
    },
    GoldAccrued {
        player: PlayerId,
        earned: f64,
        balance: f64,
    },
    ShopRefreshed {
        featured: CardId,
    },
    Purchased {
        player: PlayerId,
        item: PurchaseKind,
        price: f64,
        cards: Vec<CardId>,
        gold: f64,
    },
    DeckCreated {
        player: PlayerId,
        name: String,
        cards: usize,
    },
    DungeonStarted {
        player: PlayerId,
        grid_size: usize,
        seed: Option<u64>,
    },
    Moved {
        player: PlayerId,
        position: Position,
        encounter: String,
    },
    FloorReached {
        player: PlayerId,
        floor: u32,
    },
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
