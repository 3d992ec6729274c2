//! Dungeon and card-economy engine. Keep this crate free of IO and platform concerns.

pub mod cards;
pub mod catalog;
pub mod collection;
pub mod config;
pub mod dungeon;
pub mod economy;
pub mod encounter;
pub mod error;
pub mod events;
pub mod gacha;
pub mod game;
pub mod player;
pub mod rng;
pub mod snapshot;
pub mod weighted;

pub use cards::*;
pub use catalog::*;
pub use collection::*;
pub use config::*;
pub use dungeon::*;
pub use economy::*;
pub use encounter::*;
pub use error::*;
pub use events::*;
pub use gacha::*;
pub use game::*;
pub use player::*;
pub use rng::*;
pub use snapshot::*;
pub use weighted::*;
