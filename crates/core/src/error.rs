use crate::{CardId, PlayerId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("invalid move to ({x}, {y})")]
    InvalidMove { x: i32, y: i32 },
    #[error("no active dungeon")]
    NoActiveDungeon,
    #[error("not standing on the exit")]
    NotOnExit,
    #[error("insufficient gold: have {balance:.2}, need {price:.2}")]
    InsufficientFunds { balance: f64, price: f64 },
    #[error("no featured card")]
    NoFeaturedCard,
    #[error("card catalog is empty")]
    EmptyCatalog,
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("username already taken: {0}")]
    DuplicateUsername(String),
    #[error("unknown card {0}")]
    UnknownCard(CardId),
    #[error("card {0} not owned in sufficient quantity")]
    CardNotOwned(CardId),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}
