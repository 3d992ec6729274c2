//! Loading and validation of catalog, rules and saved player state.

pub mod load;
pub mod schema;

pub use load::*;
pub use schema::*;
