//! SQLite store for ingested battles.
//!
//! One [`BattleStore`] owns one connection and is the single writer. Every
//! multi-row mutation runs in its own transaction, so a failure leaves the
//! database as it was before the call.

mod battles;
mod brought;
mod encode;
mod links;
mod schema;
mod sets;
mod store;
mod teams;

pub mod error;

pub use battles::{NewBattle, StoredBattle};
pub use brought::StoredBrought;
pub use error::{Error, Result};
pub use links::{MANUAL_LINK_METHOD, MatchedBy, TeamLink};
pub use sets::{BattleSetGame, BattleSetSummary};
pub use store::BattleStore;
pub use teams::NewTeamVersion;

#[cfg(test)]
mod tests;
