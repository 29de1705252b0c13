//! Team rosters and battle-to-team matching.
//!
//! A [`TeamRoster`] is a snapshot of one team version's species list as
//! supplied by the team-import subsystem. The matcher compares a battle's
//! inferred species set ([`Evidence`]) against rosters and decides whether
//! the battle was played with that team.
//!
//! Everything here is pure; reading evidence and writing links is the
//! store's job.

mod matcher;
mod roster;

pub use matcher::{
    DEFAULT_REVEALED_TRUST_FLOOR, Evidence, EvidenceSource, LinkDecision, LinkMethod,
    MatchThresholds, SourceThreshold, best_match, score, select_evidence,
};
pub use roster::TeamRoster;
