//! Battle initialization line parsers
//!
//! These lines are sent at the start of a battle to set up the game state.
//! Field indices are relative to the tokenized line, so index 0 is the tag.

use super::ProtocolLine;
use super::battle::{non_empty, parse_details, parse_side};

/// Parse |player|SIDE|USERNAME|AVATAR|RATING
pub fn parse_player(parts: &[&str]) -> Option<ProtocolLine> {
    let side = parse_side(parts, 1)?;
    let username = parts.get(2).map(|s| s.trim()).unwrap_or("").to_string();
    let avatar = non_empty(parts, 3);
    let rating = parts.get(4).and_then(|s| s.trim().parse().ok());

    Some(ProtocolLine::Player {
        side,
        username,
        avatar,
        rating,
    })
}

/// Parse |poke|SIDE|DETAILS|ITEM
pub fn parse_poke(parts: &[&str]) -> Option<ProtocolLine> {
    let side = parse_side(parts, 1)?;
    let raw_details = parts.get(2).map(|s| s.trim()).unwrap_or("").to_string();
    let details = parse_details(parts, 2);

    if details.species.is_empty() {
        return None;
    }

    Some(ProtocolLine::Poke {
        side,
        details,
        raw_details,
    })
}

/// Parse |gen|GENNUM
pub fn parse_generation(parts: &[&str]) -> Option<ProtocolLine> {
    let generation = parts.get(1).and_then(|s| s.trim().parse().ok())?;
    Some(ProtocolLine::Generation(generation))
}

/// Parse |gametype|GAMETYPE
pub fn parse_gametype(parts: &[&str]) -> Option<ProtocolLine> {
    non_empty(parts, 1).map(ProtocolLine::GameType)
}

/// Parse |tier|FORMATNAME
pub fn parse_tier(parts: &[&str]) -> Option<ProtocolLine> {
    non_empty(parts, 1).map(ProtocolLine::Tier)
}

/// Parse |rated| or |rated|MESSAGE
pub fn parse_rated(parts: &[&str]) -> Option<ProtocolLine> {
    Some(ProtocolLine::Rated(non_empty(parts, 1)))
}
