//! Major battle action line parsers
//!
//! Only the actions that change which pokemon occupies a position are
//! parsed here; moves, damage and the rest stay opaque.

use super::ProtocolLine;
use super::battle::{SwitchKind, parse_details, parse_pokemon};

/// Parse |switch|, |drag| or |replace| with POKEMON|DETAILS|HP STATUS
pub fn parse_switch(parts: &[&str]) -> Option<ProtocolLine> {
    let kind = parts.first().and_then(|tag| SwitchKind::parse(tag))?;
    let pokemon = parse_pokemon(parts, 1)?;
    let details = parse_details(parts, 2);

    Some(ProtocolLine::Switch {
        kind,
        pokemon,
        details,
    })
}

/// Parse |faint|POKEMON
pub fn parse_faint(parts: &[&str]) -> Option<ProtocolLine> {
    parse_pokemon(parts, 1).map(ProtocolLine::Faint)
}
