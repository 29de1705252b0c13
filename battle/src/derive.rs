//! Brought-pokemon derivation from committed events
//!
//! Switch-family lines name a battle position and a details string, not a
//! stable identity. This pass collapses them into one fact per species used
//! on each side.

use std::collections::HashMap;

use replaydex_protocol::{ProtocolLine, Side, SwitchKind, normalize_species, parse_line};

use crate::extract::EventRecord;

/// Line types the derivation reads; the store only needs to load these
pub const DERIVATION_LINE_TYPES: [&str; 4] = [
    SwitchKind::TAGS[0],
    SwitchKind::TAGS[1],
    SwitchKind::TAGS[2],
    "faint",
];

/// "This species was sent into play on this side"
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BroughtFact {
    pub side: Side,
    /// Species text as written by the earliest switch that introduced it
    pub species: String,
    /// Index of that earliest switch event
    pub first_event_index: u32,
    /// Sent out before the first turn began
    pub is_lead: bool,
    /// Fainted at some point after being sent out
    pub fainted: bool,
}

/// Derive brought pokemon from an event sequence.
///
/// Only switch-family and faint events are considered; everything else is
/// skipped. Events with an unresolvable side or an empty species are
/// discarded. Output is ordered by first appearance, so two runs over the
/// same events are identical.
pub fn derive_brought(events: &[EventRecord]) -> Vec<BroughtFact> {
    let mut ordered: Vec<&EventRecord> = events
        .iter()
        .filter(|e| DERIVATION_LINE_TYPES.contains(&e.line_type.as_str()))
        .collect();
    ordered.sort_by_key(|e| e.index);

    let mut facts: Vec<BroughtFact> = Vec::new();
    let mut groups: HashMap<(Side, String), usize> = HashMap::new();
    // Who currently stands in each position, and who answers to each nickname
    let mut occupants: HashMap<(Side, Option<char>), usize> = HashMap::new();
    let mut nicknames: HashMap<(Side, String), usize> = HashMap::new();

    for event in ordered {
        match parse_line(&event.raw) {
            ProtocolLine::Switch {
                pokemon, details, ..
            } => {
                let species = details.species.trim();
                if species.is_empty() {
                    continue;
                }

                let key = (pokemon.side, normalize_species(species));
                let fact = *groups.entry(key).or_insert_with(|| {
                    facts.push(BroughtFact {
                        side: pokemon.side,
                        species: species.to_string(),
                        first_event_index: event.index,
                        is_lead: event.turn == 0,
                        fainted: false,
                    });
                    facts.len() - 1
                });

                occupants.insert((pokemon.side, pokemon.position), fact);
                nicknames.insert((pokemon.side, pokemon.name.to_lowercase()), fact);
            }

            ProtocolLine::Faint(pokemon) => {
                let fact = occupants
                    .get(&(pokemon.side, pokemon.position))
                    .or_else(|| nicknames.get(&(pokemon.side, pokemon.name.to_lowercase())));
                if let Some(&fact) = fact {
                    facts[fact].fainted = true;
                }
            }

            _ => {}
        }
    }

    facts
}
