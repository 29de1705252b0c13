//! Team reveal (`|showteam|`) parsing
//!
//! The reveal carries a packed team: entries separated by `]`, each entry a
//! `|`-delimited positional record:
//!
//! ```text
//! SPECIES|NICKNAME|ITEM|ABILITY|MOVES|NATURE|EVS|GENDER|IVS|SHINY|LEVEL|MISC
//! ```
//!
//! `MISC` is itself comma-separated and ends with the tera type.

use serde::{Deserialize, Serialize};

use super::ProtocolLine;
use super::battle::parse_side;

const SPECIES: usize = 0;
const NICKNAME: usize = 1;
const ITEM: usize = 2;
const ABILITY: usize = 3;
const MOVES: usize = 4;
const GENDER: usize = 7;
const SHINY: usize = 9;
const LEVEL: usize = 10;
const MISC: usize = 11;

/// One pokemon from a team reveal
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RevealedEntry {
    pub species: String,
    pub nickname: Option<String>,
    pub item: Option<String>,
    pub ability: Option<String>,
    pub moves: Vec<String>,
    pub gender: Option<String>,
    pub level: Option<u8>,
    pub shiny: bool,
    pub tera_type: Option<String>,
}

impl RevealedEntry {
    /// Parse a single packed entry. Returns None when the species is empty.
    pub fn parse(entry: &str) -> Option<Self> {
        let fields: Vec<&str> = entry.split('|').collect();
        let field = |index: usize| {
            fields
                .get(index)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let species = field(SPECIES)?;

        let moves = field(MOVES)
            .map(|moves| {
                moves
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        // Only the part after the last comma is the tera type; a tag with
        // no comma carries none.
        let tera_type = field(MISC)
            .and_then(|misc| misc.rsplit_once(',').map(|(_, tera)| tera.trim().to_string()))
            .filter(|tera| !tera.is_empty());

        Some(RevealedEntry {
            species,
            nickname: field(NICKNAME),
            item: field(ITEM),
            ability: field(ABILITY),
            moves,
            gender: field(GENDER),
            level: field(LEVEL).and_then(|level| level.parse().ok()),
            shiny: field(SHINY).is_some_and(|s| s == "S"),
            tera_type,
        })
    }
}

/// Split a packed team blob into its entries, skipping empty ones
pub fn parse_packed_team(blob: &str) -> Vec<RevealedEntry> {
    blob.split(']').filter_map(RevealedEntry::parse).collect()
}

/// Parse |showteam|SIDE|PACKED TEAM
pub fn parse_showteam(parts: &[&str]) -> Option<ProtocolLine> {
    let side = parse_side(parts, 1)?;

    // The packed team contains `|` itself, so rejoin everything after the side
    if parts.len() < 3 {
        return None;
    }
    let blob = parts[2..].join("|");

    Some(ProtocolLine::ShowTeam {
        side,
        entries: parse_packed_team(&blob),
    })
}
