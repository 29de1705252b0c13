//! Shared field types for battle log lines

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// One of the two competing sides in a battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    P1,
    P2,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::P1, Side::P2];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "p1" => Some(Side::P1),
            "p2" => Some(Side::P2),
            _ => None,
        }
    }

    /// Side owning a position token such as `p1a` or `p2`.
    ///
    /// The character after the side number must be a slot letter (or
    /// nothing), so `p10` is not read as `p1`.
    pub fn from_position(position: &str) -> Option<Self> {
        let position = position.trim();
        let side = position.get(..2).and_then(Side::parse)?;
        match position[2..].chars().next() {
            None => Some(side),
            Some(c) if c.is_ascii_lowercase() => Some(side),
            Some(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::P1 => "p1",
            Side::P2 => "p2",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Side::P1 => 0,
            Side::P2 => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Side::parse(s).ok_or_else(|| ParseError::InvalidSide(s.to_string()))
    }
}

/// Pokemon identifier in the form "POSITION: NAME" (e.g., "p1a: Pikachu")
#[derive(Debug, Clone, PartialEq)]
pub struct Pokemon {
    /// Side that owns this pokemon
    pub side: Side,
    /// Slot letter (a, b, c for active slots, or None if inactive)
    pub position: Option<char>,
    /// Pokemon's name/nickname
    pub name: String,
}

impl Pokemon {
    /// Parse a pokemon ID string like "p1a: Pikachu" or "p1: Pikachu"
    pub fn parse(s: &str) -> Option<Self> {
        let (pos_part, name) = s.split_once(':')?;
        let side = Side::from_position(pos_part)?;
        let position = pos_part.trim().chars().nth(2);

        Some(Pokemon {
            side,
            position,
            name: name.trim().to_string(),
        })
    }
}

/// Details string (species, level, gender, shiny, tera)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PokemonDetails {
    pub species: String,
    pub level: Option<u8>,
    pub gender: Option<char>,
    pub shiny: bool,
    pub tera_type: Option<String>,
}

impl PokemonDetails {
    /// Parse a details string like "Pikachu, L50, M, shiny" or "Arceus-*"
    ///
    /// The species is everything before the first comma. A level is only
    /// read from a field that is exactly `L` followed by digits.
    pub fn parse(s: &str) -> Self {
        let mut details = PokemonDetails::default();
        let mut parts = s.split(',').map(str::trim);

        if let Some(species) = parts.next() {
            details.species = species.to_string();
        }

        for part in parts {
            if let Some(level_str) = part.strip_prefix('L')
                && !level_str.is_empty()
                && level_str.bytes().all(|b| b.is_ascii_digit())
            {
                details.level = level_str.parse().ok();
            } else if part == "M" {
                details.gender = Some('M');
            } else if part == "F" {
                details.gender = Some('F');
            } else if part == "shiny" {
                details.shiny = true;
            } else if let Some(tera) = part.strip_prefix("tera:") {
                details.tera_type = Some(tera.to_string());
            }
        }

        details
    }
}

/// The three line types that put a pokemon into a battle position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchKind {
    Switch,
    Drag,
    Replace,
}

impl SwitchKind {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "switch" => Some(SwitchKind::Switch),
            "drag" => Some(SwitchKind::Drag),
            "replace" => Some(SwitchKind::Replace),
            _ => None,
        }
    }

    /// Every tag that parses to a [`SwitchKind`]
    pub const TAGS: [&'static str; 3] = ["switch", "drag", "replace"];
}

/// Helper to parse a Side from line fields
pub fn parse_side(parts: &[&str], index: usize) -> Option<Side> {
    parts.get(index).and_then(|s| Side::parse(s.trim()))
}

/// Helper to parse Pokemon from line fields
pub fn parse_pokemon(parts: &[&str], index: usize) -> Option<Pokemon> {
    parts.get(index).and_then(|s| Pokemon::parse(s))
}

/// Helper to parse PokemonDetails from line fields
pub fn parse_details(parts: &[&str], index: usize) -> PokemonDetails {
    parts
        .get(index)
        .map(|s| PokemonDetails::parse(s))
        .unwrap_or_default()
}

/// Non-empty trimmed field, or None
pub fn non_empty(parts: &[&str], index: usize) -> Option<String> {
    parts
        .get(index)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
