//! ExtractedBattle - everything one forward pass over a log yields

use replaydex_protocol::{RevealedEntry, Side, names_match};

/// One log line as stored: its position, the turn/time context current
/// when it was read, its type tag and the untouched text
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventRecord {
    pub index: u32,
    pub turn: u32,
    pub time_marker: Option<i64>,
    pub line_type: String,
    pub raw: String,
}

/// A player declaration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SideRecord {
    pub side: Side,
    pub player_name: String,
    pub avatar: Option<String>,
    pub rating: Option<u32>,
    /// Whether this side's player is the configured operator
    pub is_user: bool,
}

/// A pokemon shown at team preview
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PreviewRecord {
    pub side: Side,
    /// 1-based, per side, in encounter order
    pub slot_index: u32,
    pub species: String,
    pub level: Option<u8>,
    pub gender: Option<char>,
    pub raw_details: String,
}

/// A pokemon from a team reveal
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RevealedRecord {
    pub side: Side,
    pub entry: RevealedEntry,
}

/// Who won, as far as the log tells
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WinnerOutcome {
    /// No `|win|` line
    NoWinner,
    /// A winner was announced but matches neither player
    Unresolved(String),
    /// A winner was announced and matches this side's player
    Side { side: Side, name: String },
}

impl WinnerOutcome {
    pub fn side(&self) -> Option<Side> {
        match self {
            WinnerOutcome::Side { side, .. } => Some(*side),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            WinnerOutcome::NoWinner => None,
            WinnerOutcome::Unresolved(name) | WinnerOutcome::Side { name, .. } => Some(name),
        }
    }
}

/// Result of extracting a full battle log
#[derive(Debug, Clone, Default)]
pub struct ExtractedBattle {
    /// One event per line, in log order
    pub events: Vec<EventRecord>,

    /// At most one record per side
    pub sides: Vec<SideRecord>,

    pub preview: Vec<PreviewRecord>,

    /// At most one record per (side, species)
    pub revealed: Vec<RevealedRecord>,

    // === Battle metadata (first occurrence wins) ===
    pub generation: Option<u8>,
    pub game_type: Option<String>,
    pub tier: Option<String>,

    pub is_rated: bool,

    /// Raw winner name (last `|win|` wins)
    pub winner_name: Option<String>,

    pub tie: bool,

    /// First `|t:|` value seen
    pub started_at: Option<i64>,
}

impl ExtractedBattle {
    /// Get a side's player declaration
    pub fn side(&self, side: Side) -> Option<&SideRecord> {
        self.sides.iter().find(|s| s.side == side)
    }

    /// The side played by the configured operator, if any
    pub fn user_side(&self) -> Option<Side> {
        self.sides.iter().find(|s| s.is_user).map(|s| s.side)
    }

    /// Resolve the announced winner against the declared players.
    ///
    /// Resolution is exact equality of normalized names; anything else is
    /// left [`WinnerOutcome::Unresolved`] rather than guessed.
    pub fn winner(&self) -> WinnerOutcome {
        let Some(name) = &self.winner_name else {
            return WinnerOutcome::NoWinner;
        };

        match self
            .sides
            .iter()
            .find(|s| names_match(&s.player_name, name))
        {
            Some(record) => WinnerOutcome::Side {
                side: record.side,
                name: name.clone(),
            },
            None => WinnerOutcome::Unresolved(name.clone()),
        }
    }
}
