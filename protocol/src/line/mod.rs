//! Tagged line dispatch
//!
//! Each log line is modelled as a [`ProtocolLine`] variant keyed on its type
//! tag. Only the tags that ingestion extracts data from get their own
//! variant; every other tag, and every known tag whose fields are malformed,
//! lands in [`ProtocolLine::Other`].

pub mod battle;
pub mod init;
pub mod major;
pub mod progress;
pub mod showteam;

#[cfg(test)]
mod tests;

use battle::{Pokemon, PokemonDetails, Side, SwitchKind};
use showteam::RevealedEntry;

use crate::tokenize::tokenize;

/// Type tag recorded for lines that carry no tag at all
pub const UNKNOWN_TAG: &str = "unknown";

#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolLine {
    /// `|player|SIDE|USERNAME|AVATAR|RATING`
    Player {
        side: Side,
        username: String,
        avatar: Option<String>,
        rating: Option<u32>,
    },
    /// `|poke|SIDE|DETAILS|ITEM` (team preview)
    Poke {
        side: Side,
        details: PokemonDetails,
        raw_details: String,
    },
    /// `|showteam|SIDE|PACKED TEAM` (open team sheet reveal)
    ShowTeam {
        side: Side,
        entries: Vec<RevealedEntry>,
    },
    /// `|gen|GENNUM`
    Generation(u8),
    /// `|gametype|GAMETYPE`
    GameType(String),
    /// `|tier|FORMATNAME`
    Tier(String),
    /// `|rated|` or `|rated|MESSAGE`
    Rated(Option<String>),
    /// `|turn|NUMBER`
    Turn(u32),
    /// `|t:|TIMESTAMP`
    Timestamp(i64),
    /// `|win|USER`
    Win(String),
    /// `|tie`
    Tie,
    /// `|switch|`, `|drag|` or `|replace|` with `POKEMON|DETAILS|HP STATUS`
    Switch {
        kind: SwitchKind,
        pokemon: Pokemon,
        details: PokemonDetails,
    },
    /// `|faint|POKEMON`
    Faint(Pokemon),
    /// Anything not listed above, including malformed known lines
    Other,
}

/// Type tag of a tokenized line, `unknown` when the line has none
pub fn line_type<'a>(tokens: &[&'a str]) -> &'a str {
    match tokens.first().copied().map(str::trim) {
        Some(tag) if !tag.is_empty() => tag,
        _ => UNKNOWN_TAG,
    }
}

/// Tokenize and classify a single log line
pub fn parse_line(line: &str) -> ProtocolLine {
    parse_tokens(&tokenize(line.trim_end_matches(['\r', '\n'])))
}

/// Classify an already tokenized line
pub fn parse_tokens(tokens: &[&str]) -> ProtocolLine {
    let parsed = match line_type(tokens) {
        "player" => init::parse_player(tokens),
        "poke" => init::parse_poke(tokens),
        "showteam" => showteam::parse_showteam(tokens),
        "gen" => init::parse_generation(tokens),
        "gametype" => init::parse_gametype(tokens),
        "tier" => init::parse_tier(tokens),
        "rated" => init::parse_rated(tokens),
        "turn" => progress::parse_turn(tokens),
        "t:" => progress::parse_timestamp(tokens),
        "win" => progress::parse_win(tokens),
        "tie" => Some(ProtocolLine::Tie),
        "switch" | "drag" | "replace" => major::parse_switch(tokens),
        "faint" => major::parse_faint(tokens),
        _ => None,
    };

    parsed.unwrap_or(ProtocolLine::Other)
}
