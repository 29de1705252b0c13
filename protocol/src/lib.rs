//! Tokenizer and line classification for Pokemon Showdown battle logs.
//!
//! A battle log is a sequence of `|`-delimited lines. [`tokenize`] splits one
//! line into fields and [`parse_line`] dispatches the fields into a
//! [`ProtocolLine`]. Neither ever fails: lines with an unknown or malformed
//! shape become [`ProtocolLine::Other`] so newer server output never stops
//! ingestion of the rest of a log.

use thiserror::Error;

pub mod line;
pub mod normalize;
pub mod tokenize;

pub use line::battle::{Pokemon, PokemonDetails, Side, SwitchKind};
pub use line::showteam::RevealedEntry;
pub use line::{ProtocolLine, line_type, parse_line, parse_tokens};
pub use normalize::{names_match, normalize_name, normalize_species};
pub use tokenize::tokenize;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid side: {0}")]
    InvalidSide(String),
}
