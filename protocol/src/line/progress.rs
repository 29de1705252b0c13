//! Battle progress line parsers
//!
//! These lines track the flow and outcome of a battle.

use super::ProtocolLine;
use super::battle::non_empty;

/// Parse |turn|NUMBER
pub fn parse_turn(parts: &[&str]) -> Option<ProtocolLine> {
    let turn = parts.get(1).and_then(|s| s.trim().parse().ok())?;
    Some(ProtocolLine::Turn(turn))
}

/// Parse |t:|TIMESTAMP
pub fn parse_timestamp(parts: &[&str]) -> Option<ProtocolLine> {
    let timestamp = parts.get(1).and_then(|s| s.trim().parse().ok())?;
    Some(ProtocolLine::Timestamp(timestamp))
}

/// Parse |win|USER
pub fn parse_win(parts: &[&str]) -> Option<ProtocolLine> {
    non_empty(parts, 1).map(ProtocolLine::Win)
}
