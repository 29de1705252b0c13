//! Encoding helpers between domain types and SQLite column values.
//!
//! Timestamps written by the store are RFC 3339 strings with fixed
//! microsecond precision so they sort lexically. Timestamps that come from
//! the replay source stay as unix seconds.

use chrono::{DateTime, SecondsFormat, Utc};
use replaydex_protocol::Side;

use crate::{Error, Result};

pub fn encode_dt(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now() -> String {
    encode_dt(Utc::now())
}

pub fn decode_side(s: &str) -> Result<Side> {
    Side::parse(s).ok_or_else(|| Error::InvalidValue {
        column: "side",
        value: s.to_string(),
    })
}

pub fn decode_gender(s: Option<String>) -> Option<char> {
    s.and_then(|s| s.chars().next())
}

pub fn encode_gender(gender: Option<char>) -> Option<String> {
    gender.map(String::from)
}
