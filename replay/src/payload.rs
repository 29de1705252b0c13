//! Replay payload as served by the replay server's JSON endpoint

use serde_json::Value;

use crate::FetchError;

/// A fetched replay: transcript plus header metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayPayload {
    pub id: String,
    pub format_id: Option<String>,
    pub format_name: Option<String>,
    /// Full battle log, one protocol line per line
    pub log: String,
    /// Unix seconds
    pub upload_time: Option<i64>,
    pub views: Option<i64>,
    pub rating: Option<i64>,
    pub is_private: bool,
    /// Every header field except the log, as received
    pub metadata: Value,
}

impl ReplayPayload {
    /// A payload with only an id and a log; the rest is left empty
    pub fn from_log(id: impl Into<String>, log: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            format_id: None,
            format_name: None,
            log: log.into(),
            upload_time: None,
            views: None,
            rating: None,
            is_private: false,
            metadata: Value::Object(Default::default()),
        }
    }

    /// Build a payload from the replay JSON.
    ///
    /// The server is not strict about types (`private` is sometimes `0`/`1`,
    /// sometimes a bool; numbers sometimes arrive as strings), so fields are
    /// read leniently. Missing fields stay empty; whether they are required
    /// is decided by ingestion.
    pub fn from_json(value: Value) -> Result<Self, FetchError> {
        let Value::Object(mut object) = value else {
            return Err(FetchError::Decode("expected a JSON object".to_string()));
        };

        let log = match object.remove("log") {
            Some(Value::String(log)) => log,
            Some(Value::Null) | None => String::new(),
            Some(other) => {
                return Err(FetchError::Decode(format!("log is not a string: {other}")));
            }
        };

        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let int = |key: &str| object.get(key).and_then(lenient_i64);

        let is_private = match object.get("private") {
            Some(Value::Bool(b)) => *b,
            Some(other) => lenient_i64(other).is_some_and(|n| n != 0),
            None => false,
        };

        Ok(Self {
            id: text("id").unwrap_or_default(),
            format_id: text("formatid"),
            format_name: text("format"),
            upload_time: int("uploadtime"),
            views: int("views"),
            rating: int("rating"),
            is_private,
            log,
            metadata: Value::Object(object),
        })
    }
}

fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
