//! Error type for `replaydex-store`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("battle not found: {0}")]
    BattleNotFound(i64),

    #[error("team version not found: {0}")]
    TeamVersionNotFound(i64),

    /// A stored column held a value no current type can represent.
    #[error("invalid stored value in {column}: {value:?}")]
    InvalidValue { column: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
