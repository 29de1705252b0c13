use replaydex_replay::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("store error: {0}")]
    Store(#[from] replaydex_store::Error),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The payload lacks something ingestion cannot do without
    #[error("replay payload is missing {0}")]
    MissingField(&'static str),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
