use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid replay reference: {0:?}")]
    InvalidReference(String),

    #[error("Replay {0} not found")]
    NotFound(String),

    #[error("Replay {id} request failed with status {status}")]
    Status { id: String, status: u16 },

    #[error("Replay {id} fetch timed out after {timeout:?}")]
    Timeout { id: String, timeout: Duration },

    #[error("Replay request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid replay payload: {0}")]
    Decode(String),
}
