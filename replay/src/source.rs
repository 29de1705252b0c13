//! Replay sources

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::{FetchError, ReplayPayload, ReplayRef};

pub const DEFAULT_REPLAY_BASE_URL: &str = "https://replay.pokemonshowdown.com";

/// Anything that can hand over a replay payload by id.
///
/// Fetch failures are typed and never retried here; callers decide.
#[async_trait]
pub trait ReplaySource: Send + Sync {
    async fn fetch(&self, reference: &ReplayRef) -> Result<ReplayPayload, FetchError>;
}

/// Fetch with an upper bound on wall time, whatever the source does
pub async fn fetch_with_timeout<S: ReplaySource + ?Sized>(
    source: &S,
    reference: &ReplayRef,
    timeout: Duration,
) -> Result<ReplayPayload, FetchError> {
    tokio::time::timeout(timeout, source.fetch(reference))
        .await
        .map_err(|_| FetchError::Timeout {
            id: reference.to_string(),
            timeout,
        })?
}

/// Fetches `{base_url}/{id}.json` from the public replay server
#[derive(Debug, Clone)]
pub struct ShowdownReplaySource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ShowdownReplaySource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, reference: &ReplayRef) -> String {
        format!("{}/{}.json", self.base_url, reference)
    }
}

#[async_trait]
impl ReplaySource for ShowdownReplaySource {
    async fn fetch(&self, reference: &ReplayRef) -> Result<ReplayPayload, FetchError> {
        let url = self.url(reference);
        tracing::debug!(replay_id = %reference, url = %url, "Fetching replay");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    id: reference.to_string(),
                    timeout: self.timeout,
                }
            } else {
                FetchError::Request(e)
            }
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound(reference.to_string())),
            status if !status.is_success() => {
                return Err(FetchError::Status {
                    id: reference.to_string(),
                    status: status.as_u16(),
                });
            }
            _ => {}
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let mut payload = ReplayPayload::from_json(body)?;
        if payload.id.is_empty() {
            payload.id = reference.to_string();
        }
        Ok(payload)
    }
}
