//! Replay references, payloads and the replay source collaborator.
//!
//! Ingestion never talks to the network itself; it asks a [`ReplaySource`]
//! for a [`ReplayPayload`]. [`ShowdownReplaySource`] is the production
//! implementation backed by the public replay server's JSON endpoint.

mod error;
mod payload;
mod reference;
mod source;

pub use error::FetchError;
pub use payload::ReplayPayload;
pub use reference::ReplayRef;
pub use source::{DEFAULT_REPLAY_BASE_URL, ReplaySource, ShowdownReplaySource, fetch_with_timeout};
