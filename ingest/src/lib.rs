//! Replay ingestion for replaydex.
//!
//! An [`Ingestor`] owns the [`BattleStore`](replaydex_store::BattleStore)
//! and drives every write path:
//!
//! ```text
//! ReplaySource ─fetch─> ReplayPayload
//!                           │
//!                           ▼
//!              extract_battle + rebuild_battle   (one transaction)
//!                           │
//!                           ▼
//!              derive_brought + replace_brought  (own transaction)
//!                           │
//!                           ▼
//!              auto_link (failures logged, never fatal)
//! ```
//!
//! [`Ingestor::import_batch`] runs the above for several references and
//! groups the results into a battle set.

mod batch;
mod config;
mod error;
mod linking;
mod pipeline;

pub use batch::{BatchItem, BatchReport, ItemOutcome, set_key};
pub use config::{ENV_PREFIX, IngestConfig};
pub use error::{IngestError, Result};
pub use linking::{AutoLink, BackfillReport};
pub use pipeline::{IngestOutcome, Ingestor, RederiveReport};
