//! Event extraction and brought-pokemon derivation for Pokemon Showdown logs.
//!
//! # Overview
//!
//! `replaydex-battle` sits between `replaydex-protocol` (line grammar) and the
//! store:
//!
//! ```text
//! replaydex-protocol (tokenize + classify lines)
//!        │
//!        ▼
//! replaydex-battle (extract events, derive brought pokemon) ← THIS CRATE
//!        │
//!        ├─> replaydex-store (persists both)
//!        └─> replaydex-ingest (orchestrates)
//! ```
//!
//! Both halves are pure functions. [`extract_battle`] runs once per ingestion
//! over the raw log. [`derive_brought`] runs over the *committed* event
//! sequence, so it can be repeated at any time to rebuild brought-pokemon
//! facts without the original log.
//!
//! # Example Usage
//!
//! ```ignore
//! use replaydex_battle::{derive_brought, extract_battle};
//!
//! let battle = extract_battle(&log, Some("my name"));
//! println!("{} events, user side {:?}", battle.events.len(), battle.user_side());
//!
//! for fact in derive_brought(&battle.events) {
//!     println!("{} brought {} (lead: {})", fact.side, fact.species, fact.is_lead);
//! }
//! ```

pub mod derive;
pub mod extract;

pub use derive::{BroughtFact, DERIVATION_LINE_TYPES, derive_brought};
pub use extract::{
    Cursor, EventRecord, ExtractedBattle, PreviewRecord, RevealedRecord, SideRecord,
    SlotCounters, WinnerOutcome, extract_battle,
};

// Re-export commonly used protocol types
pub use replaydex_protocol::{RevealedEntry, Side};
