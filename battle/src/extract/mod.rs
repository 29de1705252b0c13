//! Event extraction from battle logs

mod record;
mod scan;

pub use record::{
    EventRecord, ExtractedBattle, PreviewRecord, RevealedRecord, SideRecord, WinnerOutcome,
};
pub use scan::{Cursor, SlotCounters, extract_battle};
