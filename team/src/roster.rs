//! Team roster snapshot

use std::collections::BTreeSet;

use replaydex_protocol::normalize_species;
use serde::{Deserialize, Serialize};

/// Ordered species list of one team version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub team_version_id: i64,
    pub team_name: String,
    pub format_id: Option<String>,
    pub species: Vec<String>,
}

impl TeamRoster {
    /// Normalized, de-duplicated species set; blank names are dropped
    pub fn species_set(&self) -> BTreeSet<String> {
        self.species
            .iter()
            .map(|s| normalize_species(s))
            .filter(|s| !s.is_empty())
            .collect()
    }
}
