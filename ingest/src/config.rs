//! Ingestion settings.
//!
//! Read from an optional TOML file, then from `REPLAYDEX_*` environment
//! variables, which win over the file.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use replaydex_replay::DEFAULT_REPLAY_BASE_URL;
use replaydex_team::{DEFAULT_REVEALED_TRUST_FLOOR, MatchThresholds};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "REPLAYDEX";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Display name of the operator; marks the user's side in each battle
    pub operator_name: Option<String>,
    pub database_path: PathBuf,
    pub replay_base_url: String,
    pub fetch_timeout_secs: u64,
    /// Distinct revealed species needed before a team reveal is trusted
    pub revealed_trust_floor: usize,
    /// Default number of battles a backfill sweep looks at
    pub backfill_limit: usize,
    pub thresholds: MatchThresholds,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            operator_name: None,
            database_path: PathBuf::from("replaydex.sqlite3"),
            replay_base_url: DEFAULT_REPLAY_BASE_URL.to_string(),
            fetch_timeout_secs: 15,
            revealed_trust_floor: DEFAULT_REVEALED_TRUST_FLOOR,
            backfill_limit: 200,
            thresholds: MatchThresholds::default(),
        }
    }
}

impl IngestConfig {
    /// Load settings from `path` (skipped when absent) and the environment.
    pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(15));
        assert_eq!(config.revealed_trust_floor, 4);
        assert_eq!(config.backfill_limit, 200);
        assert_eq!(config.replay_base_url, DEFAULT_REPLAY_BASE_URL);
        assert!(config.operator_name.is_none());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = IngestConfig::load(Path::new("/nonexistent/replaydex.toml")).unwrap();
        assert_eq!(config.backfill_limit, 200);
    }

    #[test]
    fn test_partial_file() {
        let dir = std::env::temp_dir().join(format!("replaydex-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("replaydex.toml");
        std::fs::write(
            &path,
            "operator_name = \"Ash\"\nbackfill_limit = 50\n\n[thresholds.preview]\nmin_overlap = 6\nmin_confidence = 1.0\n",
        )
        .unwrap();

        let config = IngestConfig::load(&path).unwrap();
        assert_eq!(config.operator_name.as_deref(), Some("Ash"));
        assert_eq!(config.backfill_limit, 50);
        assert_eq!(config.fetch_timeout_secs, 15);
        assert_eq!(config.thresholds.preview.min_overlap, 6);
        assert_eq!(
            config.thresholds.corroborated,
            MatchThresholds::default().corroborated
        );

        std::fs::remove_dir_all(&dir).ok();
    }
}
