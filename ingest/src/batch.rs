//! Batch import of several replays, grouped into a battle set

use std::collections::HashSet;

use replaydex_replay::{ReplayRef, ReplaySource, fetch_with_timeout};
use sha2::{Digest, Sha256};

use crate::{IngestOutcome, Ingestor, Result};

/// Outcome of one submitted reference
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    Ingested(IngestOutcome),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct BatchItem {
    /// The reference as submitted
    pub reference: String,
    /// Normalized replay id; `None` when the reference was unusable
    pub replay_id: Option<String>,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// One item per distinct reference, in submission order
    pub items: Vec<BatchItem>,
    pub set_id: Option<i64>,
    pub set_key: Option<String>,
}

impl BatchReport {
    pub fn ingested(&self) -> impl Iterator<Item = &IngestOutcome> {
        self.items.iter().filter_map(|item| match &item.outcome {
            ItemOutcome::Ingested(outcome) => Some(outcome),
            ItemOutcome::Failed(_) => None,
        })
    }

    pub fn failed(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Failed(_)))
            .count()
    }
}

/// Identity of a battle set: SHA-256 over the sorted replay ids, one per
/// line. Submission order does not change it.
pub fn set_key<S: AsRef<str>>(replay_ids: &[S]) -> String {
    let mut ids: Vec<&str> = replay_ids.iter().map(AsRef::as_ref).collect();
    ids.sort_unstable();
    hex::encode(Sha256::digest(ids.join("\n").as_bytes()))
}

impl Ingestor {
    /// Fetch and ingest `references` one at a time.
    ///
    /// Duplicate references (after normalization) are dropped, the first
    /// occurrence keeping its position. A failing item is recorded and the
    /// batch moves on. When two or more replays ingest, they are attached
    /// to a battle set numbered in submission order.
    pub async fn import_batch<S, R>(&mut self, source: &S, references: &[R]) -> Result<BatchReport>
    where
        S: ReplaySource + ?Sized,
        R: AsRef<str>,
    {
        let timeout = self.config.fetch_timeout();
        let mut seen = HashSet::new();
        let mut report = BatchReport::default();

        for raw in references {
            let raw = raw.as_ref();
            let Some(reference) = ReplayRef::parse(raw) else {
                tracing::warn!(reference = raw, "Unusable replay reference");
                report.items.push(BatchItem {
                    reference: raw.to_string(),
                    replay_id: None,
                    outcome: ItemOutcome::Failed(format!("invalid replay reference: {raw:?}")),
                });
                continue;
            };

            if !seen.insert(reference.clone()) {
                tracing::debug!(replay_id = %reference, "Skipping duplicate reference");
                continue;
            }

            let outcome = match fetch_with_timeout(source, &reference, timeout).await {
                Ok(payload) => match self.ingest_payload(&payload) {
                    Ok(outcome) => ItemOutcome::Ingested(outcome),
                    Err(e) => {
                        tracing::warn!(replay_id = %reference, error = %e, "Ingestion failed");
                        ItemOutcome::Failed(e.to_string())
                    }
                },
                Err(e) => {
                    tracing::warn!(replay_id = %reference, error = %e, "Fetch failed");
                    ItemOutcome::Failed(e.to_string())
                }
            };

            report.items.push(BatchItem {
                reference: raw.to_string(),
                replay_id: Some(reference.to_string()),
                outcome,
            });
        }

        let ingested: Vec<(i64, String)> = report
            .ingested()
            .map(|o| (o.battle_id, o.replay_id.clone()))
            .collect();

        if ingested.len() >= 2 {
            let key = set_key(&ingested.iter().map(|(_, id)| id.as_str()).collect::<Vec<_>>());
            let battle_ids: Vec<i64> = ingested.iter().map(|(id, _)| *id).collect();
            let set_id = self.store.attach_battle_set(&key, &battle_ids)?;
            report.set_id = Some(set_id);
            report.set_key = Some(key);
        }

        tracing::info!(
            submitted = references.len(),
            ingested = ingested.len(),
            failed = report.failed(),
            set_id = ?report.set_id,
            "Batch import finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_key_ignores_order() {
        assert_eq!(set_key(&["b", "a", "c"]), set_key(&["c", "b", "a"]));
        assert_ne!(set_key(&["a", "b"]), set_key(&["a", "b", "c"]));
    }

    #[test]
    fn test_set_key_digest() {
        // sha256("a\nb")
        let expected = hex::encode(Sha256::digest(b"a\nb"));
        assert_eq!(set_key(&["b", "a"]), expected);
        assert_eq!(expected.len(), 64);
    }
}
