//! Single-replay ingestion and re-derivation

use replaydex_battle::{derive_brought, extract_battle};
use replaydex_replay::{ReplayPayload, ReplayRef};
use replaydex_store::{BattleStore, NewBattle};

use crate::{IngestConfig, IngestError, Result, linking::AutoLink};

/// Owns the store and runs every write path against it
pub struct Ingestor {
    pub(crate) store: BattleStore,
    pub(crate) config: IngestConfig,
}

/// What one ingestion produced
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub battle_id: i64,
    pub replay_id: String,
    pub events: usize,
    pub brought: usize,
    /// Auto-link result; `None` when linking failed
    pub link: Option<AutoLink>,
    /// Why linking failed. Ingestion itself still succeeded.
    pub link_error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RederiveReport {
    pub battles: usize,
    pub facts: usize,
    pub failed: usize,
}

impl Ingestor {
    pub fn new(store: BattleStore, config: IngestConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &BattleStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut BattleStore {
        &mut self.store
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest one replay payload.
    ///
    /// The payload id is normalized the same way batch references are, so
    /// a URL and a bare id of either case land on the same battle.
    /// Header and events are written in one transaction, then brought
    /// pokemon are derived from the committed events, then the user side is
    /// auto-linked. A linking failure is logged and reported in the outcome
    /// but does not fail the ingestion.
    pub fn ingest_payload(&mut self, payload: &ReplayPayload) -> Result<IngestOutcome> {
        let Some(reference) = ReplayRef::parse(&payload.id) else {
            return Err(IngestError::MissingField("replay id"));
        };
        let replay_id = reference.to_string();
        if payload.log.trim().is_empty() {
            return Err(IngestError::MissingField("log"));
        }

        let extracted = extract_battle(&payload.log, self.config.operator_name.as_deref());
        let winner = extracted.winner();

        let battle = NewBattle {
            replay_id: replay_id.clone(),
            format_id: non_empty(payload.format_id.as_deref()),
            format_name: non_empty(payload.format_name.as_deref()).or_else(|| extracted.tier.clone()),
            generation: extracted.generation,
            game_type: extracted.game_type.clone(),
            is_rated: extracted.is_rated,
            rating: payload.rating,
            views: payload.views,
            is_private: payload.is_private,
            played_at: extracted.started_at.or(payload.upload_time),
            uploaded_at: payload.upload_time,
            winner_side: winner.side(),
            winner_name: winner.name().map(str::to_string),
            is_tie: extracted.tie,
            log_text: payload.log.clone(),
            metadata_json: payload.metadata.to_string(),
        };

        let battle_id = self.store.rebuild_battle(&battle, &extracted)?;
        let brought = self.rederive(battle_id)?;

        let (link, link_error) = match self.auto_link(battle_id, None) {
            Ok(link) => (Some(link), None),
            Err(e) => {
                tracing::warn!(battle_id, replay_id = %replay_id, error = %e, "Auto-link failed");
                (None, Some(e.to_string()))
            }
        };

        tracing::info!(
            battle_id,
            replay_id = %replay_id,
            events = extracted.events.len(),
            brought,
            user_side = ?extracted.user_side(),
            linked = link.as_ref().is_some_and(|l| l.decision.linked),
            "Ingested replay"
        );

        Ok(IngestOutcome {
            battle_id,
            replay_id,
            events: extracted.events.len(),
            brought,
            link,
            link_error,
        })
    }

    /// Recompute brought pokemon for one battle from its stored events
    pub fn rederive(&mut self, battle_id: i64) -> Result<usize> {
        let events = self.store.derivation_events(battle_id)?;
        let facts = derive_brought(&events);
        Ok(self.store.replace_brought_pokemon(battle_id, &facts)?)
    }

    /// Recompute brought pokemon for every stored battle.
    ///
    /// A battle that fails is logged and counted; the sweep carries on.
    pub fn rederive_all(&mut self) -> Result<RederiveReport> {
        let mut report = RederiveReport::default();

        for battle_id in self.store.battle_ids()? {
            match self.rederive(battle_id) {
                Ok(facts) => {
                    report.battles += 1;
                    report.facts += facts;
                }
                Err(e) => {
                    tracing::warn!(battle_id, error = %e, "Re-derivation failed");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            battles = report.battles,
            facts = report.facts,
            failed = report.failed,
            "Re-derived brought pokemon"
        );
        Ok(report)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
