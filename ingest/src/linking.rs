//! Team linking on top of the store: auto-link, backfill, user confirmation

use replaydex_protocol::Side;
use replaydex_store::Error as StoreError;
use replaydex_team::{
    Evidence, LinkDecision, MatchThresholds, TeamRoster, best_match, score, select_evidence,
};

use crate::{Ingestor, Result};

/// Result of auto-linking one battle
#[derive(Debug, Clone, PartialEq)]
pub struct AutoLink {
    /// The user side, if the battle has one
    pub side: Option<Side>,
    pub decision: LinkDecision,
    /// Whether a link row was written. False for non-links and when a user
    /// link already occupies the side.
    pub written: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub scanned: usize,
    pub linked: usize,
}

impl Ingestor {
    /// Link the user side of a battle to its best-matching team version.
    ///
    /// Candidates are the team versions registered for the battle's format,
    /// or every version when none is registered for it. `thresholds`
    /// overrides the configured acceptance bars for this call only.
    pub fn auto_link(&mut self, battle_id: i64, thresholds: Option<&MatchThresholds>) -> Result<AutoLink> {
        let thresholds = thresholds.copied().unwrap_or(self.config.thresholds);
        let battle = self
            .store
            .battle(battle_id)?
            .ok_or(StoreError::BattleNotFound(battle_id))?;

        let Some(side) = self.store.user_side(battle_id)? else {
            tracing::debug!(battle_id, "No user side; nothing to link");
            return Ok(AutoLink {
                side: None,
                decision: LinkDecision::no_data(),
                written: false,
            });
        };

        let evidence = self.evidence(battle_id, side)?;
        let candidates = self.candidates(battle.format_id.as_deref())?;

        let Some(decision) = best_match(evidence.as_ref(), &candidates, &thresholds) else {
            let decision = closest_miss(evidence.as_ref(), &candidates, &thresholds);
            tracing::debug!(
                battle_id,
                side = %side,
                candidates = candidates.len(),
                method = %decision.method,
                "No team version qualified"
            );
            return Ok(AutoLink {
                side: Some(side),
                decision,
                written: false,
            });
        };

        let written = self.store.write_auto_link(battle_id, side, &decision)?;
        tracing::info!(
            battle_id,
            side = %side,
            team_version_id = ?decision.team_version_id,
            confidence = decision.confidence,
            method = %decision.method,
            written,
            "Auto-linked battle"
        );

        Ok(AutoLink {
            side: Some(side),
            decision,
            written,
        })
    }

    /// Sweep battles without a user-side link and link those that match
    /// `team_version_id`. Only battles of the version's format are looked
    /// at when it has one. `thresholds` overrides the configured acceptance
    /// bars for this sweep only.
    pub fn backfill(
        &mut self,
        team_version_id: i64,
        limit: Option<usize>,
        thresholds: Option<&MatchThresholds>,
    ) -> Result<BackfillReport> {
        let roster = self
            .store
            .team_version(team_version_id)?
            .ok_or(StoreError::TeamVersionNotFound(team_version_id))?;
        let limit = limit.unwrap_or(self.config.backfill_limit);
        let thresholds = thresholds.copied().unwrap_or(self.config.thresholds);

        let mut report = BackfillReport::default();
        for battle_id in self
            .store
            .battles_missing_user_link(roster.format_id.as_deref(), limit)?
        {
            report.scanned += 1;

            let Some(side) = self.store.user_side(battle_id)? else {
                continue;
            };
            let evidence = self.evidence(battle_id, side)?;
            let decision = score(evidence.as_ref(), &roster, &thresholds);
            if decision.linked && self.store.write_auto_link(battle_id, side, &decision)? {
                report.linked += 1;
            }
        }

        tracing::info!(
            team_version_id,
            scanned = report.scanned,
            linked = report.linked,
            "Backfill finished"
        );
        Ok(report)
    }

    /// Record the user's own answer for a battle side; `None` means the
    /// side was played with no registered team.
    pub fn confirm_link(&mut self, battle_id: i64, side: Side, team_version_id: Option<i64>) -> Result<()> {
        self.store.set_user_link(battle_id, side, team_version_id)?;
        tracing::info!(battle_id, side = %side, team_version_id = ?team_version_id, "User link set");
        Ok(())
    }

    fn evidence(&self, battle_id: i64, side: Side) -> Result<Option<Evidence>> {
        let brought = self.store.brought_species(battle_id, side)?;
        let revealed = self.store.revealed_species(battle_id, side)?;
        let preview = self.store.preview_species(battle_id, side)?;
        Ok(select_evidence(
            &brought,
            &revealed,
            &preview,
            self.config.revealed_trust_floor,
        ))
    }

    /// Team versions for `format_id`, falling back to all of them when the
    /// format has none registered
    fn candidates(&self, format_id: Option<&str>) -> Result<Vec<TeamRoster>> {
        if let Some(format_id) = format_id {
            let filtered = self.store.team_versions(Some(format_id))?;
            if !filtered.is_empty() {
                return Ok(filtered);
            }
        }
        Ok(self.store.team_versions(None)?)
    }
}

/// Best-scoring rejected decision, for reporting why nothing linked
fn closest_miss(
    evidence: Option<&Evidence>,
    candidates: &[TeamRoster],
    thresholds: &MatchThresholds,
) -> LinkDecision {
    if evidence.is_none() {
        return LinkDecision::no_data();
    }

    candidates
        .iter()
        .map(|roster| score(evidence, roster, thresholds))
        .fold(None, |best: Option<LinkDecision>, decision| match best {
            Some(best) if best.confidence >= decision.confidence => Some(best),
            _ => Some(decision),
        })
        .map(|decision| LinkDecision {
            linked: false,
            ..decision
        })
        .unwrap_or_else(LinkDecision::no_data)
}
