//! Battle-to-team links

use replaydex_protocol::Side;
use replaydex_team::LinkDecision;
use rusqlite::{OptionalExtension as _, params};

use crate::{
    BattleStore, Error, Result,
    encode::{decode_side, now},
};

/// Method tag recorded for links the user set by hand
pub const MANUAL_LINK_METHOD: &str = "manual";

/// Who decided a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    Auto,
    User,
}

impl MatchedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchedBy::Auto => "auto",
            MatchedBy::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(MatchedBy::Auto),
            "user" => Some(MatchedBy::User),
            _ => None,
        }
    }
}

/// A stored link for one battle side
#[derive(Debug, Clone, PartialEq)]
pub struct TeamLink {
    pub battle_id: i64,
    pub side: Side,
    /// None records "no team" when set by the user
    pub team_version_id: Option<i64>,
    pub confidence: f64,
    pub method: String,
    pub matched_by: MatchedBy,
    pub matched_at: String,
}

impl BattleStore {
    /// Write an automatic link decision.
    ///
    /// Returns false when the side already carries a user link, which is
    /// left untouched.
    pub fn write_auto_link(&mut self, battle_id: i64, side: Side, decision: &LinkDecision) -> Result<bool> {
        self.require_battle(battle_id)?;
        let changed = self.conn.execute(
            "INSERT INTO battle_team_links
               (battle_id, side, team_version_id, confidence, method, matched_by, matched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'auto', ?6)
             ON CONFLICT (battle_id, side) DO UPDATE SET
               team_version_id = excluded.team_version_id,
               confidence      = excluded.confidence,
               method          = excluded.method,
               matched_by      = 'auto',
               matched_at      = excluded.matched_at
             WHERE battle_team_links.matched_by != 'user'",
            params![
                battle_id,
                side.as_str(),
                decision.team_version_id,
                decision.confidence.clamp(0.0, 1.0),
                decision.method.as_str(),
                now(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Record the user's own answer for a side; `None` means "no team".
    pub fn set_user_link(&mut self, battle_id: i64, side: Side, team_version_id: Option<i64>) -> Result<()> {
        self.require_battle(battle_id)?;
        if let Some(id) = team_version_id {
            self.require_team_version(id)?;
        }

        self.conn.execute(
            "INSERT INTO battle_team_links
               (battle_id, side, team_version_id, confidence, method, matched_by, matched_at)
             VALUES (?1, ?2, ?3, 1.0, ?4, 'user', ?5)
             ON CONFLICT (battle_id, side) DO UPDATE SET
               team_version_id = excluded.team_version_id,
               confidence      = excluded.confidence,
               method          = excluded.method,
               matched_by      = 'user',
               matched_at      = excluded.matched_at",
            params![battle_id, side.as_str(), team_version_id, MANUAL_LINK_METHOD, now()],
        )?;
        Ok(())
    }

    /// Remove a link regardless of who set it. Returns whether one existed.
    pub fn clear_link(&mut self, battle_id: i64, side: Side) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM battle_team_links WHERE battle_id = ?1 AND side = ?2",
            params![battle_id, side.as_str()],
        )?;
        Ok(removed > 0)
    }

    pub fn link(&self, battle_id: i64, side: Side) -> Result<Option<TeamLink>> {
        let row = self
            .conn
            .query_row(
                "SELECT team_version_id, confidence, method, matched_by, matched_at
                 FROM battle_team_links WHERE battle_id = ?1 AND side = ?2",
                params![battle_id, side.as_str()],
                |row| {
                    Ok((
                        row.get::<_, Option<i64>>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((team_version_id, confidence, method, matched_by, matched_at)) = row else {
            return Ok(None);
        };

        let matched_by = MatchedBy::parse(&matched_by).ok_or(Error::InvalidValue {
            column: "matched_by",
            value: matched_by,
        })?;

        Ok(Some(TeamLink {
            battle_id,
            side,
            team_version_id,
            confidence,
            method,
            matched_by,
            matched_at,
        }))
    }

    pub fn links(&self, battle_id: i64) -> Result<Vec<TeamLink>> {
        let mut stmt = self
            .conn
            .prepare("SELECT side FROM battle_team_links WHERE battle_id = ?1 ORDER BY side")?;
        let sides = stmt
            .query_map(params![battle_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut links = Vec::with_capacity(sides.len());
        for side in sides {
            if let Some(link) = self.link(battle_id, decode_side(&side)?)? {
                links.push(link);
            }
        }
        Ok(links)
    }

    /// Battles with a user side that has no link yet, newest first
    pub fn battles_missing_user_link(&self, format_id: Option<&str>, limit: usize) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.id FROM battles b
             WHERE EXISTS (
                     SELECT 1 FROM battle_sides s
                     WHERE s.battle_id = b.id AND s.is_user = 1)
               AND NOT EXISTS (
                     SELECT 1 FROM battle_team_links l
                     JOIN battle_sides s ON s.battle_id = l.battle_id AND s.side = l.side
                     WHERE l.battle_id = b.id AND s.is_user = 1)
               AND (?1 IS NULL OR b.format_id = ?1)
             ORDER BY COALESCE(b.played_at, b.uploaded_at, 0) DESC, b.id DESC
             LIMIT ?2",
        )?;
        let ids = stmt
            .query_map(params![format_id, limit as i64], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }
}
