//! Battle sets: groups of replays submitted together

use rusqlite::{OptionalExtension as _, params};

use crate::{BattleStore, Result, encode::now};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleSetGame {
    pub battle_id: i64,
    pub replay_id: String,
    pub game_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleSetSummary {
    pub id: i64,
    pub set_key: String,
    pub game_count: u32,
    pub created_at: String,
    pub updated_at: String,
    /// Ordered by game number
    pub games: Vec<BattleSetGame>,
}

impl BattleStore {
    /// Create or refresh the set identified by `set_key`, attaching the
    /// battles in the given order. Game numbers start at 1.
    pub fn attach_battle_set(&mut self, set_key: &str, battle_ids: &[i64]) -> Result<i64> {
        for &id in battle_ids {
            self.require_battle(id)?;
        }

        let at = now();
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO battle_sets (set_key, game_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT (set_key) DO UPDATE SET
               game_count = excluded.game_count,
               updated_at = excluded.updated_at",
            params![set_key, battle_ids.len() as i64, at],
        )?;
        let set_id: i64 = tx.query_row(
            "SELECT id FROM battle_sets WHERE set_key = ?1",
            params![set_key],
            |row| row.get(0),
        )?;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO battle_set_games (set_id, battle_id, game_number)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (set_id, battle_id) DO UPDATE SET
                   game_number = excluded.game_number",
            )?;
            for (i, battle_id) in battle_ids.iter().enumerate() {
                stmt.execute(params![set_id, battle_id, i as i64 + 1])?;
            }
        }

        tx.commit()?;
        tracing::debug!(set_id, set_key, games = battle_ids.len(), "Attached battle set");
        Ok(set_id)
    }

    pub fn battle_set(&self, id: i64) -> Result<Option<BattleSetSummary>> {
        let header = self
            .conn
            .query_row(
                "SELECT set_key, game_count, created_at, updated_at FROM battle_sets WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((set_key, game_count, created_at, updated_at)) = header else {
            return Ok(None);
        };

        Ok(Some(BattleSetSummary {
            id,
            set_key,
            game_count,
            created_at,
            updated_at,
            games: self.set_games(id)?,
        }))
    }

    pub fn battle_set_by_key(&self, set_key: &str) -> Result<Option<BattleSetSummary>> {
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM battle_sets WHERE set_key = ?1",
                params![set_key],
                |row| row.get(0),
            )
            .optional()?;
        match id {
            Some(id) => self.battle_set(id),
            None => Ok(None),
        }
    }

    fn set_games(&self, set_id: i64) -> Result<Vec<BattleSetGame>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT g.battle_id, b.replay_id, g.game_number
             FROM battle_set_games g
             JOIN battles b ON b.id = g.battle_id
             WHERE g.set_id = ?1
             ORDER BY g.game_number, g.battle_id",
        )?;
        let games = stmt
            .query_map(params![set_id], |row| {
                Ok(BattleSetGame {
                    battle_id: row.get(0)?,
                    replay_id: row.get(1)?,
                    game_number: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(games)
    }
}
