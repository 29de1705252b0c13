//! Pokemon instances and brought-pokemon facts

use std::collections::HashMap;

use replaydex_battle::BroughtFact;
use replaydex_protocol::{Side, normalize_species};
use rusqlite::{OptionalExtension as _, Transaction, params};

use crate::{BattleStore, Result, encode::decode_side};

/// A brought-pokemon row joined with its instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBrought {
    pub instance_id: i64,
    pub side: Side,
    pub species: String,
    pub is_lead: bool,
    pub fainted: bool,
}

impl BattleStore {
    /// Replace every brought-pokemon row of a battle with `facts`.
    ///
    /// Runs in one transaction: prior rows are deleted, each fact's instance
    /// is looked up by normalized species or created, and the fact is
    /// upserted. Flags merge by max, both between facts landing on the same
    /// instance and against the flags the instance carried before the call.
    /// Instances are only dropped when the battle is re-ingested.
    pub fn replace_brought_pokemon(&mut self, battle_id: i64, facts: &[BroughtFact]) -> Result<usize> {
        self.require_battle(battle_id)?;
        let tx = self.conn.transaction()?;

        let prior = prior_flags(&tx, battle_id)?;
        tx.execute(
            "DELETE FROM battle_brought_pokemon WHERE battle_id = ?1",
            params![battle_id],
        )?;

        for fact in facts {
            let instance_id = resolve_instance(&tx, battle_id, fact.side, &fact.species)?;
            let (was_lead, was_fainted) = prior.get(&instance_id).copied().unwrap_or_default();
            upsert_brought(
                &tx,
                battle_id,
                fact.side,
                instance_id,
                fact.is_lead || was_lead,
                fact.fainted || was_fainted,
            )?;
        }

        tx.commit()?;
        Ok(facts.len())
    }

    pub fn brought_pokemon(&self, battle_id: i64) -> Result<Vec<StoredBrought>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.instance_id, b.side, i.species, b.is_lead, b.fainted
             FROM battle_brought_pokemon b
             JOIN battle_pokemon_instances i ON i.id = b.instance_id
             WHERE b.battle_id = ?1
             ORDER BY b.side, i.id",
        )?;
        let rows = stmt
            .query_map(params![battle_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, bool>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(instance_id, side, species, is_lead, fainted)| {
                Ok(StoredBrought {
                    instance_id,
                    side: decode_side(&side)?,
                    species,
                    is_lead,
                    fainted,
                })
            })
            .collect()
    }

    pub fn brought_species(&self, battle_id: i64, side: Side) -> Result<Vec<String>> {
        self.species_column(
            "SELECT i.species
             FROM battle_brought_pokemon b
             JOIN battle_pokemon_instances i ON i.id = b.instance_id
             WHERE b.battle_id = ?1 AND b.side = ?2
             ORDER BY i.id",
            battle_id,
            side,
        )
    }
}

/// Flags currently stored per instance of a battle
fn prior_flags(tx: &Transaction<'_>, battle_id: i64) -> Result<HashMap<i64, (bool, bool)>> {
    let mut stmt = tx.prepare_cached(
        "SELECT instance_id, is_lead, fainted FROM battle_brought_pokemon WHERE battle_id = ?1",
    )?;
    let flags = stmt
        .query_map(params![battle_id], |row| {
            Ok((row.get::<_, i64>(0)?, (row.get(1)?, row.get(2)?)))
        })?
        .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(flags)
}

/// Existing instance for (battle, side, normalized species), or a new one
fn resolve_instance(tx: &Transaction<'_>, battle_id: i64, side: Side, species: &str) -> Result<i64> {
    let key = normalize_species(species);
    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM battle_pokemon_instances
             WHERE battle_id = ?1 AND side = ?2 AND species_key = ?3",
            params![battle_id, side.as_str(), key],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    tx.execute(
        "INSERT INTO battle_pokemon_instances (battle_id, side, species, species_key)
         VALUES (?1, ?2, ?3, ?4)",
        params![battle_id, side.as_str(), species, key],
    )?;
    Ok(tx.last_insert_rowid())
}

fn upsert_brought(
    tx: &Transaction<'_>,
    battle_id: i64,
    side: Side,
    instance_id: i64,
    is_lead: bool,
    fainted: bool,
) -> Result<()> {
    tx.execute(
        "INSERT INTO battle_brought_pokemon (battle_id, side, instance_id, is_lead, fainted)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (battle_id, side, instance_id) DO UPDATE SET
           is_lead = MAX(is_lead, excluded.is_lead),
           fainted = MAX(fainted, excluded.fainted)",
        params![battle_id, side.as_str(), instance_id, is_lead, fainted],
    )?;
    Ok(())
}
