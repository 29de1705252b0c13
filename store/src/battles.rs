//! Battle headers and the per-ingestion rebuild of derived rows

use replaydex_battle::{
    DERIVATION_LINE_TYPES, EventRecord, ExtractedBattle, PreviewRecord, RevealedEntry,
    RevealedRecord, SideRecord, WinnerOutcome,
};
use replaydex_protocol::{Side, normalize_species};
use rusqlite::{OptionalExtension as _, Transaction, params};

use crate::{
    BattleStore, Error, Result,
    encode::{decode_gender, decode_side, encode_gender, now},
};

/// Header of a battle about to be ingested
#[derive(Debug, Clone, PartialEq)]
pub struct NewBattle {
    pub replay_id: String,
    pub format_id: Option<String>,
    pub format_name: Option<String>,
    pub generation: Option<u8>,
    pub game_type: Option<String>,
    pub is_rated: bool,
    pub rating: Option<i64>,
    pub views: Option<i64>,
    pub is_private: bool,
    pub played_at: Option<i64>,
    pub uploaded_at: Option<i64>,
    pub winner_side: Option<Side>,
    pub winner_name: Option<String>,
    pub is_tie: bool,
    pub log_text: String,
    pub metadata_json: String,
}

/// A stored battle header (without the log text)
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBattle {
    pub id: i64,
    pub replay_id: String,
    pub format_id: Option<String>,
    pub format_name: Option<String>,
    pub generation: Option<u8>,
    pub game_type: Option<String>,
    pub is_rated: bool,
    pub rating: Option<i64>,
    pub views: Option<i64>,
    pub is_private: bool,
    pub played_at: Option<i64>,
    pub uploaded_at: Option<i64>,
    pub winner_side: Option<Side>,
    pub winner_name: Option<String>,
    pub is_tie: bool,
    pub metadata_json: String,
    pub created_at: String,
    pub updated_at: String,
}

impl StoredBattle {
    pub fn winner(&self) -> WinnerOutcome {
        match (&self.winner_name, self.winner_side) {
            (None, _) => WinnerOutcome::NoWinner,
            (Some(name), Some(side)) => WinnerOutcome::Side {
                side,
                name: name.clone(),
            },
            (Some(name), None) => WinnerOutcome::Unresolved(name.clone()),
        }
    }
}

const BATTLE_COLUMNS: &str = "id, replay_id, format_id, format_name, generation, game_type,
    is_rated, rating, views, is_private, played_at, uploaded_at, winner_side, winner_name,
    is_tie, metadata_json, created_at, updated_at";

/// Tables rebuilt on every ingestion, children first
const DERIVED_TABLES: [&str; 7] = [
    "battle_brought_pokemon",
    "battle_pokemon_instances",
    "battle_events",
    "battle_sides",
    "battle_preview_pokemon",
    "battle_revealed_sets",
    "battle_analysis_cache",
];

fn battle_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(StoredBattle, Option<String>)> {
    let battle = StoredBattle {
        id: row.get(0)?,
        replay_id: row.get(1)?,
        format_id: row.get(2)?,
        format_name: row.get(3)?,
        generation: row.get(4)?,
        game_type: row.get(5)?,
        is_rated: row.get(6)?,
        rating: row.get(7)?,
        views: row.get(8)?,
        is_private: row.get(9)?,
        played_at: row.get(10)?,
        uploaded_at: row.get(11)?,
        winner_side: None,
        winner_name: row.get(13)?,
        is_tie: row.get(14)?,
        metadata_json: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    };
    Ok((battle, row.get(12)?))
}

fn finish_battle((mut battle, side): (StoredBattle, Option<String>)) -> Result<StoredBattle> {
    battle.winner_side = side.as_deref().map(decode_side).transpose()?;
    Ok(battle)
}

impl BattleStore {
    /// Upsert a battle header and rebuild every derived row from `extracted`
    /// in one transaction. Returns the internal battle id.
    ///
    /// Links recorded by the user survive; every other derived row is
    /// deleted and re-inserted, so repeating the call with the same input
    /// leaves the same rows behind.
    pub fn rebuild_battle(&mut self, battle: &NewBattle, extracted: &ExtractedBattle) -> Result<i64> {
        let tx = self.conn.transaction()?;

        let battle_id = upsert_header(&tx, battle)?;
        delete_derived(&tx, battle_id)?;
        insert_events(&tx, battle_id, &extracted.events)?;
        insert_sides(&tx, battle_id, &extracted.sides)?;
        insert_preview(&tx, battle_id, &extracted.preview)?;
        insert_revealed(&tx, battle_id, &extracted.revealed)?;

        tx.commit()?;

        tracing::debug!(
            battle_id,
            replay_id = %battle.replay_id,
            events = extracted.events.len(),
            preview = extracted.preview.len(),
            revealed = extracted.revealed.len(),
            "Rebuilt battle rows"
        );
        Ok(battle_id)
    }

    pub fn battle(&self, id: i64) -> Result<Option<StoredBattle>> {
        let sql = format!("SELECT {BATTLE_COLUMNS} FROM battles WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id], battle_from_row)
            .optional()?
            .map(finish_battle)
            .transpose()
    }

    pub fn battle_by_replay_id(&self, replay_id: &str) -> Result<Option<StoredBattle>> {
        let sql = format!("SELECT {BATTLE_COLUMNS} FROM battles WHERE replay_id = ?1");
        self.conn
            .query_row(&sql, params![replay_id], battle_from_row)
            .optional()?
            .map(finish_battle)
            .transpose()
    }

    /// Most recently played battles first
    pub fn recent_battles(&self, limit: usize) -> Result<Vec<StoredBattle>> {
        let sql = format!(
            "SELECT {BATTLE_COLUMNS} FROM battles
             ORDER BY COALESCE(played_at, uploaded_at, 0) DESC, id DESC
             LIMIT ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit as i64], battle_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(finish_battle).collect()
    }

    pub fn battle_ids(&self) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare("SELECT id FROM battles ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    pub(crate) fn require_battle(&self, id: i64) -> Result<()> {
        let exists = self
            .conn
            .query_row("SELECT 1 FROM battles WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?;
        exists.ok_or(Error::BattleNotFound(id))
    }

    pub fn sides(&self, battle_id: i64) -> Result<Vec<SideRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT side, player_name, avatar, rating, is_user
             FROM battle_sides WHERE battle_id = ?1 ORDER BY side",
        )?;
        let rows = stmt
            .query_map(params![battle_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<u32>>(3)?,
                    row.get::<_, bool>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(side, player_name, avatar, rating, is_user)| {
                Ok(SideRecord {
                    side: decode_side(&side)?,
                    player_name,
                    avatar,
                    rating,
                    is_user,
                })
            })
            .collect()
    }

    /// The side flagged as the operator's, if any
    pub fn user_side(&self, battle_id: i64) -> Result<Option<Side>> {
        let side: Option<String> = self
            .conn
            .query_row(
                "SELECT side FROM battle_sides
                 WHERE battle_id = ?1 AND is_user = 1
                 ORDER BY side LIMIT 1",
                params![battle_id],
                |row| row.get(0),
            )
            .optional()?;
        side.as_deref().map(decode_side).transpose()
    }

    pub fn preview(&self, battle_id: i64) -> Result<Vec<PreviewRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT side, slot_index, species, level, gender, raw_details
             FROM battle_preview_pokemon WHERE battle_id = ?1
             ORDER BY side, slot_index",
        )?;
        let rows = stmt
            .query_map(params![battle_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<u8>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(side, slot_index, species, level, gender, raw_details)| {
                Ok(PreviewRecord {
                    side: decode_side(&side)?,
                    slot_index,
                    species,
                    level,
                    gender: decode_gender(gender),
                    raw_details,
                })
            })
            .collect()
    }

    pub fn preview_species(&self, battle_id: i64, side: Side) -> Result<Vec<String>> {
        self.species_column(
            "SELECT species FROM battle_preview_pokemon
             WHERE battle_id = ?1 AND side = ?2 ORDER BY slot_index",
            battle_id,
            side,
        )
    }

    pub fn revealed(&self, battle_id: i64) -> Result<Vec<RevealedRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT side, species, nickname, item, ability, tera_type, level, gender, shiny, moves_json
             FROM battle_revealed_sets WHERE battle_id = ?1
             ORDER BY side, rowid",
        )?;
        let rows = stmt
            .query_map(params![battle_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    RevealedEntry {
                        species: row.get(1)?,
                        nickname: row.get(2)?,
                        item: row.get(3)?,
                        ability: row.get(4)?,
                        tera_type: row.get(5)?,
                        level: row.get(6)?,
                        gender: row.get(7)?,
                        shiny: row.get(8)?,
                        moves: Vec::new(),
                    },
                    row.get::<_, String>(9)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(side, mut entry, moves_json)| {
                entry.moves = serde_json::from_str(&moves_json)?;
                Ok(RevealedRecord {
                    side: decode_side(&side)?,
                    entry,
                })
            })
            .collect()
    }

    pub fn revealed_species(&self, battle_id: i64, side: Side) -> Result<Vec<String>> {
        self.species_column(
            "SELECT species FROM battle_revealed_sets
             WHERE battle_id = ?1 AND side = ?2 ORDER BY rowid",
            battle_id,
            side,
        )
    }

    pub(crate) fn species_column(&self, sql: &str, battle_id: i64, side: Side) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let species = stmt
            .query_map(params![battle_id, side.as_str()], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(species)
    }

    /// Every event of a battle in log order
    pub fn events(&self, battle_id: i64) -> Result<Vec<EventRecord>> {
        self.query_events(
            "SELECT event_index, turn, time_marker, line_type, raw_text
             FROM battle_events WHERE battle_id = ?1 ORDER BY event_index",
            battle_id,
        )
    }

    /// Only the events brought-pokemon derivation reads, in log order
    pub fn derivation_events(&self, battle_id: i64) -> Result<Vec<EventRecord>> {
        let types = DERIVATION_LINE_TYPES
            .iter()
            .map(|t| format!("'{t}'"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT event_index, turn, time_marker, line_type, raw_text
             FROM battle_events WHERE battle_id = ?1 AND line_type IN ({types})
             ORDER BY event_index"
        );
        self.query_events(&sql, battle_id)
    }

    fn query_events(&self, sql: &str, battle_id: i64) -> Result<Vec<EventRecord>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let events = stmt
            .query_map(params![battle_id], |row| {
                Ok(EventRecord {
                    index: row.get(0)?,
                    turn: row.get(1)?,
                    time_marker: row.get(2)?,
                    line_type: row.get(3)?,
                    raw: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    /// Cache a downstream analysis result; dropped on the next ingestion
    pub fn put_analysis(&mut self, battle_id: i64, kind: &str, payload: &serde_json::Value) -> Result<()> {
        self.require_battle(battle_id)?;
        self.conn.execute(
            "INSERT INTO battle_analysis_cache (battle_id, kind, payload_json, computed_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (battle_id, kind) DO UPDATE SET
               payload_json = excluded.payload_json,
               computed_at  = excluded.computed_at",
            params![battle_id, kind, payload.to_string(), now()],
        )?;
        Ok(())
    }

    pub fn analysis(&self, battle_id: i64, kind: &str) -> Result<Option<serde_json::Value>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload_json FROM battle_analysis_cache WHERE battle_id = ?1 AND kind = ?2",
                params![battle_id, kind],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload.map(|p| serde_json::from_str(&p)).transpose()?)
    }
}

/// Insert or update the header by replay id; `created_at` is only ever
/// written by the insert.
fn upsert_header(tx: &Transaction<'_>, battle: &NewBattle) -> Result<i64> {
    let at = now();
    tx.execute(
        "INSERT INTO battles (
           replay_id, format_id, format_name, generation, game_type,
           is_rated, rating, views, is_private, played_at, uploaded_at,
           winner_side, winner_name, is_tie, log_text, metadata_json,
           created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)
         ON CONFLICT (replay_id) DO UPDATE SET
           format_id     = excluded.format_id,
           format_name   = excluded.format_name,
           generation    = excluded.generation,
           game_type     = excluded.game_type,
           is_rated      = excluded.is_rated,
           rating        = excluded.rating,
           views         = excluded.views,
           is_private    = excluded.is_private,
           played_at     = excluded.played_at,
           uploaded_at   = excluded.uploaded_at,
           winner_side   = excluded.winner_side,
           winner_name   = excluded.winner_name,
           is_tie        = excluded.is_tie,
           log_text      = excluded.log_text,
           metadata_json = excluded.metadata_json,
           updated_at    = excluded.updated_at",
        params![
            battle.replay_id,
            battle.format_id,
            battle.format_name,
            battle.generation,
            battle.game_type,
            battle.is_rated,
            battle.rating,
            battle.views,
            battle.is_private,
            battle.played_at,
            battle.uploaded_at,
            battle.winner_side.map(|s| s.as_str()),
            battle.winner_name,
            battle.is_tie,
            battle.log_text,
            battle.metadata_json,
            at,
        ],
    )?;

    let id = tx.query_row(
        "SELECT id FROM battles WHERE replay_id = ?1",
        params![battle.replay_id],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn delete_derived(tx: &Transaction<'_>, battle_id: i64) -> Result<()> {
    for table in DERIVED_TABLES {
        tx.execute(
            &format!("DELETE FROM {table} WHERE battle_id = ?1"),
            params![battle_id],
        )?;
    }
    tx.execute(
        "DELETE FROM battle_team_links WHERE battle_id = ?1 AND matched_by != 'user'",
        params![battle_id],
    )?;
    Ok(())
}

fn insert_events(tx: &Transaction<'_>, battle_id: i64, events: &[EventRecord]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO battle_events (battle_id, event_index, turn, time_marker, line_type, raw_text)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for event in events {
        stmt.execute(params![
            battle_id,
            event.index,
            event.turn,
            event.time_marker,
            event.line_type,
            event.raw,
        ])?;
    }
    Ok(())
}

fn insert_sides(tx: &Transaction<'_>, battle_id: i64, sides: &[SideRecord]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO battle_sides (battle_id, side, player_name, rating, avatar, is_user)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (battle_id, side) DO UPDATE SET
           player_name = excluded.player_name,
           rating      = excluded.rating,
           avatar      = excluded.avatar,
           is_user     = excluded.is_user",
    )?;
    for side in sides {
        stmt.execute(params![
            battle_id,
            side.side.as_str(),
            side.player_name,
            side.rating,
            side.avatar,
            side.is_user,
        ])?;
    }
    Ok(())
}

fn insert_preview(tx: &Transaction<'_>, battle_id: i64, preview: &[PreviewRecord]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO battle_preview_pokemon
           (battle_id, side, slot_index, species, level, gender, raw_details)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for poke in preview {
        stmt.execute(params![
            battle_id,
            poke.side.as_str(),
            poke.slot_index,
            poke.species,
            poke.level,
            encode_gender(poke.gender),
            poke.raw_details,
        ])?;
    }
    Ok(())
}

fn insert_revealed(tx: &Transaction<'_>, battle_id: i64, revealed: &[RevealedRecord]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO battle_revealed_sets
           (battle_id, side, species, species_key, nickname, item, ability, tera_type,
            level, gender, shiny, moves_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT DO NOTHING",
    )?;
    for record in revealed {
        let entry = &record.entry;
        stmt.execute(params![
            battle_id,
            record.side.as_str(),
            entry.species,
            normalize_species(&entry.species),
            entry.nickname,
            entry.item,
            entry.ability,
            entry.tera_type,
            entry.level,
            entry.gender,
            entry.shiny,
            serde_json::to_string(&entry.moves)?,
        ])?;
    }
    Ok(())
}
