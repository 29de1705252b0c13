//! Team versions registered by the team-import subsystem

use chrono::{DateTime, Utc};
use replaydex_team::TeamRoster;
use rusqlite::{OptionalExtension as _, params};

use crate::{
    BattleStore, Error, Result,
    encode::{encode_dt, now},
};

/// A team version as handed over by the importer
#[derive(Debug, Clone, PartialEq)]
pub struct NewTeamVersion {
    pub team_name: String,
    pub format_id: Option<String>,
    /// Roster in slot order
    pub species: Vec<String>,
    /// Defaults to now; decides most-recent-first ordering
    pub created_at: Option<DateTime<Utc>>,
}

impl BattleStore {
    /// Store a team version and its roster. Returns the new version id.
    pub fn register_team_version(&mut self, team: &NewTeamVersion) -> Result<i64> {
        let created_at = team.created_at.map(encode_dt).unwrap_or_else(now);
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO team_versions (team_name, format_id, created_at) VALUES (?1, ?2, ?3)",
            params![team.team_name, team.format_id, created_at],
        )?;
        let version_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO team_version_pokemon (team_version_id, slot, species) VALUES (?1, ?2, ?3)",
            )?;
            for (slot, species) in team.species.iter().enumerate() {
                stmt.execute(params![version_id, slot as i64 + 1, species])?;
            }
        }

        tx.commit()?;
        tracing::debug!(
            team_version_id = version_id,
            team = %team.team_name,
            species = team.species.len(),
            "Registered team version"
        );
        Ok(version_id)
    }

    pub fn team_version(&self, id: i64) -> Result<Option<TeamRoster>> {
        let header: Option<(String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT team_name, format_id FROM team_versions WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((team_name, format_id)) = header else {
            return Ok(None);
        };

        Ok(Some(TeamRoster {
            team_version_id: id,
            team_name,
            format_id,
            species: self.roster_species(id)?,
        }))
    }

    pub(crate) fn require_team_version(&self, id: i64) -> Result<()> {
        let exists = self
            .conn
            .query_row("SELECT 1 FROM team_versions WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?;
        exists.ok_or(Error::TeamVersionNotFound(id))
    }

    /// Candidate rosters, most recent first.
    ///
    /// With a format, only versions registered for that format are returned.
    pub fn team_versions(&self, format_id: Option<&str>) -> Result<Vec<TeamRoster>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, team_name, format_id FROM team_versions
             WHERE ?1 IS NULL OR format_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let headers = stmt
            .query_map(params![format_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        headers
            .into_iter()
            .map(|(team_version_id, team_name, format_id)| {
                Ok(TeamRoster {
                    team_version_id,
                    team_name,
                    format_id,
                    species: self.roster_species(team_version_id)?,
                })
            })
            .collect()
    }

    fn roster_species(&self, team_version_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT species FROM team_version_pokemon WHERE team_version_id = ?1 ORDER BY slot",
        )?;
        let species = stmt
            .query_map(params![team_version_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(species)
    }
}
