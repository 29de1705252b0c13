//! [`BattleStore`] - connection ownership and schema setup

use std::path::Path;

use rusqlite::Connection;

use crate::{Result, schema::SCHEMA};

/// Battle store backed by a single SQLite file
pub struct BattleStore {
    pub(crate) conn: Connection,
}

impl BattleStore {
    /// Open (or create) a store at `path` and run schema initialisation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::init(conn)
    }

    /// Open an in-memory store, useful for testing.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("Battle store schema ready");
        Ok(Self { conn })
    }
}
