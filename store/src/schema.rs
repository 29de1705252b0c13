//! SQL schema for the battle store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS battles (
    id            INTEGER PRIMARY KEY,
    replay_id     TEXT NOT NULL UNIQUE,
    format_id     TEXT,
    format_name   TEXT,
    generation    INTEGER,
    game_type     TEXT,
    is_rated      INTEGER NOT NULL DEFAULT 0,
    rating        INTEGER,
    views         INTEGER,
    is_private    INTEGER NOT NULL DEFAULT 0,
    played_at     INTEGER,          -- unix seconds, first |t:| marker
    uploaded_at   INTEGER,          -- unix seconds
    winner_side   TEXT,             -- 'p1' | 'p2' | NULL when unresolved
    winner_name   TEXT,
    is_tie        INTEGER NOT NULL DEFAULT 0,
    log_text      TEXT NOT NULL,
    metadata_json TEXT NOT NULL DEFAULT '{}',
    created_at    TEXT NOT NULL,    -- RFC 3339; never rewritten
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS battle_sides (
    battle_id   INTEGER NOT NULL REFERENCES battles(id),
    side        TEXT NOT NULL,
    player_name TEXT NOT NULL,
    rating      INTEGER,
    avatar      TEXT,
    is_user     INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (battle_id, side)
);

CREATE TABLE IF NOT EXISTS battle_preview_pokemon (
    battle_id   INTEGER NOT NULL REFERENCES battles(id),
    side        TEXT NOT NULL,
    slot_index  INTEGER NOT NULL,
    species     TEXT NOT NULL,
    level       INTEGER,
    gender      TEXT,
    raw_details TEXT NOT NULL,
    PRIMARY KEY (battle_id, side, slot_index)
);

CREATE TABLE IF NOT EXISTS battle_revealed_sets (
    battle_id  INTEGER NOT NULL REFERENCES battles(id),
    side       TEXT NOT NULL,
    species    TEXT NOT NULL,
    species_key TEXT NOT NULL,      -- normalize_species(species)
    nickname   TEXT,
    item       TEXT,
    ability    TEXT,
    tera_type  TEXT,
    level      INTEGER,
    gender     TEXT,
    shiny      INTEGER NOT NULL DEFAULT 0,
    moves_json TEXT NOT NULL DEFAULT '[]',
    UNIQUE (battle_id, side, species_key)
);

-- Append-only per ingestion; the only input to re-derivation.
CREATE TABLE IF NOT EXISTS battle_events (
    battle_id   INTEGER NOT NULL REFERENCES battles(id),
    event_index INTEGER NOT NULL,
    turn        INTEGER NOT NULL,
    time_marker INTEGER,
    line_type   TEXT NOT NULL,
    raw_text    TEXT NOT NULL,
    PRIMARY KEY (battle_id, event_index)
);

CREATE TABLE IF NOT EXISTS battle_pokemon_instances (
    id        INTEGER PRIMARY KEY,
    battle_id INTEGER NOT NULL REFERENCES battles(id),
    side      TEXT NOT NULL,
    species   TEXT NOT NULL,
    species_key TEXT NOT NULL,
    UNIQUE (battle_id, side, species_key)
);

CREATE TABLE IF NOT EXISTS battle_brought_pokemon (
    battle_id   INTEGER NOT NULL REFERENCES battles(id),
    side        TEXT NOT NULL,
    instance_id INTEGER NOT NULL REFERENCES battle_pokemon_instances(id),
    is_lead     INTEGER NOT NULL DEFAULT 0,
    fainted     INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (battle_id, side, instance_id)
);

-- Written by the team-import subsystem; read-only to ingestion.
CREATE TABLE IF NOT EXISTS team_versions (
    id         INTEGER PRIMARY KEY,
    team_name  TEXT NOT NULL,
    format_id  TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS team_version_pokemon (
    team_version_id INTEGER NOT NULL REFERENCES team_versions(id),
    slot            INTEGER NOT NULL,
    species         TEXT NOT NULL,
    PRIMARY KEY (team_version_id, slot)
);

CREATE TABLE IF NOT EXISTS battle_team_links (
    battle_id       INTEGER NOT NULL REFERENCES battles(id),
    side            TEXT NOT NULL,
    team_version_id INTEGER REFERENCES team_versions(id),
    confidence      REAL NOT NULL CHECK (confidence >= 0 AND confidence <= 1),
    method          TEXT NOT NULL,
    matched_by      TEXT NOT NULL CHECK (matched_by IN ('auto', 'user')),
    matched_at      TEXT NOT NULL,
    PRIMARY KEY (battle_id, side)
);

CREATE TABLE IF NOT EXISTS battle_analysis_cache (
    battle_id    INTEGER NOT NULL REFERENCES battles(id),
    kind         TEXT NOT NULL,
    payload_json TEXT NOT NULL,
    computed_at  TEXT NOT NULL,
    PRIMARY KEY (battle_id, kind)
);

CREATE TABLE IF NOT EXISTS battle_sets (
    id         INTEGER PRIMARY KEY,
    set_key    TEXT NOT NULL UNIQUE,   -- sha256 of sorted replay ids
    game_count INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS battle_set_games (
    set_id      INTEGER NOT NULL REFERENCES battle_sets(id),
    battle_id   INTEGER NOT NULL REFERENCES battles(id),
    game_number INTEGER NOT NULL,
    PRIMARY KEY (set_id, battle_id)
);

CREATE INDEX IF NOT EXISTS battles_played_idx      ON battles(played_at);
CREATE INDEX IF NOT EXISTS battles_format_idx      ON battles(format_id);
CREATE INDEX IF NOT EXISTS events_type_idx         ON battle_events(battle_id, line_type);
CREATE INDEX IF NOT EXISTS team_versions_format_idx ON team_versions(format_id);
CREATE INDEX IF NOT EXISTS links_team_idx          ON battle_team_links(team_version_id);

PRAGMA user_version = 1;
";
