//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: catalog and activity tables
    r#"
    -- ============================================
    -- Host catalog (read-only for the sync engine)
    -- ============================================

    CREATE TABLE IF NOT EXISTS games (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        source_id        TEXT,
        platform_ids     JSON NOT NULL DEFAULT '[]'
    );

    -- ============================================
    -- Activity store
    -- ============================================

    CREATE TABLE IF NOT EXISTS activities (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        game_id           TEXT NOT NULL REFERENCES games(id),
        id_configuration  INTEGER NOT NULL,
        game_action_name  TEXT,
        date_session      DATETIME,
        source_id         TEXT,
        platform_ids      JSON,
        elapsed_seconds   INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_activities_game ON activities(game_id);
    CREATE INDEX IF NOT EXISTS idx_activities_session ON activities(game_id, date_session);
    "#,
    // Version 2: per-session details (placeholders + performance samples)
    r#"
    CREATE TABLE IF NOT EXISTS session_details (
        game_id          TEXT NOT NULL REFERENCES games(id),
        date_session     DATETIME NOT NULL,
        PRIMARY KEY (game_id, date_session)
    );

    CREATE TABLE IF NOT EXISTS session_samples (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        game_id          TEXT NOT NULL,
        date_session     DATETIME NOT NULL,
        datelog          DATETIME NOT NULL,
        fps              REAL,
        cpu              REAL,
        gpu              REAL,
        ram              REAL,
        cpu_temp         REAL,
        gpu_temp         REAL,
        FOREIGN KEY (game_id, date_session) REFERENCES session_details(game_id, date_session)
    );

    CREATE INDEX IF NOT EXISTS idx_session_samples_session ON session_samples(game_id, date_session);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
