//! Database repository layer
//!
//! Provides query and persist operations for games, activities and
//! per-session details, and implements [`ActivityStore`] on top of them.

use crate::error::{Error, Result};
use crate::store::ActivityStore;
use crate::types::*;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn();
        super::schema::run_migrations(&conn)
    }

    /// Schema version currently applied
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn();
        super::schema::get_schema_version(&conn)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============================================
    // Game operations
    // ============================================

    /// Insert or update a catalog game (host side)
    pub fn upsert_game(&self, game: &Game) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO games (id, name, source_id, platform_ids)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                source_id = excluded.source_id,
                platform_ids = excluded.platform_ids
            "#,
            params![
                game.id.to_string(),
                game.name,
                game.source_id.map(|id| id.to_string()),
                serde_json::to_string(&game.platform_ids)?,
            ],
        )?;
        Ok(())
    }

    /// Get a game by ID
    pub fn get_game(&self, id: &Uuid) -> Result<Option<Game>> {
        let conn = self.conn();
        query_game(&conn, id)
    }

    // ============================================
    // Activity operations
    // ============================================

    /// Load the activity collection of a game (empty if it has none)
    pub fn load_game_activities(&self, game: &Game) -> Result<GameActivities> {
        let conn = self.conn();
        load_collection(&conn, game.clone())
    }

    /// Persist an activity collection.
    ///
    /// Compared against what is stored: activities without a row id are
    /// inserted, stored rows are rewritten only when they differ, and a
    /// details entry is written only when its key is missing or its samples
    /// changed. Unchanged rows cost no writes.
    pub fn save_game_activities(&self, activities: &GameActivities) -> Result<()> {
        let mut conn = self.conn();
        let game_id = activities.game.id.to_string();

        if query_game(&conn, &activities.game.id)?.is_none() {
            return Err(Error::GameNotFound(game_id));
        }

        let tx = conn.transaction()?;
        let stored = load_collection(&tx, activities.game.clone())?;
        let stored_rows: HashMap<i64, &Activity> = stored
            .items
            .iter()
            .filter_map(|a| a.id.map(|id| (id, a)))
            .collect();

        let mut written = 0usize;
        for activity in &activities.items {
            if let Some(row_id) = activity.id {
                if stored_rows.get(&row_id) == Some(&activity) {
                    continue;
                }
            }

            let elapsed = i64::try_from(activity.elapsed_seconds).map_err(|_| {
                Error::InvalidRecord(format!(
                    "elapsed seconds out of range: {}",
                    activity.elapsed_seconds
                ))
            })?;
            let platform_ids = activity
                .platform_ids
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            let date_session = activity.date_session.map(format_ts);
            let source_id = activity.source_id.map(|id| id.to_string());
            let values = params![
                game_id,
                activity.id_configuration,
                activity.game_action_name,
                date_session,
                source_id,
                platform_ids,
                elapsed,
            ];

            match activity.id {
                Some(row_id) => {
                    let mut stmt = tx.prepare_cached(
                        r#"
                        UPDATE activities SET
                            game_id = ?1,
                            id_configuration = ?2,
                            game_action_name = ?3,
                            date_session = ?4,
                            source_id = ?5,
                            platform_ids = ?6,
                            elapsed_seconds = ?7
                        WHERE id = ?8
                        "#,
                    )?;
                    let mut bound: Vec<&dyn rusqlite::ToSql> = values.to_vec();
                    bound.push(&row_id);
                    stmt.execute(bound.as_slice())?;
                }
                None => {
                    let mut stmt = tx.prepare_cached(
                        r#"
                        INSERT INTO activities
                            (game_id, id_configuration, game_action_name, date_session,
                             source_id, platform_ids, elapsed_seconds)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                        "#,
                    )?;
                    stmt.execute(values)?;
                }
            }
            written += 1;
        }

        for (key, samples) in &activities.items_details {
            let stored_samples = stored.items_details.get(key);
            if stored_samples == Some(samples) {
                continue;
            }

            let date_session = format_ts(*key);
            if stored_samples.is_none() {
                tx.execute(
                    "INSERT INTO session_details (game_id, date_session) VALUES (?1, ?2)",
                    params![game_id, date_session],
                )?;
            } else {
                tx.execute(
                    "DELETE FROM session_samples WHERE game_id = ?1 AND date_session = ?2",
                    params![game_id, date_session],
                )?;
            }
            for sample in samples {
                insert_sample(&tx, &game_id, &date_session, sample)?;
            }
            written += 1;
        }

        tx.commit()?;

        tracing::debug!(
            game_id = %game_id,
            activities = activities.items.len(),
            details = activities.items_details.len(),
            written,
            "Saved game activities"
        );
        Ok(())
    }

    /// Record one performance sample for a session (host side)
    pub fn add_session_sample(
        &self,
        game_id: &Uuid,
        date_session: DateTime<Utc>,
        sample: &ActivityDetailsData,
    ) -> Result<()> {
        let conn = self.conn();
        let game_id = game_id.to_string();
        let date_session = format_ts(date_session);
        conn.execute(
            "INSERT OR IGNORE INTO session_details (game_id, date_session) VALUES (?1, ?2)",
            params![game_id, date_session],
        )?;
        insert_sample(&conn, &game_id, &date_session, sample)
    }

    /// Total number of stored activities across all games
    pub fn count_activities(&self) -> Result<i64> {
        let conn = self.conn();
        let count = conn.query_row("SELECT COUNT(*) FROM activities", [], |r| r.get(0))?;
        Ok(count)
    }
}

impl ActivityStore for Database {
    fn is_loaded(&self) -> bool {
        matches!(self.schema_version(), Ok(v) if v == super::schema::SCHEMA_VERSION)
    }

    fn get_game(&self, id: &Uuid) -> Result<Option<Game>> {
        Database::get_game(self, id)
    }

    fn list_game_activities(&self) -> Result<Vec<GameActivities>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM games
            WHERE id IN (SELECT game_id FROM activities)
               OR id IN (SELECT game_id FROM session_details)
            ORDER BY name, id
            "#,
        )?;
        let games = stmt
            .query_map([], row_to_game)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        games
            .into_iter()
            .map(|game| load_collection(&conn, game))
            .collect()
    }

    fn get_game_activities(&self, game: &Game) -> Result<Option<GameActivities>> {
        self.load_game_activities(game).map(Some)
    }

    fn update_game_activities(&self, activities: &GameActivities) -> Result<()> {
        self.save_game_activities(activities)
    }
}

// ============================================
// Row helpers
// ============================================

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn parse_uuid(idx: usize, raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| conversion_error(idx, e))
}

fn parse_uuid_list(idx: usize, raw: &str) -> rusqlite::Result<Vec<Uuid>> {
    serde_json::from_str(raw).map_err(|e| conversion_error(idx, e))
}

fn query_game(conn: &Connection, id: &Uuid) -> Result<Option<Game>> {
    conn.query_row(
        "SELECT * FROM games WHERE id = ?",
        [id.to_string()],
        row_to_game,
    )
    .optional()
    .map_err(Error::from)
}

fn row_to_game(row: &Row) -> rusqlite::Result<Game> {
    let id: String = row.get("id")?;
    let source_id: Option<String> = row.get("source_id")?;
    let platform_ids: String = row.get("platform_ids")?;

    Ok(Game {
        id: parse_uuid(0, &id)?,
        name: row.get("name")?,
        source_id: source_id.as_deref().map(|s| parse_uuid(2, s)).transpose()?,
        platform_ids: parse_uuid_list(3, &platform_ids)?,
    })
}

fn row_to_activity(row: &Row) -> rusqlite::Result<Activity> {
    let date_session: Option<String> = row.get("date_session")?;
    let source_id: Option<String> = row.get("source_id")?;
    let platform_ids: Option<String> = row.get("platform_ids")?;
    let elapsed: i64 = row.get("elapsed_seconds")?;

    Ok(Activity {
        id: Some(row.get("id")?),
        id_configuration: row.get("id_configuration")?,
        game_action_name: row.get("game_action_name")?,
        date_session: date_session
            .as_deref()
            .map(|s| parse_ts(4, s))
            .transpose()?,
        source_id: source_id
            .as_deref()
            .map(|s| parse_uuid(5, s))
            .transpose()?
            .filter(|id| !id.is_nil()),
        platform_ids: platform_ids
            .as_deref()
            .map(|s| parse_uuid_list(6, s))
            .transpose()?,
        elapsed_seconds: u64::try_from(elapsed).unwrap_or(0),
    })
}

fn row_to_sample(row: &Row) -> rusqlite::Result<ActivityDetailsData> {
    let datelog: String = row.get("datelog")?;
    Ok(ActivityDetailsData {
        datelog: parse_ts(3, &datelog)?,
        fps: row.get("fps")?,
        cpu: row.get("cpu")?,
        gpu: row.get("gpu")?,
        ram: row.get("ram")?,
        cpu_temp: row.get("cpu_temp")?,
        gpu_temp: row.get("gpu_temp")?,
    })
}

fn insert_sample(
    conn: &Connection,
    game_id: &str,
    date_session: &str,
    sample: &ActivityDetailsData,
) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO session_samples
            (game_id, date_session, datelog, fps, cpu, gpu, ram, cpu_temp, gpu_temp)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            game_id,
            date_session,
            format_ts(sample.datelog),
            sample.fps,
            sample.cpu,
            sample.gpu,
            sample.ram,
            sample.cpu_temp,
            sample.gpu_temp,
        ],
    )?;
    Ok(())
}

fn load_collection(conn: &Connection, game: Game) -> Result<GameActivities> {
    let game_id = game.id.to_string();

    let mut stmt = conn.prepare_cached("SELECT * FROM activities WHERE game_id = ? ORDER BY id")?;
    let items = stmt
        .query_map([&game_id], row_to_activity)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut items_details: BTreeMap<DateTime<Utc>, Vec<ActivityDetailsData>> = BTreeMap::new();
    let mut stmt =
        conn.prepare_cached("SELECT date_session FROM session_details WHERE game_id = ?")?;
    let keys = stmt
        .query_map([&game_id], |row| {
            let raw: String = row.get(0)?;
            parse_ts(0, &raw)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for key in keys {
        items_details.insert(key, Vec::new());
    }

    let mut stmt = conn.prepare_cached(
        "SELECT * FROM session_samples WHERE game_id = ? ORDER BY date_session, datelog, id",
    )?;
    let samples = stmt
        .query_map([&game_id], |row| {
            let raw: String = row.get("date_session")?;
            Ok((parse_ts(2, &raw)?, row_to_sample(row)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for (key, sample) in samples {
        items_details.entry(key).or_default().push(sample);
    }

    Ok(GameActivities {
        game,
        items,
        items_details,
    })
}
