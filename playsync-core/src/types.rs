//! Core domain types for playsync
//!
//! Two families of types live here:
//! - the local model (Layer 1): [`Game`], [`Activity`], [`GameActivities`],
//!   [`SystemConfiguration`]
//! - the transfer model exchanged with external sources: [`TransferSession`]
//!   and [`ImportResult`]
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Game** | Host catalog entry; read-only reference data looked up by id |
//! | **Activity** | One recorded play session of a game |
//! | **Configuration** | Named category an activity is tagged with, referenced by index into a shared list |
//! | **Matching triple** | (session timestamp, configuration index, action name); identifies a session within a game |
//! | **Details** | Per-session performance samples, keyed by session timestamp |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================
// Game
// ============================================

/// A game from the host catalog.
///
/// Owns the default source and platform identifiers that activities fall
/// back to when a record does not carry its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub name: String,
    /// Default library source (None when the host has none)
    pub source_id: Option<Uuid>,
    /// Default platforms
    pub platform_ids: Vec<Uuid>,
}

impl Game {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            source_id: None,
            platform_ids: Vec::new(),
        }
    }
}

// ============================================
// Activity
// ============================================

/// One play session recorded locally for a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    /// Store row id (None until persisted)
    pub id: Option<i64>,
    /// Index into the shared configuration list
    pub id_configuration: i32,
    pub game_action_name: Option<String>,
    /// Session start (UTC). Activities without one are never exported.
    pub date_session: Option<DateTime<Utc>>,
    /// Library source; None (or nil) means "use the game default"
    pub source_id: Option<Uuid>,
    /// Platforms; None means "use the game default"
    pub platform_ids: Option<Vec<Uuid>>,
    pub elapsed_seconds: u64,
}

impl Activity {
    /// Whether this activity is the session identified by the matching triple.
    ///
    /// Action names compare by exact, case-sensitive text; a missing name
    /// compares as the empty string.
    pub fn matches(&self, date_session: DateTime<Utc>, id_configuration: i32, action: &str) -> bool {
        self.date_session == Some(date_session)
            && self.id_configuration == id_configuration
            && self.game_action_name.as_deref().unwrap_or("") == action
    }
}

/// One performance sample taken during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivityDetailsData {
    pub datelog: DateTime<Utc>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub gpu: Option<f64>,
    #[serde(default)]
    pub ram: Option<f64>,
    #[serde(default)]
    pub cpu_temp: Option<f64>,
    #[serde(default)]
    pub gpu_temp: Option<f64>,
}

/// A game's activity collection: its sessions plus the per-session details table.
#[derive(Debug, Clone, PartialEq)]
pub struct GameActivities {
    pub game: Game,
    pub items: Vec<Activity>,
    /// Session timestamp -> samples. An empty list is a placeholder.
    pub items_details: BTreeMap<DateTime<Utc>, Vec<ActivityDetailsData>>,
}

impl GameActivities {
    /// Empty collection for a game that has no recorded sessions yet.
    pub fn empty(game: Game) -> Self {
        Self {
            game,
            items: Vec::new(),
            items_details: BTreeMap::new(),
        }
    }

    /// Ensure a details entry exists for `date_session` without touching an existing one.
    ///
    /// Returns true if a placeholder was inserted.
    pub fn ensure_details_placeholder(&mut self, date_session: DateTime<Utc>) -> bool {
        if self.items_details.contains_key(&date_session) {
            return false;
        }
        self.items_details.insert(date_session, Vec::new());
        true
    }
}

// ============================================
// Configuration
// ============================================

/// Entry of the shared, append-only configuration list.
///
/// Identified by its position in the list, never by its name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SystemConfiguration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<String>,
}

impl SystemConfiguration {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

// ============================================
// Transfer model
// ============================================

/// Wire representation of one play session.
///
/// Field names follow the PascalCase layout external sources already emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransferSession {
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default, deserialize_with = "wire::null_as_default")]
    pub platform_ids: Vec<String>,
    /// Index hint; only used when no configuration name is given
    #[serde(default = "wire::no_configuration")]
    pub id_configuration: i32,
    /// Authoritative configuration when present
    #[serde(default)]
    pub configuration_name: Option<String>,
    #[serde(default)]
    pub game_action_name: Option<String>,
    #[serde(with = "wire::utc_timestamp")]
    pub date_session_utc: DateTime<Utc>,
    #[serde(default)]
    pub elapsed_seconds: u64,
}

/// Outcome counters of one import call.
///
/// `error` holds only the most recent failure message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImportResult {
    pub applied: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub error: Option<String>,
}

impl ImportResult {
    /// Records accounted for by this result.
    pub fn total(&self) -> usize {
        self.applied + self.updated + self.skipped + self.errors
    }

    pub(crate) fn record_error(&mut self, message: impl Into<String>) {
        self.errors += 1;
        self.error = Some(message.into());
    }
}

mod wire {
    use serde::{Deserialize, Deserializer};

    pub fn no_configuration() -> i32 {
        -1
    }

    pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Timestamps are written as RFC 3339 UTC. On read, an explicit offset is
    /// converted to UTC and a naive date-time is taken to already be UTC.
    pub mod utc_timestamp {
        use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = String::deserialize(deserializer)?;
            parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
        }

        pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
            let raw = raw.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
                return Some(dt.with_timezone(&Utc));
            }
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|naive| naive.and_utc())
        }
    }
}
