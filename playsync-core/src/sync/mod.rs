//! Session export/import between the local activity store and external sources.
//!
//! ## Architecture
//!
//! ```text
//!                       ┌──────────────────────────────┐
//!  export_sessions ◄─── │          SyncBridge          │ ◄─── import_sessions
//!   (JSON array)        │  SYNC_LOCK + SharedSystem    │      (JSON array)
//!                       └──────────────────────────────┘
//!                          │            │           │
//!                          ▼            ▼           ▼
//!                   ┌──────────┐ ┌────────────┐ ┌─────────┐
//!                   │  export  │ │  resolver  │ │ matcher │
//!                   └──────────┘ └────────────┘ └─────────┘
//!                          │            │           │
//!                          ▼            ▼           ▼
//!                 ActivityStore   Configurations.json
//! ```
//!
//! ## Locking
//!
//! One process-wide mutex is held for an entire export traversal or an entire
//! import batch, whichever bridge runs it. Matching is read-then-write against
//! a store that is not synchronized on its own, so per-record locking is not
//! enough. The lock is never taken recursively: the entry points acquire it
//! once and everything below them receives the guarded state by reference.
//!
//! Bridges opened on the same user-data directory also share one
//! configuration list (see [`LocalSystem::shared`]), so an index handed out
//! through one bridge is never reused by another.
//!
//! ## Failure policy
//!
//! Neither entry point returns an error. Export failures produce an empty
//! list; import failures are counted in the returned [`ImportResult`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use playsync_core::{Config, SyncBridge};
//!
//! let config = Config::load().expect("failed to load config");
//! let bridge = SyncBridge::open(&config).expect("failed to open store");
//!
//! let payload = bridge.export_sessions_json();
//! let summary = bridge.import_sessions_json(Some(&payload));
//! println!("{}", summary);
//! ```

mod export;
mod import;
mod matcher;
mod normalize;
mod resolver;
#[cfg(test)]
pub(crate) mod testing;

pub use matcher::{match_session, MatchOutcome, SessionKey};
pub use normalize::{
    first_non_empty, parse_id, resolve_action_name, resolve_platform_ids, resolve_source_id,
};
pub use resolver::resolve_configuration;

use crate::config::{Config, SyncConfig};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::store::ActivityStore;
use crate::system::{LocalSystem, SharedSystem};
use crate::types::{ImportResult, SystemConfiguration, TransferSession};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Serializes every export and import in the process.
static SYNC_LOCK: Mutex<()> = Mutex::new(());

/// Export/import engine over an [`ActivityStore`].
///
/// Every bridge in the process runs its exports and imports under the same
/// lock. Share a bridge between threads with `Arc`.
pub struct SyncBridge<S: ActivityStore> {
    store: S,
    system: SharedSystem,
    default_action: String,
}

impl SyncBridge<Database> {
    /// Open the SQLite store and configuration list in the user-data directory.
    ///
    /// Fails if the configuration side file exists but cannot be parsed.
    pub fn open(config: &Config) -> Result<Self> {
        let system = LocalSystem::shared(&config.sync)?;

        let db_path = config.database_path();
        tracing::info!(path = %db_path.display(), "Opening activity store");

        let db = Database::open(&db_path)?;
        db.migrate()?;

        Ok(Self::new(db, system, &config.sync))
    }
}

impl<S: ActivityStore> SyncBridge<S> {
    pub fn new(store: S, system: SharedSystem, config: &SyncConfig) -> Self {
        Self {
            store,
            system,
            default_action: config.default_action_label.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshot of the configuration list.
    pub fn configurations(&self) -> Vec<SystemConfiguration> {
        self.system().configurations().to_vec()
    }

    // A panic mid-batch leaves the list valid (append-only), so poisoned
    // locks are recovered rather than propagated.
    fn lock(&self) -> (MutexGuard<'static, ()>, MutexGuard<'_, LocalSystem>) {
        let sync = SYNC_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        (sync, self.system())
    }

    fn system(&self) -> MutexGuard<'_, LocalSystem> {
        self.system.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every stored session with a timestamp, as transfer records.
    ///
    /// Returns an empty list if the store is not loaded or the traversal fails.
    pub fn export_sessions(&self) -> Vec<TransferSession> {
        if !self.store.is_loaded() {
            tracing::warn!("Export skipped, activity store not loaded");
            return Vec::new();
        }

        let (_sync, system) = self.lock();
        match export::export_snapshot(&self.store, &system) {
            Ok(sessions) => {
                tracing::info!(count = sessions.len(), "Exported sessions");
                sessions
            }
            Err(e) => {
                tracing::warn!(error = %e, "Export failed, returning empty list");
                Vec::new()
            }
        }
    }

    /// [`export_sessions`](Self::export_sessions) encoded as a JSON array.
    pub fn export_sessions_json(&self) -> String {
        serde_json::to_string(&self.export_sessions()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to encode exported sessions");
            "[]".to_string()
        })
    }

    /// Merge incoming sessions into the store, in order, as one batch.
    pub fn import_sessions(&self, sessions: &[TransferSession]) -> ImportResult {
        let _span = tracing::info_span!("import", records = sessions.len()).entered();

        let (_sync, mut system) = self.lock();
        import::import_batch(&self.store, &mut system, sessions, &self.default_action)
    }

    /// Decode a JSON array of sessions, import it, and encode the result.
    ///
    /// An absent, blank or malformed payload is an empty batch. Inside a
    /// valid array, an element that does not decode counts as one error and
    /// the remaining elements are still imported.
    pub fn import_sessions_json(&self, payload: Option<&str>) -> String {
        let records = decode_sessions(payload);
        let result = {
            let _span = tracing::info_span!("import", records = records.len()).entered();
            let (_sync, mut system) = self.lock();
            import::import_records(&self.store, &mut system, records, &self.default_action)
        };

        serde_json::to_string(&result).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to encode import result");
            "{}".to_string()
        })
    }
}

/// Split a payload into per-element decode results.
fn decode_sessions(payload: Option<&str>) -> Vec<Result<TransferSession>> {
    let Some(payload) = payload.map(str::trim).filter(|p| !p.is_empty()) else {
        return Vec::new();
    };

    let elements = match serde_json::from_str::<Option<Vec<serde_json::Value>>>(payload) {
        Ok(elements) => elements.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Malformed session payload, importing nothing");
            return Vec::new();
        }
    };

    elements
        .into_iter()
        .map(|element| serde_json::from_value(element).map_err(Error::from))
        .collect()
}
