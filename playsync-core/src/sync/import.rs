//! Import reconciliation: merging incoming sessions into the local store.

use super::matcher::{match_session, MatchOutcome, SessionKey};
use super::normalize;
use super::resolver::resolve_configuration;
use crate::error::{Error, Result};
use crate::store::ActivityStore;
use crate::system::LocalSystem;
use crate::types::{Activity, ImportResult, TransferSession};
use std::borrow::Borrow;

/// How a single incoming session was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecordOutcome {
    /// Stored as a new activity
    Applied,
    /// Raised the elapsed time of an existing activity
    Updated,
    /// Nothing to store
    Skipped(SkipReason),
}

/// Reason an incoming session was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SkipReason {
    /// Game id missing or not a valid identifier
    InvalidGameId,
    /// Game id not in the host catalog
    UnknownGame,
    /// The store has no activity collection for the game
    NoActivityCollection,
    /// Same session already stored with at least this elapsed time
    NotLonger,
}

impl SkipReason {
    fn as_str(&self) -> &'static str {
        match self {
            SkipReason::InvalidGameId => "invalid game id",
            SkipReason::UnknownGame => "unknown game",
            SkipReason::NoActivityCollection => "no activity collection",
            SkipReason::NotLonger => "not longer than stored session",
        }
    }
}

/// Import a batch of decoded sessions in input order.
pub(crate) fn import_batch(
    store: &dyn ActivityStore,
    system: &mut LocalSystem,
    sessions: &[TransferSession],
    default_action: &str,
) -> ImportResult {
    import_records(store, system, sessions.iter().map(Ok), default_action)
}

/// Import a batch in input order.
///
/// Each entry is either a decoded session or the error that kept it from
/// being decoded. Every entry lands in exactly one of
/// applied/updated/skipped/errors. A failing entry never stops the batch;
/// its message replaces the previous last error. When the store is not
/// loaded nothing is processed and a single error is reported.
pub(crate) fn import_records<I, T>(
    store: &dyn ActivityStore,
    system: &mut LocalSystem,
    records: I,
    default_action: &str,
) -> ImportResult
where
    I: IntoIterator<Item = Result<T>>,
    T: Borrow<TransferSession>,
{
    let mut result = ImportResult::default();

    if !store.is_loaded() {
        tracing::warn!("Import refused, activity store not loaded");
        result.record_error(Error::StoreUnavailable.to_string());
        return result;
    }

    for (position, record) in records.into_iter().enumerate() {
        let session = match record {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(position, error = %e, "Rejected undecodable session");
                result.record_error(e.to_string());
                continue;
            }
        };
        let session = session.borrow();
        let game_id = session.game_id.as_deref().unwrap_or("");

        match import_session(store, system, session, default_action) {
            Ok(RecordOutcome::Applied) => result.applied += 1,
            Ok(RecordOutcome::Updated) => result.updated += 1,
            Ok(RecordOutcome::Skipped(reason)) => {
                tracing::debug!(
                    position,
                    game_id,
                    reason = reason.as_str(),
                    "Session skipped"
                );
                result.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(position, game_id, error = %e, "Failed to import session");
                result.record_error(e.to_string());
            }
        }
    }

    tracing::info!(
        applied = result.applied,
        updated = result.updated,
        skipped = result.skipped,
        errors = result.errors,
        "Import complete"
    );
    result
}

/// Reconcile one incoming session with its game's stored activities.
pub(crate) fn import_session(
    store: &dyn ActivityStore,
    system: &mut LocalSystem,
    session: &TransferSession,
    default_action: &str,
) -> Result<RecordOutcome> {
    let Some(game_id) = normalize::parse_id(session.game_id.as_deref()) else {
        return Ok(RecordOutcome::Skipped(SkipReason::InvalidGameId));
    };
    let Some(game) = store.get_game(&game_id)? else {
        return Ok(RecordOutcome::Skipped(SkipReason::UnknownGame));
    };
    let Some(mut activities) = store.get_game_activities(&game)? else {
        return Ok(RecordOutcome::Skipped(SkipReason::NoActivityCollection));
    };

    let source_id = normalize::resolve_source_id(session.source_id.as_deref(), game.source_id);
    let platform_ids = normalize::resolve_platform_ids(&session.platform_ids, &game.platform_ids);
    let date_session = session.date_session_utc;
    let action =
        normalize::resolve_action_name(session.game_action_name.as_deref(), default_action);
    let id_configuration = resolve_configuration(
        system,
        session.configuration_name.as_deref(),
        session.id_configuration,
    )?;

    let key = SessionKey {
        date_session,
        id_configuration,
        action: &action,
    };

    let outcome = match match_session(&activities.items, &key, session.elapsed_seconds) {
        MatchOutcome::Apply => {
            activities.items.push(Activity {
                id: None,
                id_configuration,
                game_action_name: Some(action.clone()),
                date_session: Some(date_session),
                source_id,
                platform_ids: Some(platform_ids),
                elapsed_seconds: session.elapsed_seconds,
            });
            RecordOutcome::Applied
        }
        MatchOutcome::Update { index } => {
            activities.items[index].elapsed_seconds = session.elapsed_seconds;
            RecordOutcome::Updated
        }
        MatchOutcome::Skip { .. } => RecordOutcome::Skipped(SkipReason::NotLonger),
    };

    activities.ensure_details_placeholder(date_session);
    store.update_game_activities(&activities)?;

    Ok(outcome)
}
