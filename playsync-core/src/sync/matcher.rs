//! Duplicate detection for incoming sessions.
//!
//! A session is identified within a game by its matching triple: session
//! timestamp, configuration index and action name. Elapsed time is the only
//! field allowed to change between two reports of the same session, and it
//! only ever grows.

use crate::types::Activity;
use chrono::{DateTime, Utc};

/// Matching triple of an incoming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionKey<'a> {
    pub date_session: DateTime<Utc>,
    pub id_configuration: i32,
    pub action: &'a str,
}

/// What to do with an incoming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// No stored session shares the triple
    Apply,
    /// Stored session at `index` is shorter than the incoming report
    Update { index: usize },
    /// Stored session at `index` is at least as long (ties included)
    Skip { index: usize },
}

/// Compare an incoming session against a game's stored activities.
pub fn match_session(
    items: &[Activity],
    key: &SessionKey<'_>,
    elapsed_seconds: u64,
) -> MatchOutcome {
    let found = items
        .iter()
        .position(|a| a.matches(key.date_session, key.id_configuration, key.action));

    match found {
        None => MatchOutcome::Apply,
        Some(index) if elapsed_seconds > items[index].elapsed_seconds => {
            MatchOutcome::Update { index }
        }
        Some(index) => MatchOutcome::Skip { index },
    }
}
