//! Field normalization for incoming sessions.
//!
//! Pure functions, independent of any store: each one picks the first usable
//! candidate from an ordered fallback chain (record value, then game default).

use uuid::Uuid;

/// Parse an identifier. Blank, malformed and nil values are all absent.
pub fn parse_id(raw: Option<&str>) -> Option<Uuid> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| Uuid::parse_str(s).ok())
        .filter(|id| !id.is_nil())
}

/// First candidate list that is not empty, or an empty list.
pub fn first_non_empty<T>(candidates: impl IntoIterator<Item = Vec<T>>) -> Vec<T> {
    candidates
        .into_iter()
        .find(|c| !c.is_empty())
        .unwrap_or_default()
}

/// Incoming source id, else the game default.
pub fn resolve_source_id(incoming: Option<&str>, game_default: Option<Uuid>) -> Option<Uuid> {
    parse_id(incoming).or_else(|| game_default.filter(|id| !id.is_nil()))
}

/// Incoming platform ids (unparseable entries dropped), else the game defaults.
pub fn resolve_platform_ids(incoming: &[String], game_default: &[Uuid]) -> Vec<Uuid> {
    let parsed = incoming
        .iter()
        .filter_map(|raw| parse_id(Some(raw)))
        .collect::<Vec<_>>();
    first_non_empty([parsed, game_default.to_vec()])
}

/// Incoming action name, else the default label when blank.
pub fn resolve_action_name(incoming: Option<&str>, default_label: &str) -> String {
    match incoming {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => default_label.to_string(),
    }
}
