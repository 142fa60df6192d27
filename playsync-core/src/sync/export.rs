//! Flattening the local store into transfer records.

use crate::error::Result;
use crate::store::ActivityStore;
use crate::system::LocalSystem;
use crate::types::{Activity, Game, TransferSession};
use uuid::Uuid;

/// Full snapshot of every activity that has a session timestamp.
pub(crate) fn export_snapshot(
    store: &dyn ActivityStore,
    system: &LocalSystem,
) -> Result<Vec<TransferSession>> {
    let mut sessions = Vec::new();

    for collection in store.list_game_activities()? {
        if collection.game.id.is_nil() {
            continue;
        }
        sessions.extend(
            collection
                .items
                .iter()
                .filter_map(|activity| to_transfer(&collection.game, activity, system)),
        );
    }

    Ok(sessions)
}

fn to_transfer(game: &Game, activity: &Activity, system: &LocalSystem) -> Option<TransferSession> {
    let date_session = activity.date_session?;

    let source_id = activity
        .source_id
        .filter(|id| !id.is_nil())
        .or(game.source_id)
        .unwrap_or_else(Uuid::nil);
    let platform_ids = activity
        .platform_ids
        .as_ref()
        .unwrap_or(&game.platform_ids)
        .iter()
        .map(Uuid::to_string)
        .collect();

    Some(TransferSession {
        game_id: Some(game.id.to_string()),
        source_id: Some(source_id.to_string()),
        platform_ids,
        id_configuration: activity.id_configuration,
        configuration_name: system
            .configuration_name(activity.id_configuration)
            .map(str::to_string),
        game_action_name: activity.game_action_name.clone(),
        date_session_utc: date_session,
        elapsed_seconds: activity.elapsed_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SystemConfiguration;
    use chrono::{TimeZone, Utc};

    fn game() -> Game {
        Game {
            id: Uuid::new_v4(),
            name: "Hades".to_string(),
            source_id: Some(Uuid::new_v4()),
            platform_ids: vec![Uuid::new_v4()],
        }
    }

    fn activity() -> Activity {
        Activity {
            id: Some(1),
            id_configuration: 0,
            game_action_name: Some("Play".to_string()),
            date_session: Some(Utc.with_ymd_and_hms(2023, 11, 2, 9, 0, 0).unwrap()),
            source_id: None,
            platform_ids: None,
            elapsed_seconds: 3600,
        }
    }

    fn system() -> LocalSystem {
        LocalSystem::new(vec![SystemConfiguration::named("Desktop")], 0)
    }

    #[test]
    fn test_unset_fields_fall_back_to_game() {
        let game = game();
        let session = to_transfer(&game, &activity(), &system()).unwrap();

        assert_eq!(session.game_id, Some(game.id.to_string()));
        assert_eq!(session.source_id, game.source_id.map(|id| id.to_string()));
        assert_eq!(session.platform_ids, vec![game.platform_ids[0].to_string()]);
        assert_eq!(session.configuration_name.as_deref(), Some("Desktop"));
        assert_eq!(session.elapsed_seconds, 3600);
    }

    #[test]
    fn test_record_values_win_over_game() {
        let game = game();
        let source = Uuid::new_v4();
        let mut activity = activity();
        activity.source_id = Some(source);
        activity.platform_ids = Some(vec![]);

        let session = to_transfer(&game, &activity, &system()).unwrap();
        assert_eq!(session.source_id, Some(source.to_string()));
        assert!(session.platform_ids.is_empty());
    }

    #[test]
    fn test_missing_source_everywhere_exports_nil() {
        let mut game = game();
        game.source_id = None;

        let session = to_transfer(&game, &activity(), &system()).unwrap();
        assert_eq!(session.source_id, Some(Uuid::nil().to_string()));
    }

    #[test]
    fn test_out_of_range_configuration_has_no_name() {
        let mut activity = activity();
        activity.id_configuration = 5;

        let session = to_transfer(&game(), &activity, &system()).unwrap();
        assert_eq!(session.id_configuration, 5);
        assert!(session.configuration_name.is_none());
    }

    #[test]
    fn test_activity_without_timestamp_is_dropped() {
        let mut activity = activity();
        activity.date_session = None;
        assert!(to_transfer(&game(), &activity, &system()).is_none());
    }
}
