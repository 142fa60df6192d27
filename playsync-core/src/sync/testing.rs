//! In-memory [`ActivityStore`] for engine tests.

use crate::error::{Error, Result};
use crate::store::ActivityStore;
use crate::types::{Game, GameActivities};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Store double with switchable failure modes.
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub loaded: bool,
    pub games: HashMap<Uuid, Game>,
    pub collections: Mutex<HashMap<Uuid, GameActivities>>,
    /// Writes for this game fail
    pub failing_game: Option<Uuid>,
    /// This game has no activity collection
    pub without_collection: Option<Uuid>,
    /// Full traversals fail
    pub failing_list: bool,
}

impl MemoryStore {
    pub fn with_games(games: &[Game]) -> Self {
        Self {
            loaded: true,
            games: games.iter().map(|g| (g.id, g.clone())).collect(),
            ..Default::default()
        }
    }

    pub fn collection(&self, id: &Uuid) -> GameActivities {
        self.collections.lock().unwrap()[id].clone()
    }
}

impl ActivityStore for MemoryStore {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn get_game(&self, id: &Uuid) -> Result<Option<Game>> {
        Ok(self.games.get(id).cloned())
    }

    fn list_game_activities(&self) -> Result<Vec<GameActivities>> {
        if self.failing_list {
            return Err(Error::InvalidRecord("traversal interrupted".to_string()));
        }
        Ok(self.collections.lock().unwrap().values().cloned().collect())
    }

    fn get_game_activities(&self, game: &Game) -> Result<Option<GameActivities>> {
        if self.without_collection == Some(game.id) {
            return Ok(None);
        }
        let mut collections = self.collections.lock().unwrap();
        Ok(Some(
            collections
                .entry(game.id)
                .or_insert_with(|| GameActivities::empty(game.clone()))
                .clone(),
        ))
    }

    fn update_game_activities(&self, activities: &GameActivities) -> Result<()> {
        if self.failing_game == Some(activities.game.id) {
            return Err(Error::InvalidRecord(format!("cannot write {}", activities.game.name)));
        }
        self.collections
            .lock()
            .unwrap()
            .insert(activities.game.id, activities.clone());
        Ok(())
    }
}
