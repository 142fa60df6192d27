//! Activity store contract
//!
//! The export/import engine never talks to a concrete database. It consumes
//! the operations below, which the host's activity store provides. The
//! SQLite [`Database`](crate::db::Database) is the bundled implementation.
//!
//! Implementations are not expected to be internally synchronized across a
//! read-then-write sequence; callers serialize whole traversals themselves.

use crate::error::Result;
use crate::types::{Game, GameActivities};
use uuid::Uuid;

pub trait ActivityStore: Send + Sync {
    /// Whether the store is ready to be read and written.
    fn is_loaded(&self) -> bool;

    /// Look up a game in the host catalog.
    fn get_game(&self, id: &Uuid) -> Result<Option<Game>>;

    /// Every game that has an activity collection, with its records.
    fn list_game_activities(&self) -> Result<Vec<GameActivities>>;

    /// The activity collection for `game`, created empty if it has none yet.
    ///
    /// `None` means the store cannot provide a collection for this game.
    fn get_game_activities(&self, game: &Game) -> Result<Option<GameActivities>>;

    /// Persist a (possibly mutated) activity collection.
    fn update_game_activities(&self, activities: &GameActivities) -> Result<()>;
}
