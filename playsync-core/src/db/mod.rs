//! Database layer for playsync
//!
//! This module provides the local activity store using SQLite with:
//! - Schema migrations
//! - Repository operations for games, activities and session details
//! - The [`ActivityStore`](crate::store::ActivityStore) implementation

pub mod repo;
pub mod schema;

pub use repo::Database;
