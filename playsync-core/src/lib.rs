//! # playsync-core
//!
//! Reconciles game play-session records between a local activity store and
//! external sources.
//!
//! This library provides:
//! - Domain types for games, activities, configurations and transfer records
//! - A SQLite-backed activity store
//! - The export pipeline and the import reconciliation engine
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Data flow
//!
//! - **Export:** store → [`TransferSession`] list → JSON
//! - **Import:** JSON → [`TransferSession`] list → configuration resolution
//!   and duplicate matching → store, summarized as an [`ImportResult`]
//!
//! Both directions run under a single process-wide lock taken by [`SyncBridge`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use playsync_core::{Config, SyncBridge};
//!
//! let config = Config::load().expect("failed to load config");
//! let bridge = SyncBridge::open(&config).expect("failed to open activity store");
//!
//! let exported = bridge.export_sessions_json();
//! let result = bridge.import_sessions_json(Some(&exported));
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use store::ActivityStore;
pub use sync::SyncBridge;
pub use system::{LocalSystem, SharedSystem};
pub use types::*;

// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod store;
pub mod sync;
pub mod system;
pub mod types;
