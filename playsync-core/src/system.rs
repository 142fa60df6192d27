//! Local system state shared by every game: the configuration list.
//!
//! Configurations form a single ordered, append-only list. Activities refer
//! to a configuration by its position, so entries are never removed or
//! reordered. The whole list is written to a side file
//! (`Configurations.json` in the user-data directory) every time it grows.
//!
//! A side file is read at most once per process: [`LocalSystem::shared`]
//! hands every caller naming the same file the same in-memory list.

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::types::SystemConfiguration;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Configuration list shared between bridges.
pub type SharedSystem = Arc<Mutex<LocalSystem>>;

/// Lists opened in this process, keyed by side-file path.
static OPEN_SYSTEMS: OnceLock<Mutex<HashMap<PathBuf, SharedSystem>>> = OnceLock::new();

#[derive(Debug, Clone, Default)]
pub struct LocalSystem {
    configurations: Vec<SystemConfiguration>,
    default_configuration: i32,
    side_file: Option<PathBuf>,
}

impl LocalSystem {
    /// In-memory list with no side file.
    pub fn new(configurations: Vec<SystemConfiguration>, default_configuration: i32) -> Self {
        Self {
            configurations,
            default_configuration,
            side_file: None,
        }
    }

    /// The process-wide list for the configured side file.
    ///
    /// The first call for a path loads the file; later calls return the same
    /// list, so indices handed out through one handle are seen by all others.
    /// The default configuration index is taken from the first caller.
    pub fn shared(config: &SyncConfig) -> Result<SharedSystem> {
        let path = config.configurations_path();
        let registry = OPEN_SYSTEMS.get_or_init(Default::default);
        let mut open = registry.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(system) = open.get(&path) {
            return Ok(Arc::clone(system));
        }

        let system = Arc::new(Mutex::new(Self::open(config)?));
        open.insert(path, Arc::clone(&system));
        Ok(system)
    }

    /// Load the list from the configured side file.
    ///
    /// A missing or empty file yields an empty list. A file that cannot be
    /// read or parsed is an error: starting empty would hand its indices out
    /// again on the next append.
    pub(crate) fn open(config: &SyncConfig) -> Result<Self> {
        let path = config.configurations_path();
        let configurations = load_configurations(&path).map_err(|e| {
            Error::Config(format!("failed to read configuration list {:?}: {}", path, e))
        })?;

        tracing::debug!(
            path = %path.display(),
            count = configurations.len(),
            "Loaded configuration list"
        );

        Ok(Self {
            configurations,
            default_configuration: config.default_configuration,
            side_file: Some(path),
        })
    }

    /// Wrap a list in its own lock, outside the process-wide registry.
    pub fn into_shared(self) -> SharedSystem {
        Arc::new(Mutex::new(self))
    }

    pub fn configurations(&self) -> &[SystemConfiguration] {
        &self.configurations
    }

    /// Globally configured default configuration index
    pub fn default_configuration(&self) -> i32 {
        self.default_configuration
    }

    pub fn side_file(&self) -> Option<&Path> {
        self.side_file.as_deref()
    }

    /// Whether `index` is a valid position in the list.
    pub fn contains_index(&self, index: i32) -> bool {
        usize::try_from(index).is_ok_and(|i| i < self.configurations.len())
    }

    /// Name of the configuration at `index`, if in range and named.
    pub fn configuration_name(&self, index: i32) -> Option<&str> {
        let index = usize::try_from(index).ok()?;
        self.configurations.get(index)?.name.as_deref()
    }

    /// Position of the first configuration whose name equals `name`, ignoring case.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.configurations
            .iter()
            .position(|c| c.name.as_deref().is_some_and(|n| n.to_lowercase() == wanted))
    }

    /// Append a configuration and return its index.
    pub(crate) fn push(&mut self, configuration: SystemConfiguration) -> usize {
        self.configurations.push(configuration);
        self.configurations.len() - 1
    }

    /// Overwrite the side file with the full list.
    ///
    /// Does nothing when the list has no side file.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.side_file else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.configurations)?;
        std::fs::write(path, json)?;

        tracing::debug!(
            path = %path.display(),
            count = self.configurations.len(),
            "Saved configuration list"
        );
        Ok(())
    }
}

fn load_configurations(path: &Path) -> Result<Vec<SystemConfiguration>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&content)?)
}
