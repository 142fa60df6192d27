//! Configuration name -> index resolution.

use crate::error::{Error, Result};
use crate::system::LocalSystem;
use crate::types::SystemConfiguration;

/// Resolve the configuration index for an incoming session.
///
/// A non-blank `name` wins: it is matched case-insensitively against the
/// list, and appended (then persisted) when unseen. Without a name,
/// `fallback_index` is kept if it is a valid position, otherwise the
/// system default (never negative) is used.
///
/// Persisting the grown list is best-effort. A failed write is logged and
/// dropped; the in-memory list keeps the new entry, so later records in the
/// same batch resolve to the same index.
pub fn resolve_configuration(
    system: &mut LocalSystem,
    name: Option<&str>,
    fallback_index: i32,
) -> Result<i32> {
    let name = name.map(str::trim).filter(|n| !n.is_empty());

    let Some(name) = name else {
        if system.contains_index(fallback_index) {
            return Ok(fallback_index);
        }
        return Ok(system.default_configuration().max(0));
    };

    if let Some(index) = system.position_of(name) {
        return to_index(index);
    }

    let index = system.push(SystemConfiguration::named(name));
    tracing::info!(configuration = name, index, "Created configuration");

    if let Err(e) = system.save() {
        tracing::warn!(
            configuration = name,
            error = %e,
            "Failed to persist configuration list, keeping it in memory"
        );
    }

    to_index(index)
}

fn to_index(index: usize) -> Result<i32> {
    i32::try_from(index)
        .map_err(|_| Error::InvalidRecord(format!("configuration index overflow: {}", index)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use tempfile::TempDir;

    fn system_with(names: &[&str], default_configuration: i32) -> LocalSystem {
        LocalSystem::new(
            names.iter().map(|n| SystemConfiguration::named(*n)).collect(),
            default_configuration,
        )
    }

    fn resolve(system: &mut LocalSystem, name: Option<&str>, fallback_index: i32) -> i32 {
        resolve_configuration(system, name, fallback_index).unwrap()
    }

    #[test]
    fn test_existing_name_matches_case_insensitively() {
        let mut system = system_with(&["Desktop", "Speedrun"], 0);

        assert_eq!(resolve(&mut system, Some("speedrun"), 0), 1);
        assert_eq!(resolve(&mut system, Some("  DESKTOP "), 1), 0);
        assert_eq!(system.configurations().len(), 2);
    }

    #[test]
    fn test_unseen_name_is_appended_once() {
        let mut system = system_with(&["Desktop"], 0);

        let first = resolve(&mut system, Some("  Speedrun "), -1);
        let second = resolve(&mut system, Some("SPEEDRUN"), -1);

        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(system.configurations().len(), 2);
        assert_eq!(system.configuration_name(1), Some("Speedrun"));
    }

    #[test]
    fn test_name_preferred_over_index_hint() {
        let mut system = system_with(&["Desktop", "Laptop"], 0);
        assert_eq!(resolve(&mut system, Some("Laptop"), 0), 1);
    }

    #[test]
    fn test_blank_name_uses_index_in_range() {
        let mut system = system_with(&["Desktop", "Laptop"], 0);

        assert_eq!(resolve(&mut system, None, 1), 1);
        assert_eq!(resolve(&mut system, Some("   "), 0), 0);
        assert_eq!(system.configurations().len(), 2);
    }

    #[test]
    fn test_out_of_range_index_uses_default() {
        let mut system = system_with(&["Desktop"], 4);
        assert_eq!(resolve(&mut system, None, 7), 4);
        assert_eq!(resolve(&mut system, None, -1), 4);

        let mut negative_default = system_with(&[], -3);
        assert_eq!(resolve(&mut negative_default, None, 0), 0);
    }

    #[test]
    fn test_new_name_is_persisted() {
        let dir = TempDir::new().unwrap();
        let config = SyncConfig {
            user_data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let mut system = LocalSystem::open(&config).unwrap();

        resolve(&mut system, Some("Speedrun"), -1);

        let saved = std::fs::read_to_string(config.configurations_path()).unwrap();
        let list: Vec<SystemConfiguration> = serde_json::from_str(&saved).unwrap();
        assert_eq!(list, vec![SystemConfiguration::named("Speedrun")]);
    }

    #[test]
    fn test_new_name_extends_loaded_list() {
        let dir = TempDir::new().unwrap();
        let config = SyncConfig {
            user_data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        std::fs::write(
            config.configurations_path(),
            r#"[{"Name":"Desktop"},{"Name":"Laptop"}]"#,
        )
        .unwrap();
        let mut system = LocalSystem::open(&config).unwrap();

        assert_eq!(resolve(&mut system, Some("Speedrun"), -1), 2);

        let reopened = LocalSystem::open(&config).unwrap();
        assert_eq!(reopened.configuration_name(0), Some("Desktop"));
        assert_eq!(reopened.configuration_name(2), Some("Speedrun"));
    }

    #[test]
    fn test_persist_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        // A regular file where the user-data directory should be
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "").unwrap();
        let config = SyncConfig {
            user_data_dir: Some(blocker.join("nested")),
            ..Default::default()
        };
        let mut system = LocalSystem::open(&config).unwrap();

        let index = resolve(&mut system, Some("Speedrun"), -1);

        assert_eq!(index, 0);
        assert_eq!(system.configuration_name(0), Some("Speedrun"));
        assert!(system.save().is_err());
    }
}
