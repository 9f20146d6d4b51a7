//! Persistent session state, kept under XDG_STATE_HOME.
//!
//! Configuration says how the overlay should look; state records what the
//! user last did with it (switched on or off) and where the machine is. The
//! two are kept apart so that editing `lightly.toml` never loses the session,
//! and so that `lightly enable` can flip the switch of a running instance.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::constants::STATE_FILE_NAME;
use crate::common::utils::private_path;
use crate::config::get_custom_config_dir;
use crate::data::LocationData;

/// Get the state directory for a given configuration directory.
///
/// State is stored in `XDG_STATE_HOME/lightly/{namespace}` where namespace is
/// `default` for the default config directory and `custom_<hash>` for a
/// directory given with `--config`.
pub fn get_state_dir(config_dir: Option<&Path>) -> Result<PathBuf> {
    let state_home = std::env::var("XDG_STATE_HOME")
        .ok()
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/state")))
        .context("Could not determine state directory")?;

    let namespace = match config_dir {
        None => "default".to_string(),
        Some(path) => {
            let default_config = dirs::config_dir().map(|dir| dir.join("lightly"));
            if default_config.as_deref() == Some(path) {
                "default".to_string()
            } else {
                get_state_namespace(path)
            }
        }
    };

    Ok(state_home.join("lightly").join(namespace))
}

/// Stable namespace for a custom config directory.
fn get_state_namespace(config_path: &Path) -> String {
    let canonical = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.to_path_buf());

    let hash = sha256::digest(canonical.to_string_lossy().as_bytes());
    format!("custom_{}", &hash[..16])
}

/// State directory for the config directory this process was started with.
pub fn current_state_dir() -> Result<PathBuf> {
    get_state_dir(get_custom_config_dir().as_deref())
}

/// What survives between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    /// Whether the overlay is switched on.
    pub is_active: bool,
    /// Last imported location. The fallback until one is imported.
    pub location: LocationData,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            is_active: false,
            location: LocationData::fallback(),
        }
    }
}

impl PersistedState {
    /// Whether the location is still the built-in fallback.
    pub fn has_dummy_location(&self) -> bool {
        self.location == LocationData::fallback()
    }

    /// Load the state stored in `state_dir`. A missing file is not an error.
    pub fn load_from(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(STATE_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read state from {}", private_path(&path)))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state from {}", private_path(&path)))
    }

    /// Write the state into `state_dir`, replacing the old file in one step.
    pub fn save_to(&self, state_dir: &Path) -> Result<()> {
        fs::create_dir_all(state_dir).with_context(|| {
            format!(
                "Failed to create state directory {}",
                private_path(state_dir)
            )
        })?;

        let path = state_dir.join(STATE_FILE_NAME);
        let temp_path = state_dir.join(format!(".{STATE_FILE_NAME}.tmp"));
        let content = serde_json::to_string_pretty(self).context("Failed to serialize state")?;

        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write state to {}", private_path(&temp_path)))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to replace state at {}", private_path(&path)))?;
        Ok(())
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&current_state_dir()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_missing_state_is_default() {
        let dir = tempdir().unwrap();
        let state = PersistedState::load_from(dir.path()).unwrap();
        assert_eq!(state, PersistedState::default());
        assert!(!state.is_active);
        assert!(state.has_dummy_location());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("lightly").join("default");
        let state = PersistedState {
            is_active: true,
            location: LocationData {
                region_name: "Uppsala".to_string(),
                country: "Sweden".to_string(),
                latitude: 59.86,
                longitude: 17.64,
            },
        };
        state.save_to(&nested).unwrap();

        let loaded = PersistedState::load_from(&nested).unwrap();
        assert_eq!(loaded, state);
        assert!(!loaded.has_dummy_location());
        assert!(!nested.join(format!(".{STATE_FILE_NAME}.tmp")).exists());
    }

    #[test]
    fn test_partial_state_fills_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(STATE_FILE_NAME), r#"{"is_active": true}"#).unwrap();
        let state = PersistedState::load_from(dir.path()).unwrap();
        assert!(state.is_active);
        assert_eq!(state.location, LocationData::fallback());
    }

    #[test]
    fn test_corrupt_state_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(STATE_FILE_NAME), "{ not json").unwrap();
        let err = PersistedState::load_from(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse state"));
    }

    #[test]
    #[serial]
    fn test_state_dir_namespaces() {
        let dir = tempdir().unwrap();
        let original = std::env::var("XDG_STATE_HOME").ok();
        unsafe {
            std::env::set_var("XDG_STATE_HOME", dir.path());
        }

        let default_dir = get_state_dir(None).unwrap();
        let custom = dir.path().join("my-config");
        fs::create_dir_all(&custom).unwrap();
        let custom_dir = get_state_dir(Some(&custom)).unwrap();
        let custom_again = get_state_dir(Some(&custom)).unwrap();

        unsafe {
            match original {
                Some(val) => std::env::set_var("XDG_STATE_HOME", val),
                None => std::env::remove_var("XDG_STATE_HOME"),
            }
        }

        assert_eq!(default_dir, dir.path().join("lightly").join("default"));
        let namespace = custom_dir.file_name().unwrap().to_string_lossy().to_string();
        assert!(namespace.starts_with("custom_"));
        assert_eq!(namespace.len(), "custom_".len() + 16);
        assert_eq!(custom_dir, custom_again);
    }
}
