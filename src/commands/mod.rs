//! Command-line command handlers for lightly.
//!
//! Every one-shot command lives in its own submodule and exposes a
//! `handle_*_command` entry point plus a `display_help` used by `lightly help`.
//! Commands that change settings only write files; a running instance notices
//! the change through its watcher and applies it.

pub mod help;
pub mod import;
pub mod set;
pub mod simulate;
pub mod status;
pub mod toggle;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{self, Config, validation::validate_config};

/// Path of the config file commands should edit, creating the default file
/// first if there is none yet.
pub(crate) fn resolve_config_path() -> Result<PathBuf> {
    let config_path = Config::get_config_path()?;
    if !config_path.exists() {
        config::create_default_config(&config_path)?;
    }
    Ok(config_path)
}

/// Write already formatted TOML values into the config file at `config_path`.
///
/// The edited text must still parse and validate as a config before anything
/// is written, so a bad value never reaches the file. Comments and alignment
/// of untouched lines are kept. Returns the fields whose value changed.
pub(crate) fn write_config_fields(
    config_path: &Path,
    fields: &[(&str, String)],
) -> Result<Vec<(String, String)>> {
    let original = fs::read_to_string(config_path).with_context(|| {
        format!(
            "Failed to read config from {}",
            crate::common::utils::private_path(config_path)
        )
    })?;

    let mut content = original.clone();
    let mut updated_fields = Vec::new();
    for (field, value) in fields {
        let updated = config::builder::update_field_in_content(&content, field, value);
        if updated != content {
            content = updated;
            updated_fields.push((field.to_string(), value.clone()));
        }
    }

    if content == original {
        return Ok(updated_fields);
    }

    let candidate: Config =
        toml::from_str(&content).context("Updated configuration is not valid TOML")?;
    validate_config(&candidate)?;

    fs::write(config_path, &content).with_context(|| {
        format!(
            "Failed to write config to {}",
            crate::common::utils::private_path(config_path)
        )
    })?;
    Ok(updated_fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_config_fields_keeps_comments() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lightly.toml");
        config::create_default_config(&path).unwrap();

        let updated = write_config_fields(
            &path,
            &[
                ("color_intensity", "35".to_string()),
                ("sunset", "\"08:15:00 PM\"".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(updated.len(), 2);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("color_intensity = 35"));
        assert!(content.contains("sunset = \"08:15:00 PM\""));
        assert!(content.contains("#[Filters]"));

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.color_intensity, Some(35));
        assert_eq!(config.sunset(), "08:15:00 PM");
    }

    #[test]
    fn test_write_config_fields_unchanged_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lightly.toml");
        config::create_default_config(&path).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let updated = write_config_fields(&path, &[("color_intensity", "80".to_string())]).unwrap();
        assert!(updated.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_write_config_fields_rejects_invalid_result() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lightly.toml");
        config::create_default_config(&path).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let result = write_config_fields(&path, &[("refresh_interval", "0".to_string())]);
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }
}
