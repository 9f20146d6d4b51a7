//! Default config generation and in-place field updates.
//!
//! The generated file is aligned so every comment starts in the same column;
//! updates made later by `lightly set` keep each line's comment where it was.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;
use crate::common::utils::private_path;

/// Write a commented default `lightly.toml` at `path`, creating parent
/// directories as needed.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", private_path(path)))?;

    log_block_start!("Created default configuration");
    log_indented!("{}", private_path(path));
    Ok(())
}

/// Text of the default configuration file.
pub fn default_config_content() -> String {
    let mut content = ConfigBuilder::new()
        .add_section("Filters")
        .add_setting(
            "color_intensity",
            &DEFAULT_COLOR_INTENSITY.to_string(),
            &format!(
                "Warm filter strength, {MINIMUM_INTENSITY} (strongest) to {MAXIMUM_INTENSITY} (off)"
            ),
        )
        .add_setting(
            "brightness_intensity",
            &DEFAULT_BRIGHTNESS_INTENSITY.to_string(),
            &format!(
                "Dimming filter strength, {MINIMUM_INTENSITY} (strongest) to {MAXIMUM_INTENSITY} (off)"
            ),
        )
        .add_section("Sun times")
        .add_setting(
            "sunrise",
            &format!("\"{DEFAULT_SUNRISE}\""),
            "Civil twilight begins (hh:mm:ss AM/PM)",
        )
        .add_setting(
            "sunset",
            &format!("\"{DEFAULT_SUNSET}\""),
            "Civil twilight ends (hh:mm:ss AM/PM)",
        )
        .add_section("Behavior")
        .add_setting(
            "refresh_interval",
            &DEFAULT_REFRESH_INTERVAL.to_string(),
            &format!(
                "Minutes between overlay refreshes ({MINIMUM_REFRESH_INTERVAL}-{MAXIMUM_REFRESH_INTERVAL})"
            ),
        )
        .add_setting(
            "start_enabled",
            &DEFAULT_START_ENABLED.to_string(),
            "Enable the overlay when lightly starts",
        )
        .build();
    content.push('\n');
    content
}

/// Builder for configuration files with aligned trailing comments.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        // One space between the longest setting and its comment
        let width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut lines = Vec::new();
        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !lines.is_empty() {
                        lines.push(String::new());
                    }
                    lines.push(title);
                }
                ConfigEntry::Setting { line, comment } => {
                    lines.push(format!("{line:<width$}{comment}"));
                }
            }
        }
        lines.join("\n")
    }
}

/// Find the uncommented line assigning `key`.
pub(crate) fn find_config_line(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .find(|line| {
            let trimmed = line.trim_start();
            trimmed
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='))
        })
        .map(str::to_string)
}

/// Rewrite `key = new_value` while keeping the spacing before the line's comment.
pub(crate) fn preserve_comment_formatting(
    original_line: &str,
    key: &str,
    new_value: &str,
) -> String {
    let key_value_part = format!("{key} = {new_value}");

    // A '#' inside a quoted value is not a comment, so look after the '='.
    let value_start = original_line.find('=').map_or(0, |pos| pos + 1);
    let comment_pos = find_comment_start(&original_line[value_start..]).map(|pos| pos + value_start);

    if let Some(comment_pos) = comment_pos {
        let before_comment = &original_line[..comment_pos];
        let spacing = before_comment
            .rfind(|c: char| !c.is_whitespace())
            .map_or(" ", |last| &before_comment[last + 1..]);
        format!("{key_value_part}{spacing}{}", &original_line[comment_pos..])
    } else {
        key_value_part
    }
}

fn find_comment_start(value_part: &str) -> Option<usize> {
    let mut in_string = false;
    for (index, c) in value_part.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return Some(index),
            _ => {}
        }
    }
    None
}

/// Set `key` to `value` in `content`, appending the assignment if the key is
/// not present yet.
pub fn update_field_in_content(content: &str, key: &str, value: &str) -> String {
    if let Some(line) = find_config_line(content, key) {
        let new_line = preserve_comment_formatting(&line, key, value);
        content.replacen(&line, &new_line, 1)
    } else {
        let mut updated = content.to_string();
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&format!("{key} = {value}\n"));
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_content_aligns_comments() {
        let content = default_config_content();
        let columns: Vec<usize> = content
            .lines()
            .filter(|line| line.contains(" = "))
            .map(|line| line.find('#').unwrap())
            .collect();
        assert_eq!(columns.len(), 6);
        assert!(columns.iter().all(|&c| c == columns[0]));
    }

    #[test]
    fn test_default_content_parses_as_config() {
        let config: super::super::Config = toml::from_str(&default_config_content()).unwrap();
        assert_eq!(config.color_intensity, Some(80));
        assert_eq!(config.sunset.as_deref(), Some("05:00:00 PM"));
        assert_eq!(config.start_enabled, Some(false));
    }

    #[test]
    fn test_find_config_line_matches_whole_key() {
        let content = "# sunrise = \"01:00:00 AM\"\nsunrise_extra = 1\nsunrise = \"06:00:00 AM\" # note\n";
        assert_eq!(
            find_config_line(content, "sunrise").as_deref(),
            Some("sunrise = \"06:00:00 AM\" # note")
        );
        assert_eq!(find_config_line(content, "sunset"), None);
    }

    #[test]
    fn test_preserve_comment_formatting_keeps_spacing() {
        let line = "color_intensity = 80      # Warm filter";
        assert_eq!(
            preserve_comment_formatting(line, "color_intensity", "5"),
            "color_intensity = 5      # Warm filter"
        );
        assert_eq!(
            preserve_comment_formatting("start_enabled = false", "start_enabled", "true"),
            "start_enabled = true"
        );
    }

    #[test]
    fn test_update_field_appends_missing_key() {
        let updated = update_field_in_content("color_intensity = 80", "refresh_interval", "5");
        assert_eq!(updated, "color_intensity = 80\nrefresh_interval = 5\n");
    }
}
