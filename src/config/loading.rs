//! Configuration loading.
//!
//! Resolves where `lightly.toml` lives, reads and validates it, and fills in
//! defaults for anything left out.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::Config;
use super::validation::validate_config;
use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::sun_cycle::TimeOfDay;

/// Configuration directory chosen at startup, `None` for the default location.
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for this process. Only the first call wins.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// The directory passed with `--config`, if any.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Path of `lightly.toml`, whether or not it exists yet.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join(CONFIG_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("lightly").join(CONFIG_FILE_NAME))
}

/// Load the configuration, writing a default file first if none exists.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
    }

    load_from_path(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            private_path(&config_path)
        )
    })
}

/// Load configuration from a specific file. Never creates the file.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    validate_config(&config)?;
    apply_defaults(&mut config);
    warn_about_inverted_sun_times(&config);

    Ok(config)
}

fn apply_defaults(config: &mut Config) {
    if config.color_intensity.is_none() {
        config.color_intensity = Some(u32::from(DEFAULT_COLOR_INTENSITY));
    }
    if config.brightness_intensity.is_none() {
        config.brightness_intensity = Some(u32::from(DEFAULT_BRIGHTNESS_INTENSITY));
    }
    if config.sunrise.is_none() {
        config.sunrise = Some(DEFAULT_SUNRISE.to_string());
    }
    if config.sunset.is_none() {
        config.sunset = Some(DEFAULT_SUNSET.to_string());
    }
    if config.refresh_interval.is_none() {
        config.refresh_interval = Some(DEFAULT_REFRESH_INTERVAL);
    }
    if config.start_enabled.is_none() {
        config.start_enabled = Some(DEFAULT_START_ENABLED);
    }
}

/// Sunset before sunrise is accepted (UTC times from the lookup service can
/// wrap past midnight) but the night window is then computed from the plain
/// midpoint, which is rarely what the user wants.
fn warn_about_inverted_sun_times(config: &Config) {
    let (Ok(sunrise), Ok(sunset)) = (
        TimeOfDay::parse_sun_time(config.sunrise()),
        TimeOfDay::parse_sun_time(config.sunset()),
    ) else {
        return;
    };

    if sunset.position() <= sunrise.position() {
        log_pipe!();
        log_warning!(
            "Sunset ({}) is not after sunrise ({})",
            config.sunset(),
            config.sunrise()
        );
        log_indented!("The overlay will treat most of the day as night.");
    }
}

