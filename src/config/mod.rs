//! Configuration for lightly.
//!
//! Settings live in `lightly.toml` under `$XDG_CONFIG_HOME/lightly/` (or the
//! directory given with `--config`). A commented default file is written the
//! first time lightly runs without one.
//!
//! ```toml
//! #[Filters]
//! color_intensity = 80        # Warm filter strength, 0 (strongest) to 100 (off)
//! brightness_intensity = 80   # Dimming filter strength, 0 (strongest) to 100 (off)
//!
//! #[Sun times]
//! sunrise = "08:00:00 AM"     # Civil twilight begins (hh:mm:ss AM/PM)
//! sunset = "05:00:00 PM"      # Civil twilight ends (hh:mm:ss AM/PM)
//!
//! #[Behavior]
//! refresh_interval = 15       # Minutes between overlay refreshes (1-720)
//! start_enabled = false       # Enable the overlay when lightly starts
//! ```
//!
//! Every field is optional; missing ones are filled with defaults after
//! validation. A running instance reloads the file when it changes.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::overlay::OverlayIntensities;
use crate::sun_cycle::SunCycleModel;

pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use watcher::start_config_watcher;

/// Settings read from `lightly.toml`.
///
/// After [`load`] every field is `Some`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Warm filter strength. 0 is the strongest tint, 100 turns it off.
    pub color_intensity: Option<u32>,
    /// Dimming filter strength. 0 is the darkest, 100 turns it off.
    pub brightness_intensity: Option<u32>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub refresh_interval: Option<u64>, // minutes
    pub start_enabled: Option<bool>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load()
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        load_from_path(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        get_config_path()
    }

    /// Slider values, clamped into range.
    pub fn intensities(&self) -> OverlayIntensities {
        let clamp = |value: Option<u32>, default: u8| {
            value
                .map(|v| v.min(u32::from(MAXIMUM_INTENSITY)) as u8)
                .unwrap_or(default)
        };
        OverlayIntensities::new(
            clamp(self.color_intensity, DEFAULT_COLOR_INTENSITY),
            clamp(self.brightness_intensity, DEFAULT_BRIGHTNESS_INTENSITY),
        )
    }

    pub fn sunrise(&self) -> &str {
        self.sunrise.as_deref().unwrap_or(DEFAULT_SUNRISE)
    }

    pub fn sunset(&self) -> &str {
        self.sunset.as_deref().unwrap_or(DEFAULT_SUNSET)
    }

    /// Build the sun cycle for the configured times.
    pub fn sun_model(&self) -> Result<SunCycleModel> {
        SunCycleModel::new(self.sunrise(), self.sunset())
            .context("Configured sunrise/sunset cannot be used")
    }

    pub fn refresh_interval(&self) -> Duration {
        let minutes = self.refresh_interval.unwrap_or(DEFAULT_REFRESH_INTERVAL);
        Duration::from_secs(minutes * 60)
    }

    pub fn start_enabled(&self) -> bool {
        self.start_enabled.unwrap_or(DEFAULT_START_ENABLED)
    }

    pub fn log_config(&self) {
        match get_config_path() {
            Ok(path) => log_block_start!("Loaded configuration from {}", private_path(&path)),
            Err(_) => log_block_start!("Loaded configuration"),
        }

        let intensities = self.intensities();
        log_indented!(
            "Color intensity: {} (~{}K)",
            intensities.color_intensity(),
            crate::overlay::OverlayColorPolicy::with_intensities(intensities).color_temperature()
        );
        log_indented!(
            "Brightness intensity: {}",
            intensities.brightness_intensity()
        );
        log_indented!("Sunrise: {}", self.sunrise());
        log_indented!("Sunset: {}", self.sunset());

        let minutes = self.refresh_interval.unwrap_or(DEFAULT_REFRESH_INTERVAL);
        log_indented!(
            "Refresh interval: {} {}",
            minutes,
            if minutes == 1 { "minute" } else { "minutes" }
        );
        log_indented!(
            "Start enabled: {}",
            if self.start_enabled() { "yes" } else { "no" }
        );
    }
}
