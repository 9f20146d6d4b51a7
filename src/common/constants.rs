//! Application-wide constants and default values.
//!
//! Defaults here are used both when generating a fresh `lightly.toml` and when
//! a loaded configuration leaves a field unset.

use std::time::Duration;

// # Sun cycle

/// Minutes in a full day, the denominator of every cycle position.
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Length of the fade window around sunrise and sunset, in minutes.
pub const TWILIGHT_TRANSITION_MINUTES: f64 = 90.0;

/// The fade window expressed as a fraction of a day.
pub const TWILIGHT_TRANSITION_DISTANCE: f64 = TWILIGHT_TRANSITION_MINUTES / MINUTES_PER_DAY;

/// Format of sunrise/sunset strings handed over by the data provider ("08:00:00 AM").
pub const SUN_TIME_FORMAT: &str = "%I:%M:%S %p";

/// Fallback sunrise used until real data has been fetched.
pub const DEFAULT_SUNRISE: &str = "08:00:00 AM";

/// Fallback sunset used until real data has been fetched.
pub const DEFAULT_SUNSET: &str = "05:00:00 PM";

// # Overlay filters

pub const MINIMUM_INTENSITY: u8 = 0;
pub const MAXIMUM_INTENSITY: u8 = 100;
pub const DEFAULT_COLOR_INTENSITY: u8 = 80;
pub const DEFAULT_BRIGHTNESS_INTENSITY: u8 = 80;

/// Alpha of either filter at intensity 0; each intensity step removes 2.
pub const FILTER_MAX_ALPHA: i32 = 200;

/// Warm tint used for the color temperature filter (alpha is replaced per intensity).
pub const COLOR_FILTER_BASE_ARGB: (u8, u8, u8, u8) = (255, 255, 130, 0);

/// Darkening tint used for the brightness filter.
pub const BRIGHTNESS_FILTER_BASE_ARGB: (u8, u8, u8, u8) = (255, 0, 0, 0);

/// Color temperature range reported for the color filter readout.
pub const COLOR_TEMPERATURE_MIN: u32 = 1800;
pub const COLOR_TEMPERATURE_MAX: u32 = 6000;

// # Scheduling

pub const DEFAULT_REFRESH_INTERVAL: u64 = 15; // minutes
pub const MINIMUM_REFRESH_INTERVAL: u64 = 1;
pub const MAXIMUM_REFRESH_INTERVAL: u64 = 720;

pub const DEFAULT_START_ENABLED: bool = false;

/// Debounce window for config file change events.
pub const CONFIG_WATCH_DEBOUNCE: Duration = Duration::from_millis(500);

// # Process

pub const EXIT_FAILURE: i32 = 1;

pub const CONFIG_FILE_NAME: &str = "lightly.toml";
pub const STATE_FILE_NAME: &str = "state.json";

#[cfg(test)]
pub mod test_constants {
    pub const TEST_SUNRISE: &str = "08:00:00 AM";
    pub const TEST_SUNSET: &str = "05:00:00 PM";
    pub const TEST_STANDARD_INTENSITY: u8 = 80;
}
