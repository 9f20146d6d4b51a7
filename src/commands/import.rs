//! `lightly import`: bring in sun times or a location saved from a lookup service.
//!
//! lightly never goes online itself. A response from api.sunrise-sunset.org or
//! ip-api.com saved to a file can be handed over here. Data that fails
//! validation is rejected and whatever was stored before stays in effect.
//! Sun times arrive in UTC and are stored as local wall-clock times.

use anyhow::{Context, Result};
use chrono::{Local, TimeZone, Utc};
use std::fs;
use std::path::Path;

use crate::args::ImportKind;
use crate::common::utils::private_path;
use crate::data::{LocationData, SunriseSunsetData};
use crate::state::{PersistedState, current_state_dir};

pub fn handle_import_command(kind: ImportKind, path: &str, debug_enabled: bool) -> Result<()> {
    log_version!();

    let file = Path::new(path);
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", private_path(file)))?;

    match kind {
        ImportKind::Sun => {
            let config_path = super::resolve_config_path()?;
            let data = import_sun_times_into(&config_path, &text, &Local)?;
            log_block_start!("Imported sun times");
            log_indented!("Sunrise: {}", data.civil_twilight_begin);
            log_indented!("Sunset: {}", data.civil_twilight_end);
            if data.is_fallback() {
                log_indented!("These are the built-in defaults");
            }
            if debug_enabled {
                log_indented!("Written to {}", private_path(&config_path));
            }
        }
        ImportKind::Location => {
            let state_dir = current_state_dir()?;
            let location = import_location_into(&state_dir, &text)?;
            log_block_start!("Imported location: {}", location.humanized());
            if debug_enabled {
                log_indented!(
                    "Coordinates: {:.4}, {:.4}",
                    location.latitude,
                    location.longitude
                );
                log_indented!("Stored in {}", private_path(&state_dir));
            }
        }
    }

    log_end!();
    Ok(())
}

/// Validate a UTC sun data payload, convert it to `zone` and write it into
/// the config at `config_path`.
pub fn import_sun_times_into<Tz: TimeZone>(
    config_path: &Path,
    text: &str,
    zone: &Tz,
) -> Result<SunriseSunsetData> {
    let utc = SunriseSunsetData::from_json(text)?;
    if !utc.is_valid() {
        anyhow::bail!("Sun data is missing sunrise or sunset, keeping the current sun times");
    }
    let data = utc
        .utc_to_zone(Utc::now().date_naive(), zone)
        .context("Sun data cannot be used, keeping the current sun times")?;

    super::write_config_fields(
        config_path,
        &[
            ("sunrise", format!("\"{}\"", data.civil_twilight_begin)),
            ("sunset", format!("\"{}\"", data.civil_twilight_end)),
        ],
    )?;
    Ok(data)
}

/// Validate a location payload and store it in the state under `state_dir`.
pub fn import_location_into(state_dir: &Path, text: &str) -> Result<LocationData> {
    let location = LocationData::from_json(text)?;
    if !location.is_valid() {
        anyhow::bail!("Location is missing its region or country, keeping the current location");
    }

    let mut state = PersistedState::load_from(state_dir)?;
    state.location = location.clone();
    state.save_to(state_dir)?;
    Ok(location)
}

/// Display help for the import command
pub fn display_help() {
    log_version!();
    log_block_start!("import - Import sun times or a location from a JSON file");
    log_block_start!("Usage: lightly import <sun|location> <FILE>");
    log_block_start!("Kinds:");
    log_indented!("sun        A sunrise-sunset.org response in UTC; updates sunrise and sunset");
    log_indented!("location   An ip-api.com response; shown by 'lightly status'");
    log_block_start!("Examples:");
    log_indented!(
        "curl -s 'https://api.sunrise-sunset.org/json?lat=59.3&lng=18.1' > sun.json"
    );
    log_indented!("lightly import sun sun.json");
    log_pipe!();
    log_indented!("curl -s http://ip-api.com/json > location.json");
    log_indented!("lightly import location location.json");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, create_default_config};
    use tempfile::tempdir;

    const SUN_RESPONSE: &str = r#"{
        "results": {
            "sunrise": "7:27:02 AM",
            "sunset": "5:05:55 PM",
            "civil_twilight_begin": "06:58:14 AM",
            "civil_twilight_end": "05:34:43 PM"
        },
        "status": "OK"
    }"#;

    #[test]
    fn test_import_sun_times_updates_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lightly.toml");
        create_default_config(&path).unwrap();

        let data = import_sun_times_into(&path, SUN_RESPONSE, &Utc).unwrap();
        assert_eq!(data.civil_twilight_begin, "06:58:14 AM");

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.sunrise(), "06:58:14 AM");
        assert_eq!(config.sunset(), "05:34:43 PM");
    }

    #[test]
    fn test_import_bad_sun_times_keeps_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lightly.toml");
        create_default_config(&path).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let bad = r#"{"civil_twilight_begin": "sometime", "civil_twilight_end": "05:34:43 PM"}"#;
        assert!(import_sun_times_into(&path, bad, &Utc).is_err());

        let empty = r#"{"civil_twilight_begin": "", "civil_twilight_end": ""}"#;
        assert!(import_sun_times_into(&path, empty, &Utc).is_err());

        assert!(import_sun_times_into(&path, "not json", &Utc).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_import_sun_times_converts_to_local_zone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lightly.toml");
        create_default_config(&path).unwrap();

        let text = r#"{
            "results": {"civil_twilight_begin": "2:11:02 AM", "civil_twilight_end": "8:57:31 PM"},
            "status": "OK",
            "tzid": "UTC"
        }"#;
        let zone = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        let data = import_sun_times_into(&path, text, &zone).unwrap();
        assert_eq!(data.civil_twilight_begin, "04:11:02 AM");

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.sunrise(), "04:11:02 AM");
        assert_eq!(config.sunset(), "10:57:31 PM");
    }

    #[test]
    fn test_import_location_into_state() {
        let dir = tempdir().unwrap();
        let text = r#"{
            "status": "success",
            "country": "Sweden",
            "regionName": "Stockholm",
            "lat": 59.3293,
            "lon": 18.0686
        }"#;

        let location = import_location_into(dir.path(), text).unwrap();
        assert_eq!(location.humanized(), "Stockholm, Sweden");

        let state = PersistedState::load_from(dir.path()).unwrap();
        assert_eq!(state.location, location);
        assert!(!state.has_dummy_location());
    }

    #[test]
    fn test_import_location_rejects_blank_region() {
        let dir = tempdir().unwrap();
        let text = r#"{"country": "Sweden", "regionName": " ", "lat": 1.0, "lon": 2.0}"#;
        assert!(import_location_into(dir.path(), text).is_err());
        assert!(PersistedState::load_from(dir.path()).unwrap().has_dummy_location());
    }
}
