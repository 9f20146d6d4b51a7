//! `lightly status`: where the sun is and what the overlay would show.

use anyhow::{Context, Result};
use chrono::{NaiveTime, Timelike};
use serde::Serialize;

use crate::color::ArgbColor;
use crate::common::constants::MINUTES_PER_DAY;
use crate::common::utils::humanize_hours;
use crate::config::Config;
use crate::overlay::{OverlayColorPolicy, OverlayIntensities};
use crate::state::PersistedState;
use crate::sun_cycle::{SunCycleSnapshot, SunEvent};

/// Everything `status` reports, also the shape of `status --json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub time: String,
    pub sunrise: String,
    pub sunset: String,
    pub is_active: bool,
    pub is_daylight: bool,
    pub next_event: SunEvent,
    pub minutes_until_next_event: u32,
    pub overlay_color: ArgbColor,
    pub overlay_color_hex: String,
    pub color_temperature: u32,
    pub brightness_percent: u32,
    pub intensities: OverlayIntensities,
    pub location: String,
    pub location_is_fallback: bool,
    pub cycle: SunCycleSnapshot,
}

/// Compute the report for `time` from already loaded config and state.
pub fn build_status_report(
    config: &Config,
    state: &PersistedState,
    time: NaiveTime,
) -> Result<StatusReport> {
    let model = config.sun_model()?;
    let policy = OverlayColorPolicy::with_intensities(config.intensities());
    let instant = model.sample(&time);
    let overlay_color = policy.overlay_color_at(instant, &model);
    let (next_event, fraction) = model.next_event(instant);

    Ok(StatusReport {
        time: time.format("%H:%M").to_string(),
        sunrise: config.sunrise().to_string(),
        sunset: config.sunset().to_string(),
        is_active: state.is_active,
        is_daylight: model.is_daylight(instant),
        next_event,
        minutes_until_next_event: (fraction * MINUTES_PER_DAY).round() as u32,
        overlay_color,
        overlay_color_hex: overlay_color.to_string(),
        color_temperature: policy.color_temperature(),
        brightness_percent: policy.brightness_percent(),
        intensities: policy.intensities(),
        location: state.location.humanized(),
        location_is_fallback: state.has_dummy_location(),
        cycle: model.snapshot(instant),
    })
}

pub fn handle_status_command(at: Option<NaiveTime>, json: bool, debug_enabled: bool) -> Result<()> {
    let time = at.unwrap_or_else(|| {
        let now = crate::time_source::now();
        NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(NaiveTime::MIN)
    });

    // Keep stdout pure JSON; creating a default config would log.
    if json {
        crate::logger::Log::set_enabled(false);
    }
    let config = Config::load();
    let state = PersistedState::load();
    if json {
        crate::logger::Log::set_enabled(true);
    }

    let report = build_status_report(&config?, &state?, time)?;

    if json {
        let text =
            serde_json::to_string_pretty(&report).context("Failed to serialize status report")?;
        crate::logger::write_output(&format!("{text}\n"));
        return Ok(());
    }

    display_report(&report, debug_enabled);
    Ok(())
}

fn display_report(report: &StatusReport, debug_enabled: bool) {
    log_version!();

    log_block_start!(
        "Overlay is {}",
        if report.is_active { "enabled" } else { "disabled" }
    );
    log_indented!("Location: {}", report.location);

    log_block_start!("Sun at {}", report.time);
    log_indented!(
        "{}",
        if report.is_daylight { "Daytime" } else { "Nighttime" }
    );
    log_indented!("Sunrise: {}", report.sunrise);
    log_indented!("Sunset: {}", report.sunset);
    log_indented!(
        "Next {} in {}",
        report.next_event,
        humanize_hours(report.minutes_until_next_event / 60)
    );

    log_block_start!("Overlay color {}", report.overlay_color_hex);
    log_indented!(
        "Color intensity {} (~{}K)",
        report.intensities.color_intensity(),
        report.color_temperature
    );
    log_indented!(
        "Brightness intensity {} (~{}% brightness)",
        report.intensities.brightness_intensity(),
        report.brightness_percent
    );

    if debug_enabled {
        let cycle = &report.cycle;
        log_block_start!("Sun cycle");
        log_indented!("Sun position: {:.4}", cycle.sun_position.value());
        log_indented!("Sun height: {:.4}", cycle.sun_vertical);
        log_indented!("Sunrise position: {:.4}", cycle.sunrise_position.value());
        log_indented!("Sunset position: {:.4}", cycle.sunset_position.value());
        log_indented!("Cycle offset: {:.4}", cycle.cycle_offset.value());
        log_indented!("Twilight height: {:.4}", cycle.twilight_vertical);
    }

    log_end!();
}

/// Display help for the status command
pub fn display_help() {
    log_version!();
    log_block_start!("status - Show the sun position and overlay color");
    log_block_start!("Usage: lightly status [--at HH:MM] [--json]");
    log_block_start!("Options:");
    log_indented!("--at HH:MM   Report for another time of day instead of now");
    log_indented!("--json       Print the report as JSON");
    log_block_start!("Examples:");
    log_indented!("lightly status");
    log_indented!("lightly status --at 23:30");
    log_indented!("lightly --debug status");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> Config {
        Config {
            color_intensity: Some(80),
            brightness_intensity: Some(80),
            sunrise: Some("08:00:00 AM".to_string()),
            sunset: Some("05:00:00 PM".to_string()),
            refresh_interval: Some(15),
            start_enabled: Some(false),
        }
    }

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_midday_report() {
        let report =
            build_status_report(&default_config(), &PersistedState::default(), at(12, 0)).unwrap();
        assert!(report.is_daylight);
        assert!(report.overlay_color.is_transparent());
        assert_eq!(report.next_event, SunEvent::Sunset);
        assert_eq!(report.minutes_until_next_event, 5 * 60);
        assert_eq!(report.location, "Unknown location");
        assert!(report.location_is_fallback);
        assert_eq!(report.time, "12:00");
    }

    #[test]
    fn test_midnight_report_uses_full_alpha() {
        let config = default_config();
        let report = build_status_report(&config, &PersistedState::default(), at(0, 0)).unwrap();
        let max = OverlayColorPolicy::with_intensities(config.intensities()).overlay_color_max();
        assert!(!report.is_daylight);
        assert_eq!(report.overlay_color, max);
        assert_eq!(report.next_event, SunEvent::Sunrise);
        assert_eq!(report.minutes_until_next_event, 8 * 60);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let state = PersistedState {
            is_active: true,
            ..PersistedState::default()
        };
        let report = build_status_report(&default_config(), &state, at(22, 15)).unwrap();
        let value: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["is_active"], true);
        assert_eq!(value["next_event"], "sunrise");
        assert_eq!(value["time"], "22:15");
        assert!(value["cycle"]["cycle_offset"].is_number());
        assert!(value["overlay_color_hex"].as_str().unwrap().starts_with('#'));
    }

    #[test]
    fn test_bad_sun_times_are_reported() {
        let config = Config {
            sunset: Some("whenever".to_string()),
            ..default_config()
        };
        assert!(build_status_report(&config, &PersistedState::default(), at(1, 0)).is_err());
    }
}
