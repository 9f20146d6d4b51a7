//! Set command implementation for modifying configuration fields
//!
//! Updates individual settings in `lightly.toml` without hand-editing the
//! file, keeping its comments. A running instance reloads through its watcher.

use anyhow::{Context, Result};

use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::config::validation::{validate_intensity, validate_sun_time};

/// Fields `lightly set` knows how to write.
pub const SETTABLE_FIELDS: [&str; 6] = [
    "color_intensity",
    "brightness_intensity",
    "sunrise",
    "sunset",
    "refresh_interval",
    "start_enabled",
];

/// Handle the set command - update configuration fields
pub fn handle_set_command(fields: &[(String, String)]) -> Result<()> {
    log_version!();

    // Validate all fields first before making any changes
    let mut validated_fields = Vec::new();
    for (field, value) in fields {
        match validate_field_value(field, value) {
            Ok(formatted_value) => validated_fields.push((field.as_str(), formatted_value)),
            Err(e) => {
                log_pipe!();
                log_error!("Invalid value for field '{}': {}", field, e);
                anyhow::bail!("Configuration validation failed");
            }
        }
    }

    let config_path = super::resolve_config_path()?;
    let updated_fields = super::write_config_fields(&config_path, &validated_fields)?;

    if updated_fields.is_empty() {
        log_block_start!("Configuration unchanged");
        if let [(field, value)] = validated_fields.as_slice() {
            log_indented!("{field} is already set to {value}");
        } else {
            log_indented!("All fields already have the specified values");
        }
    } else {
        log_block_start!("Updated configuration");
        for (field, value) in &updated_fields {
            log_indented!("{field} = {value}");
        }
        log_indented!("in {}", private_path(&config_path));
        log_block_start!("A running lightly applies the change automatically");
    }

    log_end!();
    Ok(())
}

/// Check one `field`/`value` pair and return the value as it should appear in
/// the TOML file.
pub fn validate_field_value(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    match field {
        "color_intensity" | "brightness_intensity" => {
            let intensity = value
                .parse::<u32>()
                .with_context(|| format!("'{value}' is not a whole number"))?;
            validate_intensity(intensity, field)?;
            Ok(intensity.to_string())
        }

        "sunrise" | "sunset" => {
            let unquoted = value.trim_matches(|c| c == '"' || c == '\'');
            validate_sun_time(unquoted, field)?;
            Ok(format!("\"{unquoted}\""))
        }

        "refresh_interval" => {
            let minutes = value
                .parse::<u64>()
                .with_context(|| format!("'{value}' is not a whole number of minutes"))?;
            if !(MINIMUM_REFRESH_INTERVAL..=MAXIMUM_REFRESH_INTERVAL).contains(&minutes) {
                anyhow::bail!(
                    "Refresh interval must be between {} and {} minutes",
                    MINIMUM_REFRESH_INTERVAL,
                    MAXIMUM_REFRESH_INTERVAL
                );
            }
            Ok(minutes.to_string())
        }

        // Accept the usual spellings of a boolean
        "start_enabled" => match value.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok("true".to_string()),
            "false" | "no" | "off" | "0" => Ok("false".to_string()),
            _ => anyhow::bail!("Must be true or false"),
        },

        _ => anyhow::bail!(
            "Unknown field (settable fields: {})",
            SETTABLE_FIELDS.join(", ")
        ),
    }
}

/// Display help for the set command
pub fn display_help() {
    log_version!();
    log_block_start!("set - Update configuration field(s)");
    log_block_start!("Usage: lightly set <field>=<value> [<field>=<value>...]");
    log_indented!("       lightly set <field> <value> [<field> <value>...]");
    log_block_start!("Fields:");
    log_indented!("color_intensity        0 (strongest warm tint) to 100 (off)");
    log_indented!("brightness_intensity   0 (darkest) to 100 (off)");
    log_indented!("sunrise                Civil twilight begins, \"hh:mm:ss AM/PM\"");
    log_indented!("sunset                 Civil twilight ends, \"hh:mm:ss AM/PM\"");
    log_indented!(
        "refresh_interval       Minutes between refreshes ({}-{})",
        MINIMUM_REFRESH_INTERVAL,
        MAXIMUM_REFRESH_INTERVAL
    );
    log_indented!("start_enabled          Switch the overlay on at startup (true/false)");
    log_block_start!("Examples:");
    log_indented!("lightly set color_intensity=40");
    log_indented!("lightly set sunset \"07:45:00 PM\" refresh_interval 5");
    log_end!();
}
