//! Configuration validation.
//!
//! Every check names the offending field and the accepted range so the error
//! can be shown to the user as is.

use anyhow::Result;

use super::Config;
use crate::common::constants::*;
use crate::sun_cycle::TimeOfDay;

pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(value) = config.color_intensity {
        validate_intensity(value, "color_intensity")?;
    }
    if let Some(value) = config.brightness_intensity {
        validate_intensity(value, "brightness_intensity")?;
    }

    if let Some(ref sunrise) = config.sunrise {
        validate_sun_time(sunrise, "sunrise")?;
    }
    if let Some(ref sunset) = config.sunset {
        validate_sun_time(sunset, "sunset")?;
    }

    if let Some(minutes) = config.refresh_interval
        && !(MINIMUM_REFRESH_INTERVAL..=MAXIMUM_REFRESH_INTERVAL).contains(&minutes)
    {
        anyhow::bail!(
            "refresh_interval ({} minutes) must be between {} and {} minutes",
            minutes,
            MINIMUM_REFRESH_INTERVAL,
            MAXIMUM_REFRESH_INTERVAL
        );
    }

    Ok(())
}

pub(crate) fn validate_intensity(value: u32, field: &str) -> Result<()> {
    let range = u32::from(MINIMUM_INTENSITY)..=u32::from(MAXIMUM_INTENSITY);
    if !range.contains(&value) {
        anyhow::bail!(
            "{} ({}) must be between {} and {}",
            field,
            value,
            MINIMUM_INTENSITY,
            MAXIMUM_INTENSITY
        );
    }
    Ok(())
}

pub(crate) fn validate_sun_time(value: &str, field: &str) -> Result<()> {
    TimeOfDay::parse_sun_time(value)
        .map_err(|e| anyhow::anyhow!("{field}: {e} (for example \"07:30:00 PM\")"))?;
    Ok(())
}
