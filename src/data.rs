//! Sun times and location as delivered by the public lookup services.
//!
//! Field names follow the JSON of api.sunrise-sunset.org and ip-api.com so a
//! saved response can be imported as is. Neither service is queried from
//! here; lightly only reads what the user hands it.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::common::constants::{DEFAULT_SUNRISE, DEFAULT_SUNSET, SUN_TIME_FORMAT};
use crate::error::{EngineError, EngineResult};
use crate::sun_cycle::SunCycleModel;

/// Start and end of civil twilight, both `"hh:mm:ss AM/PM"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunriseSunsetData {
    pub civil_twilight_begin: String,
    pub civil_twilight_end: String,
}

#[derive(Debug, Deserialize)]
struct SunriseSunsetResponse {
    results: SunriseSunsetData,
    /// Present when the request asked for a zone other than UTC.
    #[serde(default)]
    tzid: Option<String>,
}

impl SunriseSunsetData {
    pub fn new(
        civil_twilight_begin: impl Into<String>,
        civil_twilight_end: impl Into<String>,
    ) -> Self {
        Self {
            civil_twilight_begin: civil_twilight_begin.into(),
            civil_twilight_end: civil_twilight_end.into(),
        }
    }

    /// Stand-in used until real data is available.
    pub fn fallback() -> Self {
        Self::new(DEFAULT_SUNRISE, DEFAULT_SUNSET)
    }

    /// Parse a sunrise-sunset.org response (`{"results": {...}}`) or a bare
    /// results object.
    ///
    /// Times are expected in UTC, which is what the service returns unless a
    /// `tzid` was requested. Responses for any other zone are rejected.
    pub fn from_json(text: &str) -> Result<Self> {
        if let Ok(response) = serde_json::from_str::<SunriseSunsetResponse>(text) {
            if let Some(tzid) = response.tzid.filter(|tzid| tzid != "UTC") {
                anyhow::bail!("Sun data is in {tzid}, request it without tzid to get UTC times");
            }
            return Ok(response.results);
        }
        serde_json::from_str::<Self>(text)
            .context("Sun data is neither a sunrise-sunset.org response nor a results object")
    }

    /// Both times present.
    pub fn is_valid(&self) -> bool {
        !self.civil_twilight_begin.trim().is_empty() && !self.civil_twilight_end.trim().is_empty()
    }

    /// Whether this is the built-in stand-in rather than fetched data.
    pub fn is_fallback(&self) -> bool {
        self.civil_twilight_begin == DEFAULT_SUNRISE && self.civil_twilight_end == DEFAULT_SUNSET
    }

    pub fn to_model(&self) -> EngineResult<SunCycleModel> {
        SunCycleModel::new(&self.civil_twilight_begin, &self.civil_twilight_end)
    }

    /// Convert both UTC times to wall-clock times in `zone` on `date`.
    pub fn utc_to_zone<Tz: TimeZone>(&self, date: NaiveDate, zone: &Tz) -> EngineResult<Self> {
        Ok(Self::new(
            utc_sun_time_in(&self.civil_twilight_begin, date, zone)?,
            utc_sun_time_in(&self.civil_twilight_end, date, zone)?,
        ))
    }
}

/// Re-express an `"hh:mm:ss AM/PM"` UTC time as the same instant in `zone`.
pub fn utc_sun_time_in<Tz: TimeZone>(
    time: &str,
    date: NaiveDate,
    zone: &Tz,
) -> EngineResult<String> {
    let parsed = NaiveTime::parse_from_str(time.trim(), SUN_TIME_FORMAT).map_err(|_| {
        EngineError::InvalidTimeFormat {
            input: time.to_string(),
        }
    })?;
    let local = Utc
        .from_utc_datetime(&date.and_time(parsed))
        .with_timezone(zone);
    Ok(local.time().format(SUN_TIME_FORMAT).to_string())
}

impl Default for SunriseSunsetData {
    fn default() -> Self {
        Self::fallback()
    }
}

const UNKNOWN: &str = "Unknown";

/// Rough location of the machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    /// Usually the largest nearby city.
    #[serde(rename = "regionName")]
    pub region_name: String,
    pub country: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl LocationData {
    /// Unknown place with central Stockholm coordinates.
    pub fn fallback() -> Self {
        Self {
            region_name: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
            latitude: 59.32,
            longitude: 18.07,
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Location data is not a valid ip-api.com response")
    }

    pub fn is_valid(&self) -> bool {
        !self.region_name.trim().is_empty() && !self.country.trim().is_empty()
    }

    /// `"Region, Country"`, or `"Unknown location"` for the fallback.
    pub fn humanized(&self) -> String {
        if self.region_name == UNKNOWN && self.country == UNKNOWN {
            "Unknown location".to_string()
        } else {
            format!("{}, {}", self.region_name, self.country)
        }
    }
}

impl Default for LocationData {
    fn default() -> Self {
        Self::fallback()
    }
}
