//! Normalized model of a day's sun cycle.
//!
//! Every instant is reduced to a [`CyclePosition`], the fraction of a 24 hour
//! day that has passed at that time of day (`0.0` is midnight). A
//! [`SunCycleModel`] is built once from a sunrise/sunset pair and then sampled
//! against the clock as often as needed; new sun data replaces the model as a
//! whole rather than mutating it.
//!
//! The model also carries the phase of the sinusoidal sun path used by the
//! cycle visualization: `vertical = sin(2π·position - 2π·cycle_offset)`, where
//! the offset places solar noon a quarter cycle after the curve's origin.

use chrono::{NaiveTime, Timelike};
use serde::Serialize;
use std::f64::consts::TAU;
use std::fmt;

use crate::common::constants::{DEFAULT_SUNRISE, DEFAULT_SUNSET, MINUTES_PER_DAY, SUN_TIME_FORMAT};
use crate::error::{EngineError, EngineResult};

/// A time of day as a fraction of 24 hours, always in `[0.0, 1.0)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct CyclePosition(f64);

impl CyclePosition {
    pub const MIDNIGHT: CyclePosition = CyclePosition(0.0);

    /// Wrap any value into `[0.0, 1.0)`.
    pub fn wrapping(value: f64) -> Self {
        let wrapped = value.rem_euclid(1.0);
        // rem_euclid of a tiny negative rounds up to exactly 1.0
        if wrapped >= 1.0 || wrapped.is_nan() {
            CyclePosition(0.0)
        } else {
            CyclePosition(wrapped)
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Plain (non-circular) distance between two positions.
    pub fn distance(self, other: CyclePosition) -> f64 {
        (self.0 - other.0).abs()
    }

    /// Fraction of a day from `self` forward to `later`, wrapping past midnight.
    pub fn forward_to(self, later: CyclePosition) -> f64 {
        (later.0 - self.0).rem_euclid(1.0)
    }

    /// The wall-clock time this position corresponds to, to the minute.
    pub fn to_naive_time(self) -> NaiveTime {
        let minutes = (self.0 * MINUTES_PER_DAY).round() as u32 % 1440;
        NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for CyclePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Hour and minute extracted from a timestamp. Seconds and date are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    pub fn of<T: Timelike>(time: &T) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
        }
    }

    /// Parse a sunrise/sunset string such as `"05:00:00 PM"`.
    pub fn parse_sun_time(input: &str) -> EngineResult<Self> {
        NaiveTime::parse_from_str(input.trim(), SUN_TIME_FORMAT)
            .map(|time| Self::of(&time))
            .map_err(|_| EngineError::InvalidTimeFormat {
                input: input.to_string(),
            })
    }

    pub fn position(self) -> CyclePosition {
        CyclePosition::wrapping(
            f64::from(self.hour) / 24.0 + f64::from(self.minute) / MINUTES_PER_DAY,
        )
    }
}

/// The sun's position at one sampled instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunInstant {
    pub sun_position: CyclePosition,
}

/// Which boundary of daylight comes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SunEvent {
    Sunrise,
    Sunset,
}

impl fmt::Display for SunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SunEvent::Sunrise => write!(f, "sunrise"),
            SunEvent::Sunset => write!(f, "sunset"),
        }
    }
}

/// The scalars the sun-cycle visualization draws from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunCycleSnapshot {
    pub sun_position: CyclePosition,
    pub sun_vertical: f64,
    pub sunrise_position: CyclePosition,
    pub sunset_position: CyclePosition,
    pub cycle_offset: CyclePosition,
    pub twilight_vertical: f64,
}

/// A day's sun cycle, immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunCycleModel {
    sunrise_position: CyclePosition,
    sunset_position: CyclePosition,
    cycle_offset: CyclePosition,
    twilight_vertical: f64,
}

impl SunCycleModel {
    /// Build a model from `"hh:mm:ss AM/PM"` sunrise and sunset strings.
    ///
    /// # Errors
    /// [`EngineError::InvalidTimeFormat`] if either string cannot be parsed.
    pub fn new(sunrise: &str, sunset: &str) -> EngineResult<Self> {
        let sunrise = TimeOfDay::parse_sun_time(sunrise)?;
        let sunset = TimeOfDay::parse_sun_time(sunset)?;
        Ok(Self::from_times(sunrise, sunset))
    }

    /// Build a model from already extracted times of day.
    ///
    /// Sunrise and sunset are assumed to fall on the same day. A pair with
    /// sunset before sunrise still produces a model, but solar noon is then
    /// the plain midpoint and not corrected for wrapping past midnight.
    pub fn from_times(sunrise: TimeOfDay, sunset: TimeOfDay) -> Self {
        let sunrise_position = sunrise.position();
        let sunset_position = sunset.position();

        let solar_noon =
            sunrise_position.value() + (sunset_position.value() - sunrise_position.value()) / 2.0;
        let cycle_offset = CyclePosition::wrapping(solar_noon - 0.25 + 1.0);
        let twilight_vertical = (TAU * sunrise_position.value() - TAU * cycle_offset.value()).sin();

        Self {
            sunrise_position,
            sunset_position,
            cycle_offset,
            twilight_vertical,
        }
    }

    /// The model used before any sun data has been fetched (08:00 to 17:00).
    pub fn fallback() -> Self {
        Self::new(DEFAULT_SUNRISE, DEFAULT_SUNSET).unwrap_or_else(|_| {
            Self::from_times(
                TimeOfDay { hour: 8, minute: 0 },
                TimeOfDay { hour: 17, minute: 0 },
            )
        })
    }

    pub fn sunrise_position(&self) -> CyclePosition {
        self.sunrise_position
    }

    pub fn sunset_position(&self) -> CyclePosition {
        self.sunset_position
    }

    pub fn cycle_offset(&self) -> CyclePosition {
        self.cycle_offset
    }

    /// Height of the sun path at sunrise, in `[-1, 1]`.
    pub fn twilight_vertical(&self) -> f64 {
        self.twilight_vertical
    }

    /// Height of the sun path at a horizontal position, in `[-1, 1]`.
    pub fn vertical_position(&self, horizontal: CyclePosition) -> f64 {
        (TAU * horizontal.value() - TAU * self.cycle_offset.value()).sin()
    }

    /// Place a timestamp on the cycle. Only hour and minute are used.
    pub fn sample<T: Timelike>(&self, current_time: &T) -> SunInstant {
        SunInstant {
            sun_position: TimeOfDay::of(current_time).position(),
        }
    }

    /// Whether the instant lies strictly between sunrise and sunset.
    pub fn is_daylight(&self, instant: SunInstant) -> bool {
        let pos = instant.sun_position;
        pos > self.sunrise_position && pos < self.sunset_position
    }

    /// The next daylight boundary after `instant` and the fraction of a day until it.
    pub fn next_event(&self, instant: SunInstant) -> (SunEvent, f64) {
        if self.is_daylight(instant) || instant.sun_position == self.sunrise_position {
            (
                SunEvent::Sunset,
                instant.sun_position.forward_to(self.sunset_position),
            )
        } else {
            (
                SunEvent::Sunrise,
                instant.sun_position.forward_to(self.sunrise_position),
            )
        }
    }

    pub fn snapshot(&self, instant: SunInstant) -> SunCycleSnapshot {
        SunCycleSnapshot {
            sun_position: instant.sun_position,
            sun_vertical: self.vertical_position(instant.sun_position),
            sunrise_position: self.sunrise_position,
            sunset_position: self.sunset_position,
            cycle_offset: self.cycle_offset,
            twilight_vertical: self.twilight_vertical,
        }
    }
}

impl Default for SunCycleModel {
    fn default() -> Self {
        Self::fallback()
    }
}
