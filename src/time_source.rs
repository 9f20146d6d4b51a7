//! Clock abstraction supporting real and simulated time.
//!
//! The overlay engine only ever asks "what time is it now", so the whole
//! application reads the clock through [`TimeSource`]. A process-wide source is
//! installed once at startup; components that need a private clock (the
//! scheduler in tests, the simulate command) hold an `Arc<dyn TimeSource>`.

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime, TimeZone};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Trait for abstracting time operations.
pub trait TimeSource: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Local>;

    /// Sleep for the duration, or pretend to.
    fn sleep(&self, duration: StdDuration);

    fn is_simulated(&self) -> bool;
}

/// The system clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// A clock that starts at a chosen instant and only moves when told to.
///
/// With a multiplier of `0.0` (fast-forward) `sleep` advances the clock by the
/// requested duration immediately. With a positive multiplier `sleep` really
/// sleeps for `duration / multiplier` and then advances by `duration`.
pub struct SimulatedTimeSource {
    current: Mutex<DateTime<Local>>,
    time_multiplier: f64,
}

impl SimulatedTimeSource {
    pub fn new(start_time: DateTime<Local>, multiplier: f64) -> Self {
        Self {
            current: Mutex::new(start_time),
            time_multiplier: multiplier.max(0.0),
        }
    }

    /// A clock starting today at the given local time of day.
    pub fn today_at(time: NaiveTime, multiplier: f64) -> Self {
        let today = Local::now().date_naive().and_time(time);
        let start = Local
            .from_local_datetime(&today)
            .earliest()
            .unwrap_or_else(Local::now);
        Self::new(start, multiplier)
    }

    /// A fast-forward clock starting today at the given local time of day.
    pub fn at_time_of_day(time: NaiveTime) -> Self {
        Self::today_at(time, 0.0)
    }

    /// Move the clock forward without sleeping.
    pub fn advance(&self, by: StdDuration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += to_chrono(by);
    }

    /// Jump the clock to an absolute instant.
    pub fn set(&self, instant: DateTime<Local>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = instant;
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Local> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sleep(&self, duration: StdDuration) {
        if self.time_multiplier > 0.0 {
            let real = duration.as_secs_f64() / self.time_multiplier;
            std::thread::sleep(StdDuration::from_secs_f64(real));
        }
        self.advance(duration);
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

fn to_chrono(duration: StdDuration) -> ChronoDuration {
    ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::MAX)
}

/// Install the process-wide time source. Later calls are ignored.
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

pub fn is_initialized() -> bool {
    TIME_SOURCE.get().is_some()
}

/// The process-wide time source, defaulting to the system clock.
pub fn global() -> Arc<dyn TimeSource> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource)).clone()
}

pub fn now() -> DateTime<Local> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource)).now()
}

pub fn is_simulated() -> bool {
    TIME_SOURCE
        .get_or_init(|| Arc::new(RealTimeSource))
        .is_simulated()
}

/// Parse a wall-clock time given on the command line, "HH:MM" or "HH:MM:SS".
pub fn parse_clock_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|e| format!("Invalid time '{s}': {e}. Use HH:MM or HH:MM:SS"))
}
