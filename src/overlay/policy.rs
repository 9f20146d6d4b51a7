//! Mapping from filter intensities and the sun cycle to an overlay color.
//!
//! Two filters are combined: a warm tint that lowers perceived color
//! temperature and a black tint that lowers brightness. Each intensity slider
//! runs from 0 (strongest filter) to 100 (filter off). The blend favours the
//! brightness filter three to one, and the result is faded out near and during
//! daylight.

use serde::Serialize;

use crate::color::{ArgbColor, interpolate};
use crate::common::constants::*;
use crate::common::utils::round_to_step;
use crate::error::EngineResult;
use crate::sun_cycle::{SunCycleModel, SunInstant};

/// The two user-tunable filter strengths, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverlayIntensities {
    color_intensity: u8,
    brightness_intensity: u8,
}

impl OverlayIntensities {
    /// Create intensities, clamping both into `[0, 100]`.
    pub fn new(color_intensity: u8, brightness_intensity: u8) -> Self {
        Self {
            color_intensity: color_intensity.min(MAXIMUM_INTENSITY),
            brightness_intensity: brightness_intensity.min(MAXIMUM_INTENSITY),
        }
    }

    pub fn color_intensity(&self) -> u8 {
        self.color_intensity
    }

    pub fn brightness_intensity(&self) -> u8 {
        self.brightness_intensity
    }

    pub fn set_color_intensity(&mut self, value: u8) {
        self.color_intensity = value.min(MAXIMUM_INTENSITY);
    }

    pub fn set_brightness_intensity(&mut self, value: u8) {
        self.brightness_intensity = value.min(MAXIMUM_INTENSITY);
    }
}

impl Default for OverlayIntensities {
    fn default() -> Self {
        Self::new(DEFAULT_COLOR_INTENSITY, DEFAULT_BRIGHTNESS_INTENSITY)
    }
}

/// Base colors of the two filters. Their alpha is replaced per intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPalette {
    pub color_filter_base: ArgbColor,
    pub brightness_filter_base: ArgbColor,
}

impl Default for FilterPalette {
    fn default() -> Self {
        Self {
            color_filter_base: ArgbColor::from_tuple(COLOR_FILTER_BASE_ARGB),
            brightness_filter_base: ArgbColor::from_tuple(BRIGHTNESS_FILTER_BASE_ARGB),
        }
    }
}

/// Computes overlay colors for a set of intensities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayColorPolicy {
    intensities: OverlayIntensities,
    palette: FilterPalette,
}

impl OverlayColorPolicy {
    pub fn new(intensities: OverlayIntensities, palette: FilterPalette) -> Self {
        Self {
            intensities,
            palette,
        }
    }

    pub fn with_intensities(intensities: OverlayIntensities) -> Self {
        Self::new(intensities, FilterPalette::default())
    }

    pub fn intensities(&self) -> OverlayIntensities {
        self.intensities
    }

    pub fn intensities_mut(&mut self) -> &mut OverlayIntensities {
        &mut self.intensities
    }

    pub fn palette(&self) -> FilterPalette {
        self.palette
    }

    /// The warm tint with its alpha set from the color intensity.
    pub fn color_filter_color(&self) -> ArgbColor {
        self.palette
            .color_filter_base
            .with_alpha(filter_alpha(self.intensities.color_intensity))
    }

    /// The black tint with its alpha set from the brightness intensity.
    pub fn brightness_filter_color(&self) -> ArgbColor {
        self.palette
            .brightness_filter_base
            .with_alpha(filter_alpha(self.intensities.brightness_intensity))
    }

    /// The strongest color these intensities produce, i.e. the full-night color.
    ///
    /// Both sliders at 100 turn both filters off; the overlay is then
    /// [`ArgbColor::TRANSPARENT`].
    pub fn overlay_color_max(&self) -> ArgbColor {
        self.try_overlay_color_max().unwrap_or(ArgbColor::TRANSPARENT)
    }

    /// Like [`overlay_color_max`](Self::overlay_color_max) but reports the
    /// zero-weight blend of two switched-off filters.
    ///
    /// # Errors
    /// [`EngineError::DegenerateWeights`](crate::error::EngineError::DegenerateWeights)
    /// when both sliders are at 100.
    pub fn try_overlay_color_max(&self) -> EngineResult<ArgbColor> {
        let color_weight = 100.0 - f64::from(self.intensities.color_intensity);
        let brightness_weight = 300.0 - 3.0 * f64::from(self.intensities.brightness_intensity);
        interpolate(
            self.color_filter_color(),
            self.brightness_filter_color(),
            color_weight,
            brightness_weight,
        )
    }

    /// The overlay color for one instant of the given cycle.
    ///
    /// During daylight the overlay is fully transparent. At night the alpha of
    /// [`overlay_color_max`](Self::overlay_color_max) is scaled by the distance
    /// to the nearer of sunrise and sunset: zero exactly at the boundary, full
    /// strength once 90 minutes away from it.
    pub fn overlay_color_at(&self, instant: SunInstant, model: &SunCycleModel) -> ArgbColor {
        let max = self.overlay_color_max();
        let pos = instant.sun_position;
        let sunrise = model.sunrise_position();
        let sunset = model.sunset_position();

        if pos <= sunrise || pos >= sunset {
            let distance = sunrise.distance(pos).min(sunset.distance(pos));
            let scale = (distance / TWILIGHT_TRANSITION_DISTANCE).min(1.0);
            max.with_alpha((f64::from(max.alpha) * scale) as u8)
        } else {
            max.with_alpha(0)
        }
    }

    /// Approximate color temperature of the warm filter, in Kelvin, rounded to 100 K.
    pub fn color_temperature(&self) -> u32 {
        let alpha = f64::from(self.color_filter_color().alpha);
        let span = f64::from(COLOR_TEMPERATURE_MAX - COLOR_TEMPERATURE_MIN);
        let precise =
            f64::from(COLOR_TEMPERATURE_MIN) + span * (1.0 - alpha / f64::from(FILTER_MAX_ALPHA));
        round_to_step(precise, 100)
    }

    /// Remaining screen brightness under the black filter, rounded to 5 %.
    pub fn brightness_percent(&self) -> u32 {
        let alpha = f64::from(self.brightness_filter_color().alpha);
        round_to_step((1.0 - alpha / 255.0) * 100.0, 5)
    }
}

impl Default for OverlayColorPolicy {
    fn default() -> Self {
        Self::new(OverlayIntensities::default(), FilterPalette::default())
    }
}

fn filter_alpha(intensity: u8) -> u8 {
    (FILTER_MAX_ALPHA - 2 * i32::from(intensity)).clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use chrono::NaiveTime;

    fn policy(color: u8, brightness: u8) -> OverlayColorPolicy {
        OverlayColorPolicy::with_intensities(OverlayIntensities::new(color, brightness))
    }

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_filter_alphas_follow_intensity() {
        let p = policy(0, 100);
        assert_eq!(p.color_filter_color().alpha, 200);
        assert_eq!(p.brightness_filter_color().alpha, 0);

        let p = policy(80, 80);
        assert_eq!(p.color_filter_color(), ArgbColor::new(40, 255, 130, 0));
        assert_eq!(p.brightness_filter_color(), ArgbColor::new(40, 0, 0, 0));
    }

    #[test]
    fn test_intensities_are_clamped() {
        let intensities = OverlayIntensities::new(250, 101);
        assert_eq!(intensities.color_intensity(), 100);
        assert_eq!(intensities.brightness_intensity(), 100);

        let mut intensities = OverlayIntensities::default();
        intensities.set_color_intensity(255);
        assert_eq!(intensities.color_intensity(), 100);
    }

    #[test]
    fn test_overlay_color_max_default_intensities() {
        let p = policy(80, 80);
        let expected = interpolate(
            ArgbColor::new(40, 255, 130, 0),
            ArgbColor::new(40, 0, 0, 0),
            20.0,
            60.0,
        )
        .unwrap();
        assert_eq!(p.overlay_color_max(), expected);
        assert_eq!(p.overlay_color_max(), ArgbColor::new(36, 63, 32, 0));
    }

    #[test]
    fn test_brightness_weighs_three_times_color() {
        // equal sliders: brightness weight is three times color weight
        let p = policy(50, 50);
        let max = p.overlay_color_max();
        // fraction of warm color = 50 / (50 + 150)
        assert_eq!(max.red, (255.0 * 0.25) as u8);
    }

    #[test]
    fn test_both_filters_off_is_transparent() {
        let p = policy(100, 100);
        assert!(matches!(
            p.try_overlay_color_max(),
            Err(EngineError::DegenerateWeights { .. })
        ));
        assert_eq!(p.overlay_color_max(), ArgbColor::TRANSPARENT);
        assert!(policy(99, 100).try_overlay_color_max().is_ok());
        let model = SunCycleModel::fallback();
        assert_eq!(p.overlay_color_at(model.sample(&at(2, 0)), &model).alpha, 0);
    }

    #[test]
    fn test_daylight_is_transparent() {
        let p = policy(20, 20);
        let model = SunCycleModel::fallback();
        for (hour, minute) in [(8, 1), (9, 30), (12, 0), (16, 59)] {
            let color = p.overlay_color_at(model.sample(&at(hour, minute)), &model);
            assert_eq!(color.alpha, 0, "expected transparent at {hour}:{minute:02}");
            let max = p.overlay_color_max();
            assert_eq!((color.red, color.green, color.blue), (max.red, max.green, max.blue));
        }
    }

    #[test]
    fn test_midnight_is_full_strength() {
        let p = policy(80, 80);
        let model = SunCycleModel::fallback();
        let color = p.overlay_color_at(model.sample(&at(0, 0)), &model);
        assert_eq!(color, p.overlay_color_max());
    }

    #[test]
    fn test_boundary_is_transparent() {
        let p = policy(10, 10);
        let model = SunCycleModel::fallback();
        assert_eq!(p.overlay_color_at(model.sample(&at(8, 0)), &model).alpha, 0);
        assert_eq!(p.overlay_color_at(model.sample(&at(17, 0)), &model).alpha, 0);
    }

    #[test]
    fn test_fade_inside_twilight_window() {
        let p = policy(0, 0);
        let max_alpha = p.overlay_color_max().alpha;
        assert_eq!(max_alpha, 181);
        let model = SunCycleModel::fallback();

        // 45 minutes after sunset is half way through the window
        let half = p.overlay_color_at(model.sample(&at(17, 45)), &model);
        let expected = (f64::from(max_alpha) * 0.5) as u8;
        assert!(half.alpha.abs_diff(expected) <= 1);

        // 90 minutes before sunrise reaches full strength
        let full = p.overlay_color_at(model.sample(&at(6, 30)), &model);
        assert!(full.alpha.abs_diff(max_alpha) <= 1);
        let deeper = p.overlay_color_at(model.sample(&at(6, 0)), &model);
        assert_eq!(deeper.alpha, max_alpha);
    }

    #[test]
    fn test_fade_is_monotonic_moving_into_night() {
        let p = policy(30, 40);
        let model = SunCycleModel::fallback();
        let mut previous = 0;
        for minute in 0..=120 {
            let time = at(17 + minute / 60, minute % 60);
            let alpha = p.overlay_color_at(model.sample(&time), &model).alpha;
            assert!(alpha >= previous);
            previous = alpha;
        }
        assert_eq!(previous, p.overlay_color_max().alpha);
    }

    #[test]
    fn test_color_temperature_readout() {
        assert_eq!(policy(0, 80).color_temperature(), 1800);
        assert_eq!(policy(100, 80).color_temperature(), 6000);
        // alpha 100 is half way: 1800 + 2100
        assert_eq!(policy(50, 80).color_temperature(), 3900);
    }

    #[test]
    fn test_brightness_percent_readout() {
        assert_eq!(policy(80, 100).brightness_percent(), 100);
        // alpha 200: 21.6 % -> 20
        assert_eq!(policy(80, 0).brightness_percent(), 20);
        // alpha 40: 84.3 % -> 85
        assert_eq!(policy(80, 80).brightness_percent(), 85);
    }

    #[test]
    fn test_custom_palette_is_used() {
        let palette = FilterPalette {
            color_filter_base: ArgbColor::new(255, 200, 100, 50),
            brightness_filter_base: ArgbColor::new(255, 10, 10, 10),
        };
        let p = OverlayColorPolicy::new(OverlayIntensities::new(0, 100), palette);
        let max = p.overlay_color_max();
        // brightness weight is 0, so RGB comes from the color filter alone
        assert_eq!((max.red, max.green, max.blue), (200, 100, 50));
    }
}
