use chrono::NaiveTime;
use lightly::color::{ArgbColor, interpolate};
use lightly::common::constants::TWILIGHT_TRANSITION_MINUTES;
use lightly::overlay::{OverlayColorPolicy, OverlayIntensities};
use lightly::sun_cycle::{SunCycleModel, TimeOfDay};
use proptest::prelude::*;

/// Generate any valid time of day, to the minute
fn time_strategy() -> impl Strategy<Value = (u32, u32)> {
    (0u32..24, 0u32..60)
}

fn color_strategy() -> impl Strategy<Value = ArgbColor> {
    any::<(u8, u8, u8, u8)>().prop_map(ArgbColor::from_tuple)
}

fn intensities_strategy() -> impl Strategy<Value = OverlayIntensities> {
    (0u8..=100, 0u8..=100).prop_map(|(color, brightness)| OverlayIntensities::new(color, brightness))
}

fn sun_string(hour: u32, minute: u32) -> String {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .unwrap()
        .format("%I:%M:%S %p")
        .to_string()
}

/// Sunrise between 04:00 and 09:59, sunset between 15:00 and 21:59.
fn day_strategy() -> impl Strategy<Value = SunCycleModel> {
    (4u32..10, 0u32..60, 15u32..22, 0u32..60).prop_map(|(rh, rm, sh, sm)| {
        SunCycleModel::new(&sun_string(rh, rm), &sun_string(sh, sm)).unwrap()
    })
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

proptest! {
    #[test]
    fn test_positions_stay_in_unit_interval((hour, minute) in time_strategy()) {
        let position = TimeOfDay { hour, minute }.position().value();
        prop_assert!((0.0..1.0).contains(&position));
    }

    #[test]
    fn test_model_positions_stay_in_unit_interval(model in day_strategy()) {
        for value in [
            model.sunrise_position().value(),
            model.sunset_position().value(),
            model.cycle_offset().value(),
        ] {
            prop_assert!((0.0..1.0).contains(&value));
        }
        prop_assert!((-1.0..=1.0).contains(&model.twilight_vertical()));
    }

    #[test]
    fn test_sample_is_idempotent(model in day_strategy(), (hour, minute) in time_strategy()) {
        let time = at(hour, minute);
        prop_assert_eq!(model.sample(&time), model.sample(&time));
    }

    #[test]
    fn test_blending_a_color_with_itself_keeps_rgb(
        color in color_strategy(),
        weight in 0.001f64..1000.0,
    ) {
        let blended = interpolate(color, color, weight, weight).unwrap();
        prop_assert_eq!(
            (blended.red, blended.green, blended.blue),
            (color.red, color.green, color.blue)
        );
    }

    #[test]
    fn test_daylight_is_transparent(
        model in day_strategy(),
        intensities in intensities_strategy(),
        (hour, minute) in time_strategy(),
    ) {
        let policy = OverlayColorPolicy::with_intensities(intensities);
        let instant = model.sample(&at(hour, minute));
        let pos = instant.sun_position;
        prop_assume!(pos > model.sunrise_position() && pos < model.sunset_position());

        prop_assert_eq!(policy.overlay_color_at(instant, &model).alpha, 0);
    }

    #[test]
    fn test_deep_night_uses_full_alpha(
        model in day_strategy(),
        intensities in intensities_strategy(),
        (hour, minute) in time_strategy(),
    ) {
        let policy = OverlayColorPolicy::with_intensities(intensities);
        let instant = model.sample(&at(hour, minute));
        let pos = instant.sun_position.value();
        let transition = TWILIGHT_TRANSITION_MINUTES / 1440.0;
        let night = pos < model.sunrise_position().value() - transition
            || pos > model.sunset_position().value() + transition;
        prop_assume!(night);

        prop_assert_eq!(
            policy.overlay_color_at(instant, &model).alpha,
            policy.overlay_color_max().alpha
        );
    }

    #[test]
    fn test_overlay_rgb_never_depends_on_time(
        model in day_strategy(),
        intensities in intensities_strategy(),
        (hour, minute) in time_strategy(),
    ) {
        let policy = OverlayColorPolicy::with_intensities(intensities);
        let max = policy.overlay_color_max();
        let color = policy.overlay_color_at(model.sample(&at(hour, minute)), &model);
        prop_assert_eq!((color.red, color.green, color.blue), (max.red, max.green, max.blue));
        prop_assert!(color.alpha <= max.alpha);
    }
}
