//! ARGB color values and the two-color blend law used for the overlay.
//!
//! The blend is deliberately not a plain linear interpolation: color channels
//! are mixed linearly by weight, but alpha is derived from the stronger of the
//! two inputs so that mixing two faint filters never produces a fainter one.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, EngineResult};

/// A color with 8-bit alpha, red, green and blue channels.
///
/// Always built whole: either from explicit channels or by [`interpolate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArgbColor {
    pub alpha: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl ArgbColor {
    pub const TRANSPARENT: ArgbColor = ArgbColor::new(0, 0, 0, 0);

    pub const fn new(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self {
            alpha,
            red,
            green,
            blue,
        }
    }

    pub const fn from_tuple((alpha, red, green, blue): (u8, u8, u8, u8)) -> Self {
        Self::new(alpha, red, green, blue)
    }

    /// Copy of this color with a different alpha.
    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self { alpha, ..self }
    }

    /// Pack as `0xAARRGGBB`, the layout overlay renderers expect.
    pub const fn to_argb_u32(self) -> u32 {
        (self.alpha as u32) << 24
            | (self.red as u32) << 16
            | (self.green as u32) << 8
            | self.blue as u32
    }

    pub const fn from_argb_u32(packed: u32) -> Self {
        Self::new(
            (packed >> 24) as u8,
            (packed >> 16) as u8,
            (packed >> 8) as u8,
            packed as u8,
        )
    }

    pub const fn is_transparent(self) -> bool {
        self.alpha == 0
    }
}

impl fmt::Display for ArgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.to_argb_u32())
    }
}

/// Truncate toward zero, then clamp into [0, 255]. NaN collapses to 0.
fn channel_from_f64(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.trunc().clamp(0.0, 255.0) as u8
}

/// Blend two colors by weight.
///
/// Red, green and blue are mixed linearly using `weight_a / (weight_a + weight_b)`
/// as the share of `color_a`. Alpha is
/// `max((alpha_a + alpha_a) / 2.2, max(alpha_a, alpha_b) * 0.9)`; the doubled
/// `alpha_a` is part of the tuned look and must stay as written.
///
/// # Errors
/// [`EngineError::DegenerateWeights`] when `weight_a + weight_b` is not positive.
pub fn interpolate(
    color_a: ArgbColor,
    color_b: ArgbColor,
    weight_a: f64,
    weight_b: f64,
) -> EngineResult<ArgbColor> {
    let total = weight_a + weight_b;
    if !(total > 0.0) {
        return Err(EngineError::DegenerateWeights { weight_a, weight_b });
    }

    let fraction_a = weight_a / total;
    let fraction_b = 1.0 - fraction_a;
    let mix = |a: u8, b: u8| {
        channel_from_f64(f64::from(a) * fraction_a + f64::from(b) * fraction_b)
    };

    let alpha_a = f64::from(color_a.alpha);
    let alpha_b = f64::from(color_b.alpha);
    let alpha = ((alpha_a + alpha_a) / 2.2).max(alpha_a.max(alpha_b) * 0.9);

    Ok(ArgbColor {
        alpha: channel_from_f64(alpha),
        red: mix(color_a.red, color_b.red),
        green: mix(color_a.green, color_b.green),
        blue: mix(color_a.blue, color_b.blue),
    })
}

/// Blend `priority` over `background`, scaling the priority color's share by
/// `priority_scale`, and return a fully opaque result.
///
/// Used for gradient swatches, where the inputs' own transparency must not
/// show through.
pub fn interpolate_with_priority(
    background: ArgbColor,
    priority: ArgbColor,
    priority_scale: f64,
) -> EngineResult<ArgbColor> {
    let priority_alpha = f64::from(priority.alpha);
    let blended = interpolate(
        background,
        priority,
        255.0 - priority_alpha,
        priority_alpha * priority_scale,
    )?;
    Ok(blended.with_alpha(255))
}
