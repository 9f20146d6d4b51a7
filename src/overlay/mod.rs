//! Overlay control: the color policy, the enable/disable/preview state
//! machine, and the seams it talks to.
//!
//! The scheduler never draws anything itself. It hands finished colors to an
//! [`OverlaySink`], asks a [`PermissionOracle`] whether it may draw at all, and
//! drives periodic refreshes through a [`RefreshTimer`](timer::RefreshTimer).
//! Each seam is a trait so the state machine can be exercised without a
//! display server or real waiting.

use anyhow::Result;

use crate::color::ArgbColor;

pub mod policy;
pub mod scheduler;
pub mod sink;
pub mod timer;

#[cfg(any(test, feature = "testing-support"))]
pub mod testing;

pub use policy::{FilterPalette, OverlayColorPolicy, OverlayIntensities};
pub use scheduler::{ActivationOutcome, IntensityChange, OverlayScheduler, SchedulerParams};

/// Destination for overlay colors.
///
/// Implementations render the color over the whole screen, print it, or
/// record it. A sink only ever holds one color at a time; each call replaces
/// whatever was shown before.
pub trait OverlaySink: Send {
    /// Show `color` as the current overlay.
    fn apply_color(&mut self, color: ArgbColor) -> Result<()>;

    /// Take the overlay off the screen entirely.
    fn remove_overlay(&mut self) -> Result<()>;

    /// Human readable name used in log output.
    fn sink_name(&self) -> &'static str;
}

/// Answers whether lightly is allowed to draw over other windows.
#[cfg_attr(test, mockall::automock)]
pub trait PermissionOracle: Send {
    fn has_draw_overlay_permission(&self) -> bool;

    /// Ask the platform (or the user) for permission. The answer arrives
    /// later; callers re-check with
    /// [`has_draw_overlay_permission`](Self::has_draw_overlay_permission).
    fn request_draw_overlay_permission(&mut self);
}

/// Permission oracle for platforms without an overlay permission model.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysPermitted;

impl PermissionOracle for AlwaysPermitted {
    fn has_draw_overlay_permission(&self) -> bool {
        true
    }

    fn request_draw_overlay_permission(&mut self) {}
}
