//! The overlay on/off state machine.
//!
//! ```text
//!  Disabled ──enable (permitted)──▶ Enabled ──disable──▶ Disabled
//!     │ ▲                            │  ▲ │
//!     │ └────commit (inactive)───────┘  │ └─ refresh tick: push color for "now"
//!     └─preview──▶ (Previewing) ─commit─┘
//! ```
//!
//! `is_active` is the only persisted piece of state and only `enable`,
//! `disable` and `commit_preview` change it. Previewing pushes the strongest
//! color for the current sliders without touching `is_active` or the refresh
//! schedule. At most one periodic refresh is pending at any time; every
//! transition cancels the old one before it schedules a new one, and each tick
//! carries the generation it was scheduled with so a tick that races a
//! cancellation is ignored.

use anyhow::{Context, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::policy::{OverlayColorPolicy, OverlayIntensities};
use super::timer::{PendingRefresh, RefreshTick, RefreshTimer};
use super::{OverlaySink, PermissionOracle};
use crate::color::ArgbColor;
use crate::error::EngineResult;
use crate::sun_cycle::SunCycleModel;
use crate::time_source::TimeSource;

/// What a call that may switch the overlay on ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The overlay is shown and a periodic refresh is scheduled.
    Enabled,
    /// The overlay was removed.
    Disabled,
    /// Drawing is not permitted yet; a permission request was issued.
    PermissionRequired,
}

/// A slider movement during preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityChange {
    Color(u8),
    Brightness(u8),
}

/// Everything the scheduler needs, gathered so construction stays readable.
pub struct SchedulerParams {
    pub policy: OverlayColorPolicy,
    pub model: SunCycleModel,
    pub refresh_interval: Duration,
    pub sink: Box<dyn OverlaySink>,
    pub permissions: Box<dyn PermissionOracle>,
    pub timer: Box<dyn RefreshTimer>,
    pub clock: Arc<dyn TimeSource>,
    pub debug_enabled: bool,
}

struct ActiveRefresh {
    generation: u64,
    handle: Box<dyn PendingRefresh>,
}

struct SchedulerState {
    policy: OverlayColorPolicy,
    model: SunCycleModel,
    is_active: bool,
    previewing: bool,
    pending: Option<ActiveRefresh>,
    generation: u64,
    refresh_interval: Duration,
    sink: Box<dyn OverlaySink>,
    permissions: Box<dyn PermissionOracle>,
    timer: Box<dyn RefreshTimer>,
    clock: Arc<dyn TimeSource>,
    debug_enabled: bool,
}

impl SchedulerState {
    fn cancel_refresh(&mut self) {
        if let Some(active) = self.pending.take() {
            if self.debug_enabled {
                log_debug!("Cancelled overlay refresh #{}", active.generation);
            }
            active.handle.cancel();
        }
    }

    fn color_for_now(&self) -> ArgbColor {
        let instant = self.model.sample(&self.clock.now());
        self.policy.overlay_color_at(instant, &self.model)
    }

    fn push(&mut self, color: ArgbColor) -> Result<()> {
        self.sink.apply_color(color).with_context(|| {
            format!(
                "Failed to apply overlay color {color} through the {} sink",
                self.sink.sink_name()
            )
        })
    }

    fn deactivate(&mut self) -> Result<()> {
        self.cancel_refresh();
        self.is_active = false;
        self.previewing = false;
        let sink_name = self.sink.sink_name();
        self.sink
            .remove_overlay()
            .with_context(|| format!("Failed to remove overlay through the {sink_name} sink"))
    }

    fn show_preview(&mut self) -> Result<bool> {
        self.previewing = true;
        if !self.permissions.has_draw_overlay_permission() {
            return Ok(false);
        }
        let color = self.policy.overlay_color_max();
        self.push(color)?;
        Ok(true)
    }
}

/// Shared handle to the overlay state machine. Clones drive the same overlay.
#[derive(Clone)]
pub struct OverlayScheduler {
    shared: Arc<Mutex<SchedulerState>>,
}

impl OverlayScheduler {
    /// Create a scheduler in the disabled state. Nothing is pushed to the sink.
    pub fn new(params: SchedulerParams) -> Self {
        let state = SchedulerState {
            policy: params.policy,
            model: params.model,
            is_active: false,
            previewing: false,
            pending: None,
            generation: 0,
            refresh_interval: params.refresh_interval,
            sink: params.sink,
            permissions: params.permissions,
            timer: params.timer,
            clock: params.clock,
            debug_enabled: params.debug_enabled,
        };
        Self {
            shared: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Switch the overlay on.
    ///
    /// Without draw permission a request is issued and nothing else changes.
    /// Otherwise any pending refresh is cancelled, the strongest color for the
    /// current sliders is pushed, a fresh periodic refresh is scheduled and the
    /// scheduler becomes active.
    pub fn enable(&self) -> Result<ActivationOutcome> {
        let mut state = self.lock();
        self.activate(&mut state)
    }

    fn activate(&self, state: &mut SchedulerState) -> Result<ActivationOutcome> {
        if !state.permissions.has_draw_overlay_permission() {
            state.permissions.request_draw_overlay_permission();
            return Ok(ActivationOutcome::PermissionRequired);
        }

        state.cancel_refresh();
        if let Err(e) = self.show_and_schedule(state) {
            self.recover_after_failure(state);
            return Err(e);
        }
        state.is_active = true;
        state.previewing = false;
        Ok(ActivationOutcome::Enabled)
    }

    fn show_and_schedule(&self, state: &mut SchedulerState) -> Result<()> {
        let color = state.policy.overlay_color_max();
        state.push(color)?;
        self.schedule_refresh(state)
    }

    /// Called with no refresh pending after a failed push or schedule. An
    /// active overlay gets its refresh back so the next tick can retry;
    /// anything else is taken down so `is_active` and the pending refresh
    /// agree again.
    fn recover_after_failure(&self, state: &mut SchedulerState) {
        state.previewing = false;
        if state.is_active && self.schedule_refresh(state).is_ok() {
            return;
        }
        if let Err(e) = state.deactivate() {
            log_warning!("Failed to take the overlay down: {e:#}");
        }
    }

    fn schedule_refresh(&self, state: &mut SchedulerState) -> Result<()> {
        state.generation += 1;
        let generation = state.generation;
        let weak = Arc::downgrade(&self.shared);
        let tick: RefreshTick = Arc::new(move || {
            if let Some(shared) = weak.upgrade() {
                OverlayScheduler { shared }.refresh_tick(generation);
            }
        });

        let handle = state
            .timer
            .schedule_repeating(state.refresh_interval, tick)
            .context("Failed to schedule overlay refresh")?;
        state.pending = Some(ActiveRefresh { generation, handle });

        if state.debug_enabled {
            log_debug!(
                "Scheduled overlay refresh #{generation} every {}s",
                state.refresh_interval.as_secs()
            );
        }
        Ok(())
    }

    /// Switch the overlay off: cancel the refresh, remove the overlay and
    /// become inactive. Safe to call when already disabled.
    pub fn disable(&self) -> Result<()> {
        self.lock().deactivate()
    }

    /// Show the strongest color for the current sliders without committing.
    ///
    /// Returns whether a color was pushed, which only happens with draw
    /// permission.
    pub fn begin_preview(&self) -> Result<bool> {
        self.lock().show_preview()
    }

    /// Move one slider and show the result. `is_active` is never touched.
    pub fn preview(&self, change: IntensityChange) -> Result<bool> {
        let mut state = self.lock();
        match change {
            IntensityChange::Color(value) => {
                state.policy.intensities_mut().set_color_intensity(value)
            }
            IntensityChange::Brightness(value) => state
                .policy
                .intensities_mut()
                .set_brightness_intensity(value),
        }
        state.show_preview()
    }

    /// End a preview: re-enable with the new sliders when active, otherwise
    /// make sure the preview color is taken down again.
    pub fn commit_preview(&self) -> Result<ActivationOutcome> {
        let mut state = self.lock();
        state.previewing = false;
        if state.is_active {
            self.activate(&mut state)
        } else {
            state.deactivate()?;
            Ok(ActivationOutcome::Disabled)
        }
    }

    /// Replace both sliders at once and apply them like a committed preview.
    pub fn apply_intensities(&self, intensities: OverlayIntensities) -> Result<ActivationOutcome> {
        let mut state = self.lock();
        *state.policy.intensities_mut() = intensities;
        state.previewing = false;
        if state.is_active {
            self.activate(&mut state)
        } else {
            Ok(ActivationOutcome::Disabled)
        }
    }

    fn refresh_tick(&self, generation: u64) {
        let mut state = self.lock();
        let current = state.pending.as_ref().map(|active| active.generation);
        if !state.is_active || current != Some(generation) {
            return;
        }
        if state.previewing || !state.permissions.has_draw_overlay_permission() {
            return;
        }

        let color = state.color_for_now();
        if let Err(e) = state.push(color) {
            log_warning!("Overlay refresh failed: {e}");
        }
    }

    /// Build a model from new sunrise/sunset strings and swap it in.
    ///
    /// On a parse failure the current model stays in place. The new model is
    /// picked up by the next refresh.
    pub fn update_sun_times(&self, sunrise: &str, sunset: &str) -> EngineResult<()> {
        let model = SunCycleModel::new(sunrise, sunset)?;
        self.replace_model(model);
        Ok(())
    }

    pub fn replace_model(&self, model: SunCycleModel) {
        self.lock().model = model;
    }

    /// Use a new refresh period. A pending refresh is replaced right away so
    /// at most one stays scheduled.
    pub fn set_refresh_interval(&self, interval: Duration) -> Result<()> {
        let mut state = self.lock();
        if state.refresh_interval == interval {
            return Ok(());
        }
        state.refresh_interval = interval;
        if state.pending.is_some() {
            state.cancel_refresh();
            if let Err(e) = self.schedule_refresh(&mut state) {
                if let Err(removal) = state.deactivate() {
                    log_warning!("Failed to take the overlay down: {removal:#}");
                }
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_active
    }

    pub fn is_previewing(&self) -> bool {
        self.lock().previewing
    }

    pub fn has_pending_refresh(&self) -> bool {
        self.lock().pending.is_some()
    }

    pub fn intensities(&self) -> OverlayIntensities {
        self.lock().policy.intensities()
    }

    pub fn policy(&self) -> OverlayColorPolicy {
        self.lock().policy
    }

    pub fn model(&self) -> SunCycleModel {
        self.lock().model
    }

    /// The color a refresh would push right now, whether or not it is shown.
    pub fn current_color(&self) -> ArgbColor {
        self.lock().color_for_now()
    }
}
