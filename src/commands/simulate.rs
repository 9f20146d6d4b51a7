//! `lightly simulate`: replay a stretch of the day against a simulated clock.
//!
//! The real overlay scheduler is driven with a simulated time source and a
//! manually fired refresh timer, so the output shows exactly what a running
//! instance would push and when. The clock is installed process-wide, which
//! makes every log line carry the simulated `[HH:MM:SS]`.

use anyhow::Result;
use chrono::NaiveTime;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::overlay::sink::TerminalSink;
use crate::overlay::timer::ManualRefreshTimer;
use crate::overlay::{
    AlwaysPermitted, OverlayColorPolicy, OverlayScheduler, OverlaySink, SchedulerParams,
};
use crate::time_source::{self, SimulatedTimeSource, TimeSource};

/// What to simulate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub from: NaiveTime,
    pub step_minutes: u64,
    pub hours: u64,
    /// 0 fast-forwards, otherwise simulated seconds per real second.
    pub multiplier: f64,
}

/// What a finished simulation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSummary {
    pub refreshes: u64,
    pub refreshes_fired: usize,
}

impl SimulationParams {
    fn step(&self) -> Duration {
        Duration::from_secs(self.step_minutes.max(1) * 60)
    }

    fn refresh_count(&self) -> u64 {
        self.hours * 60 / self.step_minutes.max(1)
    }
}

pub fn handle_simulate_command(params: SimulationParams, debug_enabled: bool) -> Result<()> {
    log_version!();

    let config = Config::load()?;
    let clock = Arc::new(SimulatedTimeSource::today_at(params.from, params.multiplier));
    time_source::init_time_source(clock.clone());

    log_block_start!(
        "Simulating {} hours from {} in {}-minute steps",
        params.hours,
        params.from.format("%H:%M"),
        params.step_minutes
    );
    if params.multiplier > 0.0 {
        log_indented!("Running at {}x speed", params.multiplier);
    } else {
        log_indented!("Fast-forwarding");
    }

    let summary = run_simulation(
        &config,
        params,
        Box::new(TerminalSink::new(debug_enabled)),
        clock,
        debug_enabled,
    )?;

    log_block_start!(
        "Simulation complete: {} of {} refreshes applied",
        summary.refreshes_fired,
        summary.refreshes
    );
    log_end!();
    Ok(())
}

/// Enable the overlay at the start time, then advance the clock one step at a
/// time and fire the pending refresh after each step.
pub fn run_simulation(
    config: &Config,
    params: SimulationParams,
    sink: Box<dyn OverlaySink>,
    clock: Arc<SimulatedTimeSource>,
    debug_enabled: bool,
) -> Result<SimulationSummary> {
    let timer = ManualRefreshTimer::new();
    let scheduler = OverlayScheduler::new(SchedulerParams {
        policy: OverlayColorPolicy::with_intensities(config.intensities()),
        model: config.sun_model()?,
        refresh_interval: params.step(),
        sink,
        permissions: Box::new(AlwaysPermitted),
        timer: Box::new(timer.clone()),
        clock: clock.clone(),
        debug_enabled,
    });

    scheduler.enable()?;

    let refreshes = params.refresh_count();
    let mut refreshes_fired = 0;
    for _ in 0..refreshes {
        clock.sleep(params.step());
        refreshes_fired += timer.fire();
    }

    scheduler.disable()?;

    Ok(SimulationSummary {
        refreshes,
        refreshes_fired,
    })
}

/// Display help for the simulate command
pub fn display_help() {
    log_version!();
    log_block_start!("simulate - Replay a day against a simulated clock");
    log_block_start!(
        "Usage: lightly simulate [--from HH:MM] [--step MIN] [--hours N] [--multiplier X]"
    );
    log_block_start!("Options:");
    log_indented!("--from HH:MM       Start time (default 00:00)");
    log_indented!("--step MIN         Minutes between refreshes (default 15)");
    log_indented!("--hours N          How long to simulate (default 24)");
    log_indented!("--multiplier X     Simulated seconds per real second, 0 fast-forwards");
    log_indented!("--fast-forward     Same as --multiplier 0 (default)");
    log_block_start!("Examples:");
    log_indented!("lightly simulate");
    log_indented!("lightly simulate --from 16:00 --hours 4 --step 5");
    log_indented!("lightly simulate --multiplier 3600");
    log_end!();
}
