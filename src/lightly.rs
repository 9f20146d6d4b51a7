//! Application coordinator for `lightly run`.
//!
//! Loads configuration and state, builds the overlay scheduler, starts the
//! signal handler and the file watcher, then waits. All refreshing happens on
//! the scheduler's timer thread; the main thread only reacts to
//! [`SignalMessage`]s.
//!
//! ```no_run
//! use lightly::Lightly;
//!
//! # fn main() -> anyhow::Result<()> {
//! Lightly::new(false).run()?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::common::utils::private_path;
use crate::config::{self, Config};
use crate::io::signals::{SignalMessage, setup_signal_handler};
use crate::overlay::sink::TerminalSink;
use crate::overlay::timer::ThreadRefreshTimer;
use crate::overlay::{
    ActivationOutcome, AlwaysPermitted, OverlayColorPolicy, OverlayScheduler, SchedulerParams,
};
use crate::state::{PersistedState, current_state_dir};

/// Builder for running the overlay until shutdown.
pub struct Lightly {
    debug_enabled: bool,
    show_headers: bool,
}

impl Lightly {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            show_headers: true,
        }
    }

    /// Skip the version header
    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();
        }

        let config_path = Config::get_config_path()?;
        let config = Config::load().context("Configuration failed")?;
        config.log_config();

        let state_dir = current_state_dir()?;
        fs::create_dir_all(&state_dir).with_context(|| {
            format!(
                "Failed to create state directory {}",
                private_path(&state_dir)
            )
        })?;
        let state = PersistedState::load_from(&state_dir).unwrap_or_else(|e| {
            log_pipe!();
            log_warning!("Ignoring saved state: {e:#}");
            PersistedState::default()
        });

        let signal_state = setup_signal_handler(self.debug_enabled)?;

        if let Err(e) = config::start_config_watcher(
            signal_state.signal_sender.clone(),
            Some(state_dir.clone()),
            self.debug_enabled,
        ) && self.debug_enabled
        {
            log_pipe!();
            log_warning!("Config file watching unavailable: {}", e);
            log_indented!("Hot reload disabled, use SIGUSR2 to reload manually");
        }

        let scheduler = OverlayScheduler::new(SchedulerParams {
            policy: OverlayColorPolicy::with_intensities(config.intensities()),
            model: config.sun_model()?,
            refresh_interval: config.refresh_interval(),
            sink: Box::new(TerminalSink::new(self.debug_enabled)),
            permissions: Box::new(AlwaysPermitted),
            timer: Box::new(ThreadRefreshTimer),
            clock: crate::time_source::global(),
            debug_enabled: self.debug_enabled,
        });

        let mut session = OverlaySession::new(
            scheduler,
            config,
            config_path,
            state,
            state_dir,
            self.debug_enabled,
        );
        session.start()?;

        log_block_start!("Running, press Ctrl+C to stop");

        while signal_state.is_running() {
            match signal_state.signal_receiver.recv() {
                Ok(message) => {
                    if !session.process(message) {
                        break;
                    }
                }
                Err(_) => {
                    log_pipe!();
                    log_error!("Signal handler disconnected unexpectedly");
                    break;
                }
            }
        }

        session.shutdown()?;
        log_end!();
        Ok(())
    }
}

/// The running overlay together with the config and state it was built from.
///
/// State is written only when it differs from what was last saved, because
/// the watcher also reports our own writes to the state file.
pub struct OverlaySession {
    scheduler: OverlayScheduler,
    config: Config,
    config_path: PathBuf,
    state: PersistedState,
    saved_state: PersistedState,
    state_dir: PathBuf,
    debug_enabled: bool,
}

impl OverlaySession {
    pub fn new(
        scheduler: OverlayScheduler,
        config: Config,
        config_path: PathBuf,
        state: PersistedState,
        state_dir: PathBuf,
        debug_enabled: bool,
    ) -> Self {
        Self {
            scheduler,
            config,
            config_path,
            saved_state: state.clone(),
            state,
            state_dir,
            debug_enabled,
        }
    }

    pub fn scheduler(&self) -> &OverlayScheduler {
        &self.scheduler
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Switch the overlay on when it was left on or `start_enabled` asks for it.
    pub fn start(&mut self) -> Result<()> {
        if self.state.has_dummy_location() && self.debug_enabled {
            log_debug!("No location imported yet");
        }
        if self.config.start_enabled() || self.state.is_active {
            self.enable()?;
        } else {
            log_block_start!("Overlay is disabled, run 'lightly enable' to switch it on");
        }
        self.sync_state()
    }

    /// React to one message. Returns `false` once the loop should stop.
    pub fn handle_message(&mut self, message: SignalMessage) -> Result<bool> {
        match message {
            SignalMessage::Reload => {
                self.reload()?;
                Ok(true)
            }
            SignalMessage::Shutdown => Ok(false),
        }
    }

    /// [`handle_message`](Self::handle_message) for the run loop: a failed
    /// reload is reported and the loop keeps going.
    pub fn process(&mut self, message: SignalMessage) -> bool {
        match self.handle_message(message) {
            Ok(keep_running) => keep_running,
            Err(e) => {
                log_pipe!();
                log_warning!("Reload failed: {e:#}");
                true
            }
        }
    }

    /// Re-read config and state and bring the overlay in line with both.
    ///
    /// An unreadable or invalid file is reported and the previous values stay
    /// in effect. A config that could not be applied is kept out of
    /// `self.config`, so the next reload tries it again. The state file is
    /// synced with the scheduler even when applying failed.
    pub fn reload(&mut self) -> Result<()> {
        let applied = self.apply_files();
        let synced = self.sync_state();
        applied.and(synced)
    }

    fn apply_files(&mut self) -> Result<()> {
        match Config::load_from_path(&self.config_path) {
            Ok(config) => self.apply_config(config)?,
            Err(e) => {
                log_pipe!();
                log_warning!("Keeping previous configuration: {e:#}");
            }
        }

        match PersistedState::load_from(&self.state_dir) {
            Ok(state) => self.apply_state(state),
            Err(e) => {
                log_pipe!();
                log_warning!("Keeping previous state: {e:#}");
                Ok(())
            }
        }
    }

    fn apply_config(&mut self, config: Config) -> Result<()> {
        if config == self.config {
            if self.debug_enabled {
                log_debug!("Configuration unchanged");
            }
            return Ok(());
        }

        if config.sunrise() != self.config.sunrise() || config.sunset() != self.config.sunset() {
            match self
                .scheduler
                .update_sun_times(config.sunrise(), config.sunset())
            {
                Ok(()) => {
                    log_block_start!(
                        "Sun times updated: {} to {}",
                        config.sunrise(),
                        config.sunset()
                    );
                }
                Err(e) => {
                    log_pipe!();
                    log_warning!("Keeping previous sun times: {e}");
                }
            }
        }

        if config.refresh_interval() != self.config.refresh_interval() {
            self.scheduler
                .set_refresh_interval(config.refresh_interval())?;
            log_block_start!(
                "Refresh interval set to {} minutes",
                config.refresh_interval().as_secs() / 60
            );
        }

        if config.intensities() != self.config.intensities() {
            let intensities = config.intensities();
            log_block_start!(
                "Intensities set to color {} and brightness {}",
                intensities.color_intensity(),
                intensities.brightness_intensity()
            );
            if self.scheduler.apply_intensities(intensities)? == ActivationOutcome::PermissionRequired
            {
                self.report_permission_required();
            }
        }

        self.config = config;
        Ok(())
    }

    fn apply_state(&mut self, state: PersistedState) -> Result<()> {
        if state.location != self.state.location {
            log_block_start!("Location set to {}", state.location.humanized());
        }
        let wanted = state.is_active;
        self.state = state;

        if wanted && !self.scheduler.is_active() {
            self.enable()?;
        } else if !wanted && self.scheduler.is_active() {
            self.scheduler.disable()?;
            log_block_start!("Overlay disabled");
        }
        Ok(())
    }

    fn enable(&mut self) -> Result<()> {
        match self.scheduler.enable()? {
            ActivationOutcome::Enabled => log_block_start!("Overlay enabled"),
            ActivationOutcome::PermissionRequired => self.report_permission_required(),
            ActivationOutcome::Disabled => {}
        }
        Ok(())
    }

    fn report_permission_required(&self) {
        log_pipe!();
        log_warning!("Drawing the overlay is not permitted yet, a permission request was sent");
    }

    /// Record the scheduler's active flag and save if anything changed.
    fn sync_state(&mut self) -> Result<()> {
        self.state.is_active = self.scheduler.is_active();
        if self.state != self.saved_state {
            self.state.save_to(&self.state_dir)?;
            self.saved_state = self.state.clone();
            if self.debug_enabled {
                log_debug!("State saved to {}", private_path(&self.state_dir));
            }
        }
        Ok(())
    }

    /// Remember whether the overlay was on, then take it down.
    pub fn shutdown(&mut self) -> Result<()> {
        self.sync_state()?;
        self.scheduler.disable()?;
        log_block_start!("Overlay removed, goodbye");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::create_default_config;
    use crate::overlay::testing::{RecordingSink, SwitchablePermission};
    use crate::overlay::timer::ManualRefreshTimer;
    use crate::overlay::{OverlayIntensities, PermissionOracle};
    use crate::sun_cycle::SunCycleModel;
    use crate::time_source::SimulatedTimeSource;
    use chrono::NaiveTime;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        _dir: TempDir,
        session: OverlaySession,
        sink: RecordingSink,
        timer: ManualRefreshTimer,
        config_path: PathBuf,
        state_dir: PathBuf,
    }

    fn fixture_with(state: PersistedState, permissions: Box<dyn PermissionOracle>) -> Fixture {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config").join("lightly.toml");
        create_default_config(&config_path).unwrap();
        let config = Config::load_from_path(&config_path).unwrap();
        let state_dir = dir.path().join("state");
        // A running instance reads its starting state from disk.
        if state != PersistedState::default() {
            state.save_to(&state_dir).unwrap();
        }

        let sink = RecordingSink::new();
        let timer = ManualRefreshTimer::new();
        let clock = Arc::new(SimulatedTimeSource::at_time_of_day(
            NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
        ));
        let scheduler = OverlayScheduler::new(SchedulerParams {
            policy: OverlayColorPolicy::with_intensities(config.intensities()),
            model: config.sun_model().unwrap(),
            refresh_interval: config.refresh_interval(),
            sink: Box::new(sink.clone()),
            permissions,
            timer: Box::new(timer.clone()),
            clock,
            debug_enabled: false,
        });

        let session = OverlaySession::new(
            scheduler,
            config,
            config_path.clone(),
            state,
            state_dir.clone(),
            false,
        );
        Fixture {
            _dir: dir,
            session,
            sink,
            timer,
            config_path,
            state_dir,
        }
    }

    fn fixture(state: PersistedState) -> Fixture {
        fixture_with(state, Box::new(SwitchablePermission::new(true)))
    }

    fn edit_config(f: &Fixture, key: &str, value: &str) {
        let content = fs::read_to_string(&f.config_path).unwrap();
        let updated = config::builder::update_field_in_content(&content, key, value);
        fs::write(&f.config_path, updated).unwrap();
    }

    #[test]
    fn test_start_disabled_writes_no_state() {
        let mut f = fixture(PersistedState::default());
        f.session.start().unwrap();
        assert!(!f.session.scheduler().is_active());
        assert!(f.sink.events().is_empty());
        assert!(!f.state_dir.exists());
    }

    #[test]
    fn test_start_restores_active_overlay() {
        let state = PersistedState {
            is_active: true,
            ..PersistedState::default()
        };
        let mut f = fixture(state);
        f.session.start().unwrap();
        assert!(f.session.scheduler().is_active());
        assert_eq!(f.timer.pending_count(), 1);
        assert!(PersistedState::load_from(&f.state_dir).unwrap().is_active);
    }

    #[test]
    fn test_start_enabled_config_persists_active_flag() {
        let mut f = fixture(PersistedState::default());
        edit_config(&f, "start_enabled", "true");
        f.session.config = Config::load_from_path(&f.config_path).unwrap();

        f.session.start().unwrap();
        assert!(f.session.scheduler().is_active());
        assert!(PersistedState::load_from(&f.state_dir).unwrap().is_active);
    }

    #[test]
    fn test_reload_applies_new_intensities() {
        let state = PersistedState {
            is_active: true,
            ..PersistedState::default()
        };
        let mut f = fixture(state);
        f.session.start().unwrap();

        edit_config(&f, "color_intensity", "20");
        f.session.handle_message(SignalMessage::Reload).unwrap();

        assert_eq!(
            f.session.scheduler().intensities(),
            OverlayIntensities::new(20, 80)
        );
        assert_eq!(f.session.config().color_intensity, Some(20));
        assert_eq!(f.timer.pending_count(), 1);
        let expected =
            OverlayColorPolicy::with_intensities(OverlayIntensities::new(20, 80)).overlay_color_max();
        assert_eq!(f.sink.current_color(), Some(expected));
    }

    #[test]
    fn test_reload_with_invalid_config_keeps_previous() {
        let mut f = fixture(PersistedState::default());
        f.session.start().unwrap();
        let before = f.session.config().clone();

        fs::write(&f.config_path, "color_intensity = 500\n").unwrap();
        f.session.reload().unwrap();
        assert_eq!(f.session.config(), &before);
    }

    #[test]
    fn test_reload_updates_sun_times_and_interval() {
        let mut f = fixture(PersistedState::default());
        f.session.start().unwrap();

        edit_config(&f, "sunset", "\"09:00:00 PM\"");
        edit_config(&f, "refresh_interval", "5");
        f.session.reload().unwrap();

        let expected = SunCycleModel::new("08:00:00 AM", "09:00:00 PM").unwrap();
        assert_eq!(f.session.scheduler().model(), expected);

        f.session.scheduler().enable().unwrap();
        assert_eq!(f.timer.periods(), vec![Duration::from_secs(300)]);
    }

    #[test]
    fn test_state_file_toggles_overlay() {
        let mut f = fixture(PersistedState::default());
        f.session.start().unwrap();

        crate::commands::toggle::set_active_in(&f.state_dir, true).unwrap();
        f.session.reload().unwrap();
        assert!(f.session.scheduler().is_active());
        assert!(f.session.state().is_active);

        crate::commands::toggle::set_active_in(&f.state_dir, false).unwrap();
        f.session.reload().unwrap();
        assert!(!f.session.scheduler().is_active());
        assert_eq!(f.timer.pending_count(), 0);
    }

    #[test]
    fn test_reload_without_changes_does_not_rewrite_state() {
        let mut f = fixture(PersistedState::default());
        f.session.start().unwrap();
        crate::commands::toggle::set_active_in(&f.state_dir, true).unwrap();
        f.session.reload().unwrap();

        let state_file = f.state_dir.join(crate::common::constants::STATE_FILE_NAME);
        let modified = fs::metadata(&state_file).unwrap().modified().unwrap();
        std::thread::sleep(Duration::from_millis(20));
        f.session.reload().unwrap();
        assert_eq!(fs::metadata(&state_file).unwrap().modified().unwrap(), modified);
    }

    #[test]
    fn test_failed_reload_keeps_running_and_retries() {
        let state = PersistedState {
            is_active: true,
            ..PersistedState::default()
        };
        let mut f = fixture(state);
        f.session.start().unwrap();

        edit_config(&f, "color_intensity", "20");
        f.sink.fail_next_call();
        assert!(f.session.reload().is_err());
        f.sink.fail_next_call();
        assert!(f.session.process(SignalMessage::Reload));

        // Still on and refreshing; the new config is retried by the next reload.
        assert!(f.session.scheduler().is_active());
        assert_eq!(f.timer.pending_count(), 1);
        assert_eq!(f.session.config().color_intensity, Some(80));
        assert!(PersistedState::load_from(&f.state_dir).unwrap().is_active);

        assert!(f.session.process(SignalMessage::Reload));
        assert_eq!(f.session.config().color_intensity, Some(20));
        assert_eq!(
            f.session.scheduler().intensities(),
            OverlayIntensities::new(20, 80)
        );

        assert!(!f.session.process(SignalMessage::Shutdown));
        f.session.shutdown().unwrap();
        assert_eq!(f.sink.current_color(), None);
    }

    #[test]
    fn test_shutdown_removes_overlay_but_remembers_it() {
        let state = PersistedState {
            is_active: true,
            ..PersistedState::default()
        };
        let mut f = fixture(state);
        f.session.start().unwrap();

        assert!(!f.session.handle_message(SignalMessage::Shutdown).unwrap());
        f.session.shutdown().unwrap();

        assert!(!f.session.scheduler().is_active());
        assert_eq!(f.sink.current_color(), None);
        assert_eq!(f.timer.pending_count(), 0);
        // The user left it on, so the next start switches it on again.
        assert!(f.session.state().is_active);
    }

    #[test]
    fn test_enable_without_permission_stays_inactive() {
        let state = PersistedState {
            is_active: true,
            ..PersistedState::default()
        };
        let permissions = SwitchablePermission::new(false);
        let mut f = fixture_with(state, Box::new(permissions.clone()));
        f.session.start().unwrap();

        assert!(!f.session.scheduler().is_active());
        assert_eq!(permissions.request_count(), 1);
        assert!(!PersistedState::load_from(&f.state_dir).unwrap().is_active);
    }
}
