//! Hot reloading of the configuration and the persisted state.
//!
//! A running `lightly` watches the directory holding `lightly.toml` and its
//! state directory. Editing the config, `lightly set`, `lightly enable` and
//! `lightly disable` all end up as a [`SignalMessage::Reload`] on the main
//! loop's channel.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Instant;

use super::get_config_path;
use crate::common::constants::{CONFIG_FILE_NAME, CONFIG_WATCH_DEBOUNCE, STATE_FILE_NAME};
use crate::common::utils::private_path;
use crate::io::signals::SignalMessage;

/// Watches the files a running instance reads and asks it to reload on change.
pub struct ConfigWatcher {
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
    state_dir: Option<PathBuf>,
}

impl ConfigWatcher {
    pub fn new(
        signal_sender: Sender<SignalMessage>,
        state_dir: Option<PathBuf>,
        debug_enabled: bool,
    ) -> Self {
        Self {
            signal_sender,
            debug_enabled,
            state_dir,
        }
    }

    /// Spawn the watcher thread. Returns once watching has started.
    pub fn start(self) -> Result<()> {
        let config_path = get_config_path()?;
        let mut watch_dirs = Vec::new();
        if let Some(parent) = config_path.parent()
            && parent.is_dir()
        {
            watch_dirs.push(parent.to_path_buf());
        }
        if let Some(ref state_dir) = self.state_dir
            && state_dir.is_dir()
        {
            watch_dirs.push(state_dir.clone());
        }

        if watch_dirs.is_empty() {
            if self.debug_enabled {
                log_pipe!();
                log_debug!("Nothing to watch for hot reload");
            }
            return Ok(());
        }

        let (tx, rx) = std::sync::mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        let mut seen = HashSet::new();
        for dir in &watch_dirs {
            // Watching the directory catches editors that replace the file.
            if seen.insert(dir.clone()) {
                watcher
                    .watch(dir, RecursiveMode::NonRecursive)
                    .with_context(|| format!("Failed to watch directory: {}", private_path(dir)))?;
            }
        }

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Watching for configuration changes:");
            for dir in &watch_dirs {
                log_indented!("{}", private_path(dir));
            }
        }

        let signal_sender = self.signal_sender;
        let debug_enabled = self.debug_enabled;
        thread::Builder::new()
            .name("lightly-config-watcher".to_string())
            .spawn(move || {
                // The watcher stops when dropped, so it lives in this thread.
                let _watcher = watcher;
                let mut last_reload: Option<Instant> = None;

                for event in rx {
                    if !event.paths.iter().any(|path| is_watched_file(path)) {
                        continue;
                    }

                    if last_reload.is_some_and(|at| at.elapsed() < CONFIG_WATCH_DEBOUNCE) {
                        continue;
                    }

                    if debug_enabled {
                        log_pipe!();
                        log_info!("Change detected, reloading");
                    }

                    if signal_sender.send(SignalMessage::Reload).is_err() {
                        break;
                    }
                    last_reload = Some(Instant::now());
                }
            })
            .context("Failed to spawn config watcher thread")?;

        Ok(())
    }
}

/// Whether an event path is the config or state file (or an editor temp copy).
fn is_watched_file(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.starts_with(CONFIG_FILE_NAME) || name == STATE_FILE_NAME)
}

pub fn start_config_watcher(
    signal_sender: Sender<SignalMessage>,
    state_dir: Option<PathBuf>,
    debug_enabled: bool,
) -> Result<()> {
    ConfigWatcher::new(signal_sender, state_dir, debug_enabled).start()
}
