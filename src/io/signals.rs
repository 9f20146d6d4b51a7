//! Unix signal handling for the run loop.
//!
//! Signals are turned into [`SignalMessage`]s on an mpsc channel so the main
//! loop has a single place to wait. The config watcher feeds the same channel.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

/// Messages delivered to the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// Re-read configuration and state (SIGUSR2 or a watched file changed).
    Reload,
    /// Stop (SIGTERM, SIGINT, SIGHUP).
    Shutdown,
}

/// Signal handling state shared between threads.
pub struct SignalState {
    /// Cleared once a shutdown has been requested.
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Kept so other producers (the config watcher) can be attached.
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Map a raw signal number to the message it stands for.
pub fn message_for_signal(signal: i32) -> Option<SignalMessage> {
    match signal {
        SIGUSR2 => Some(SignalMessage::Reload),
        SIGINT | SIGTERM | SIGHUP => Some(SignalMessage::Shutdown),
        _ => None,
    }
}

/// Install handlers for SIGINT, SIGTERM, SIGHUP and SIGUSR2.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (signal_sender, signal_receiver) = std::sync::mpsc::channel::<SignalMessage>();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running_clone = Arc::clone(&running);
    let sender = signal_sender.clone();

    thread::Builder::new()
        .name("lightly-signals".to_string())
        .spawn(move || {
            for sig in signals.forever() {
                let Some(message) = message_for_signal(sig) else {
                    continue;
                };

                match message {
                    SignalMessage::Reload => {
                        if debug_enabled {
                            log_pipe!();
                            log_debug!("Received SIGUSR2, reloading");
                        }
                    }
                    SignalMessage::Shutdown => {
                        log_pipe!();
                        log_info!("Received shutdown signal");
                        running_clone.store(false, Ordering::SeqCst);
                    }
                }

                if sender.send(message).is_err() {
                    break;
                }
            }
        })
        .context("failed to spawn signal handler thread")?;

    Ok(SignalState {
        running,
        signal_receiver,
        signal_sender,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_mapping() {
        assert_eq!(message_for_signal(SIGUSR2), Some(SignalMessage::Reload));
        assert_eq!(message_for_signal(SIGINT), Some(SignalMessage::Shutdown));
        assert_eq!(message_for_signal(SIGTERM), Some(SignalMessage::Shutdown));
        assert_eq!(message_for_signal(SIGHUP), Some(SignalMessage::Shutdown));
        assert_eq!(message_for_signal(signal_hook::consts::signal::SIGUSR1), None);
    }
}
