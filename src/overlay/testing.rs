//! Recording stand-ins for the overlay sink and permission seams.
//!
//! Available to unit tests and, through the `testing-support` feature, to the
//! integration tests under `tests/`.

use anyhow::{Result, bail};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{OverlaySink, PermissionOracle};
use crate::color::ArgbColor;

/// One call observed by a [`RecordingSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    Applied(ArgbColor),
    Removed,
}

/// Sink that remembers every call. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
    fail_next: Arc<AtomicBool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The most recently applied color, if the overlay is currently shown.
    pub fn current_color(&self) -> Option<ArgbColor> {
        match self.events().last() {
            Some(SinkEvent::Applied(color)) => Some(*color),
            _ => None,
        }
    }

    pub fn applied_colors(&self) -> Vec<ArgbColor> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Applied(color) => Some(color),
                SinkEvent::Removed => None,
            })
            .collect()
    }

    /// Make the next sink call fail once.
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn record(&self, event: SinkEvent) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            bail!("recording sink asked to fail");
        }
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
        Ok(())
    }
}

impl OverlaySink for RecordingSink {
    fn apply_color(&mut self, color: ArgbColor) -> Result<()> {
        self.record(SinkEvent::Applied(color))
    }

    fn remove_overlay(&mut self) -> Result<()> {
        self.record(SinkEvent::Removed)
    }

    fn sink_name(&self) -> &'static str {
        "recording"
    }
}

/// Permission oracle whose answer tests can flip. Clones share the flag.
#[derive(Debug, Clone)]
pub struct SwitchablePermission {
    granted: Arc<AtomicBool>,
    requests: Arc<Mutex<usize>>,
}

impl SwitchablePermission {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: Arc::new(AtomicBool::new(granted)),
            requests: Arc::new(Mutex::new(0)),
        }
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        *self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PermissionOracle for SwitchablePermission {
    fn has_draw_overlay_permission(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn request_draw_overlay_permission(&mut self) {
        *self.requests.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }
}
