//! Sinks that ship with the binary.

use anyhow::Result;

use super::OverlaySink;
use crate::color::ArgbColor;

/// Reports overlay changes on the terminal.
///
/// Used when no compositor-side renderer is attached; repeated pushes of the
/// same color are collapsed to keep refresh ticks quiet.
#[derive(Debug, Default)]
pub struct TerminalSink {
    current: Option<ArgbColor>,
    debug_enabled: bool,
}

impl TerminalSink {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            current: None,
            debug_enabled,
        }
    }

    pub fn current_color(&self) -> Option<ArgbColor> {
        self.current
    }
}

impl OverlaySink for TerminalSink {
    fn apply_color(&mut self, color: ArgbColor) -> Result<()> {
        if self.current == Some(color) {
            if self.debug_enabled {
                log_debug!("Overlay unchanged at {color}");
            }
            return Ok(());
        }

        if color.is_transparent() {
            log_decorated!("Overlay clear ({color})");
        } else {
            log_decorated!("Overlay color {color}");
            if self.debug_enabled {
                log_indented!(
                    "alpha {} red {} green {} blue {}",
                    color.alpha,
                    color.red,
                    color.green,
                    color.blue
                );
            }
        }
        self.current = Some(color);
        Ok(())
    }

    fn remove_overlay(&mut self) -> Result<()> {
        if self.current.take().is_some() {
            log_decorated!("Overlay removed");
        }
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "terminal"
    }
}
