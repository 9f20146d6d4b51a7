//! # Lightly Library
//!
//! Internal library for the lightly binary: a sun-cycle driven screen dimming
//! overlay.
//!
//! This library exists to enable testing of the engine and the application
//! logic, and to keep CLI dispatch (main.rs) separate from both.
//!
//! ## Architecture
//!
//! - **Engine**: `color` (ARGB values and the blend law), `sun_cycle`
//!   (sunrise/sunset to cycle positions) and `overlay::policy` (intensities
//!   and an instant to an overlay color). Pure, no I/O, no logging.
//! - **Overlay control**: `overlay::scheduler` owns enable/disable/preview and
//!   the periodic refresh, talking to sink, permission and timer traits.
//! - **Application**: `config` (TOML settings with hot reload), `state`
//!   (persisted session), `data` (sun and location payloads), `commands`
//!   (CLI subcommands) and the `Lightly` runner.
//! - **Infrastructure**: signal handling, clock abstraction and logging.

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod color;
pub mod commands;
pub mod common;
pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod overlay;
pub mod state;
pub mod sun_cycle;
pub mod time_source;

mod lightly;

pub use error::{EngineError, EngineResult};
pub use lightly::{Lightly, OverlaySession};
