//! `lightly enable` and `lightly disable`.
//!
//! Both only flip the persisted active flag. A running instance watches the
//! state file and switches the overlay to match.

use anyhow::Result;
use std::path::Path;

use crate::common::utils::private_path;
use crate::state::{PersistedState, current_state_dir};

/// Handle `enable` (`active = true`) or `disable` (`active = false`).
pub fn handle_toggle_command(active: bool, debug_enabled: bool) -> Result<()> {
    log_version!();

    let state_dir = current_state_dir()?;
    let changed = set_active_in(&state_dir, active)?;
    let word = if active { "enabled" } else { "disabled" };

    if changed {
        log_block_start!("Overlay {word}");
        if debug_enabled {
            log_indented!("State saved to {}", private_path(&state_dir));
        }
        log_indented!("A running lightly picks this up automatically");
    } else {
        log_block_start!("Overlay is already {word}");
    }

    log_end!();
    Ok(())
}

/// Store `active` in the state under `state_dir`. Returns whether it changed.
pub fn set_active_in(state_dir: &Path, active: bool) -> Result<bool> {
    let mut state = PersistedState::load_from(state_dir)?;
    if state.is_active == active {
        return Ok(false);
    }
    state.is_active = active;
    state.save_to(state_dir)?;
    Ok(true)
}

/// Display help for the enable and disable commands
pub fn display_help(active: bool) {
    let (name, alias, effect) = if active {
        ("enable", "on", "Switch the overlay on")
    } else {
        ("disable", "off", "Switch the overlay off")
    };
    log_version!();
    log_block_start!("{name} - {effect}");
    log_block_start!("Usage: lightly {name}");
    log_indented!("Alias: lightly {alias}");
    log_block_start!("Notes:");
    log_indented!("The choice is remembered across restarts.");
    log_indented!("A running lightly applies it right away.");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_active_round_trip() {
        let dir = tempdir().unwrap();

        assert!(set_active_in(dir.path(), true).unwrap());
        assert!(PersistedState::load_from(dir.path()).unwrap().is_active);

        assert!(!set_active_in(dir.path(), true).unwrap());

        assert!(set_active_in(dir.path(), false).unwrap());
        assert!(!PersistedState::load_from(dir.path()).unwrap().is_active);
    }

    #[test]
    fn test_disable_without_state_writes_nothing() {
        let dir = tempdir().unwrap();
        assert!(!set_active_in(dir.path(), false).unwrap());
        assert!(
            !dir.path()
                .join(crate::common::constants::STATE_FILE_NAME)
                .exists()
        );
    }

    #[test]
    fn test_toggle_keeps_location() {
        let dir = tempdir().unwrap();
        let mut state = PersistedState::default();
        state.location.region_name = "Gothenburg".to_string();
        state.location.country = "Sweden".to_string();
        state.save_to(dir.path()).unwrap();

        set_active_in(dir.path(), true).unwrap();
        let loaded = PersistedState::load_from(dir.path()).unwrap();
        assert!(loaded.is_active);
        assert_eq!(loaded.location.humanized(), "Gothenburg, Sweden");
    }
}
