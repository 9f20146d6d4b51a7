//! Help command implementation for lightly.
//!
//! Dispatches `lightly help [COMMAND]` to the per-command help screens.

use anyhow::Result;

use crate::args::canonical_command;

/// Show brief usage for a command (used for error messages)
pub fn show_command_usage(command: &str) {
    match canonical_command(command) {
        Some("run") => log_block_start!("Usage: lightly [run]"),
        Some("status") => log_block_start!("Usage: lightly status [--at HH:MM] [--json]"),
        Some("simulate") => log_block_start!(
            "Usage: lightly simulate [--from HH:MM] [--step MIN] [--hours N] [--multiplier X]"
        ),
        Some("set") => {
            log_block_start!("Usage: lightly set <field>=<value> [<field>=<value>...]")
        }
        Some("enable") => log_block_start!("Usage: lightly enable"),
        Some("disable") => log_block_start!("Usage: lightly disable"),
        Some("import") => log_block_start!("Usage: lightly import <sun|location> <FILE>"),
        Some("help") => log_block_start!("Usage: lightly help [COMMAND]"),
        _ => log_block_start!("Usage: lightly [OPTIONS] [COMMAND]"),
    }
    log_indented!("Run 'lightly help {command}' for details");
    log_end!();
}

/// Run the help command (dispatcher)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    let Some(command) = command else {
        display_general_help();
        return Ok(());
    };

    match canonical_command(command) {
        Some("run") => display_run_help(),
        Some("status") => super::status::display_help(),
        Some("simulate") => super::simulate::display_help(),
        Some("set") => super::set::display_help(),
        Some("enable") => super::toggle::display_help(true),
        Some("disable") => super::toggle::display_help(false),
        Some("import") => super::import::display_help(),
        Some("help") => display_help_help(),
        _ => {
            log_warning_standalone!("Unknown command: {}", command);
            display_general_help();
        }
    }
    Ok(())
}

/// Display general help focused on commands (for the help command)
fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("run                      Show the overlay and follow the sun (default)");
    log_indented!("status, st               Show the sun position and overlay color");
    log_indented!("simulate, sim            Replay a day against a simulated clock");
    log_indented!("set, s <field>=<value>   Update configuration field(s)");
    log_indented!("enable, on               Switch the overlay on");
    log_indented!("disable, off             Switch the overlay off");
    log_indented!("import, i <kind> <file>  Import sun times or a location");
    log_indented!("help, h [COMMAND]        Show detailed help for a command");
    log_pipe!();
    log_info!("Use 'lightly help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'lightly --help' to see all options and general usage.");
    log_end!();
}

fn display_run_help() {
    log_version!();
    log_block_start!("run - Show the overlay and follow the sun");
    log_block_start!("Usage: lightly [run]");
    log_block_start!("Behavior:");
    log_indented!("Refreshes the overlay color every refresh_interval minutes while enabled.");
    log_indented!("Reloads when lightly.toml or the saved state changes, or on SIGUSR2.");
    log_indented!("Removes the overlay and saves its state on SIGINT, SIGTERM or SIGHUP.");
    log_end!();
}

/// Display help for the help command itself
fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: lightly help [COMMAND]");
    log_block_start!("Arguments:");
    log_indented!("COMMAND  Optional command to get help for");
    log_indented!("         If omitted, shows general help");
    log_block_start!("Examples:");
    log_indented!("# Show general help");
    log_indented!("lightly help");
    log_pipe!();
    log_indented!("# Show help for specific commands");
    log_indented!("lightly help set");
    log_indented!("lightly help simulate");
    log_end!();
}
