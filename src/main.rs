//! Main application entry point.
//!
//! Parses the command line, applies the global `--config` directory and hands
//! off to the runner or a one-shot command.

use anyhow::Result;

use lightly::args::{self, CliAction, ParsedArgs};
use lightly::commands;
use lightly::commands::simulate::SimulationParams;
use lightly::common::constants::EXIT_FAILURE;
use lightly::{Lightly, config, log_error_exit};

fn main() {
    let parsed_args = ParsedArgs::from_env();

    if let Err(e) = dispatch(parsed_args.action) {
        log_error_exit!("{e}");
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(EXIT_FAILURE);
    }
}

fn dispatch(action: CliAction) -> Result<()> {
    match action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::ShowCommandUsageDueToError { command } => {
            commands::help::show_command_usage(&command);
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::HelpCommand { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::Run {
            debug_enabled,
            config_dir,
        } => {
            config::set_config_dir(config_dir)?;
            Lightly::new(debug_enabled).run()
        }
        CliAction::StatusCommand {
            debug_enabled,
            config_dir,
            at,
            json,
        } => {
            config::set_config_dir(config_dir)?;
            commands::status::handle_status_command(at, json, debug_enabled)
        }
        CliAction::SimulateCommand {
            debug_enabled,
            config_dir,
            from,
            step_minutes,
            hours,
            multiplier,
        } => {
            config::set_config_dir(config_dir)?;
            let params = SimulationParams {
                from,
                step_minutes,
                hours,
                multiplier,
            };
            commands::simulate::handle_simulate_command(params, debug_enabled)
        }
        CliAction::SetCommand {
            debug_enabled: _,
            config_dir,
            fields,
        } => {
            config::set_config_dir(config_dir)?;
            commands::set::handle_set_command(&fields)
        }
        CliAction::EnableCommand {
            debug_enabled,
            config_dir,
        } => {
            config::set_config_dir(config_dir)?;
            commands::toggle::handle_toggle_command(true, debug_enabled)
        }
        CliAction::DisableCommand {
            debug_enabled,
            config_dir,
        } => {
            config::set_config_dir(config_dir)?;
            commands::toggle::handle_toggle_command(false, debug_enabled)
        }
        CliAction::ImportCommand {
            debug_enabled,
            config_dir,
            kind,
            path,
        } => {
            config::set_config_dir(config_dir)?;
            commands::import::handle_import_command(kind, &path, debug_enabled)
        }
    }
}
