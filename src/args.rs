//! Command-line argument parsing and processing.
//!
//! Global flags (`--debug`, `--config`, `--help`, `--version`) may appear
//! anywhere on the command line. The first remaining word is the command, and
//! everything after it belongs to that command. No command means `run`.

use chrono::NaiveTime;

use crate::common::constants::{MAXIMUM_REFRESH_INTERVAL, MINIMUM_REFRESH_INTERVAL};
use crate::time_source::parse_clock_time;

/// Which kind of payload `import` reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// A sunrise-sunset response; updates the sun times in the config.
    Sun,
    /// A geolocation response; stored in the persisted state.
    Location,
}

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the overlay until a shutdown signal arrives
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Print where the sun and the overlay stand
    StatusCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
        at: Option<NaiveTime>,
        json: bool,
    },
    /// Drive the overlay against a simulated clock
    SimulateCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
        from: NaiveTime,
        step_minutes: u64,
        hours: u64,
        multiplier: f64,
    },
    /// Update configuration field(s)
    SetCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
        fields: Vec<(String, String)>,
    },
    /// Switch the persisted overlay flag on
    EnableCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Switch the persisted overlay flag off
    DisableCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Import sun times or a location from a JSON file
    ImportCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
        kind: ImportKind,
        path: String,
    },
    /// Show detailed help for one command, or the command list
    HelpCommand { command: Option<String> },
    /// A command was given bad arguments; show its usage
    ShowCommandUsageDueToError { command: String },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

pub const DEFAULT_SIMULATE_STEP_MINUTES: u64 = 15;
pub const DEFAULT_SIMULATE_HOURS: u64 = 24;
pub const MAXIMUM_SIMULATE_HOURS: u64 = 168;

/// Flags shared by every command.
struct GlobalFlags {
    debug_enabled: bool,
    config_dir: Option<String>,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// `args` includes the program name, as `std::env::args()` does.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut config_dir: Option<String> = None;
        let mut unknown_arg_found = false;
        let mut rest: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args_vec.len() {
            let arg = &args_vec[i];
            match arg.as_str() {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--config" | "-c" => {
                    if i + 1 < args_vec.len() && !args_vec[i + 1].starts_with('-') {
                        config_dir = Some(args_vec[i + 1].clone());
                        i += 1;
                    } else {
                        log_warning!("Missing directory for --config. Usage: --config <directory>");
                        unknown_arg_found = true;
                    }
                }
                _ => rest.push(arg.clone()),
            }
            i += 1;
        }

        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }

        let Some(command) = rest.first().filter(|word| !word.starts_with('-')).cloned() else {
            // No command: any leftover word is an unknown option.
            if let Some(unknown) = rest.first() {
                log_warning!("Unknown option: {unknown}");
                unknown_arg_found = true;
            }
            let action = if unknown_arg_found {
                CliAction::ShowHelpDueToError
            } else if display_help {
                CliAction::ShowHelp
            } else {
                CliAction::Run {
                    debug_enabled,
                    config_dir,
                }
            };
            return ParsedArgs { action };
        };

        let params = &rest[1..];
        let flags = GlobalFlags {
            debug_enabled,
            config_dir,
        };

        let Some(canonical) = canonical_command(&command) else {
            log_warning!("Unknown command: {command}");
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        };

        if display_help && canonical != "help" {
            return ParsedArgs {
                action: CliAction::HelpCommand {
                    command: Some(canonical.to_string()),
                },
            };
        }
        if unknown_arg_found {
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        let parsed = match canonical {
            "run" => no_params(canonical, params).map(|()| CliAction::Run {
                debug_enabled: flags.debug_enabled,
                config_dir: flags.config_dir,
            }),
            "status" => parse_status(params, flags),
            "simulate" => parse_simulate(params, flags),
            "set" => parse_set(params, flags),
            "enable" => no_params(canonical, params).map(|()| CliAction::EnableCommand {
                debug_enabled: flags.debug_enabled,
                config_dir: flags.config_dir,
            }),
            "disable" => no_params(canonical, params).map(|()| CliAction::DisableCommand {
                debug_enabled: flags.debug_enabled,
                config_dir: flags.config_dir,
            }),
            "import" => parse_import(params, flags),
            _ => Ok(CliAction::HelpCommand {
                command: params.first().cloned(),
            }),
        };

        let action = parsed.unwrap_or_else(|message| {
            log_warning!("{message}");
            CliAction::ShowCommandUsageDueToError {
                command: canonical.to_string(),
            }
        });

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Resolve a command word or its short alias.
pub fn canonical_command(word: &str) -> Option<&'static str> {
    match word {
        "run" => Some("run"),
        "status" | "st" => Some("status"),
        "simulate" | "sim" => Some("simulate"),
        "set" | "s" => Some("set"),
        "enable" | "on" => Some("enable"),
        "disable" | "off" => Some("disable"),
        "import" | "i" => Some("import"),
        "help" | "h" => Some("help"),
        _ => None,
    }
}

fn no_params(command: &str, params: &[String]) -> Result<(), String> {
    match params.first() {
        None => Ok(()),
        Some(extra) => Err(format!("'{command}' takes no arguments, got '{extra}'")),
    }
}

/// Value following an option, which must not itself look like an option.
fn option_value<'a>(params: &'a [String], index: usize, option: &str) -> Result<&'a str, String> {
    params
        .get(index + 1)
        .filter(|value| !value.starts_with("--"))
        .map(String::as_str)
        .ok_or_else(|| format!("Missing value for {option}"))
}

fn parse_bounded(value: &str, option: &str, min: u64, max: u64) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|_| format!("Invalid value for {option}: '{value}' is not a whole number"))?;
    if !(min..=max).contains(&parsed) {
        return Err(format!(
            "Invalid value for {option}: {parsed} (must be between {min} and {max})"
        ));
    }
    Ok(parsed)
}

fn parse_status(params: &[String], flags: GlobalFlags) -> Result<CliAction, String> {
    let mut at = None;
    let mut json = false;

    let mut i = 0;
    while i < params.len() {
        match params[i].as_str() {
            "--at" => {
                at = Some(parse_clock_time(option_value(params, i, "--at")?)?);
                i += 1;
            }
            "--json" => json = true,
            other => return Err(format!("Unknown argument for status: {other}")),
        }
        i += 1;
    }

    Ok(CliAction::StatusCommand {
        debug_enabled: flags.debug_enabled,
        config_dir: flags.config_dir,
        at,
        json,
    })
}

fn parse_simulate(params: &[String], flags: GlobalFlags) -> Result<CliAction, String> {
    let mut from = NaiveTime::MIN;
    let mut step_minutes = DEFAULT_SIMULATE_STEP_MINUTES;
    let mut hours = DEFAULT_SIMULATE_HOURS;
    let mut multiplier = 0.0;

    let mut i = 0;
    while i < params.len() {
        match params[i].as_str() {
            "--from" => {
                from = parse_clock_time(option_value(params, i, "--from")?)?;
                i += 1;
            }
            "--step" => {
                step_minutes = parse_bounded(
                    option_value(params, i, "--step")?,
                    "--step",
                    MINIMUM_REFRESH_INTERVAL,
                    MAXIMUM_REFRESH_INTERVAL,
                )?;
                i += 1;
            }
            "--hours" => {
                hours = parse_bounded(
                    option_value(params, i, "--hours")?,
                    "--hours",
                    1,
                    MAXIMUM_SIMULATE_HOURS,
                )?;
                i += 1;
            }
            "--multiplier" => {
                let value = option_value(params, i, "--multiplier")?;
                let parsed = value
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid multiplier: '{value}'"))?;
                // 0 means fast-forward; anything else must be a sane speed-up.
                if parsed != 0.0 && !(0.1..=3600.0).contains(&parsed) {
                    return Err(format!(
                        "Invalid multiplier: {parsed}. Must be 0 (fast-forward) or between 0.1 and 3600."
                    ));
                }
                multiplier = parsed;
                i += 1;
            }
            "--fast-forward" => multiplier = 0.0,
            other => return Err(format!("Unknown argument for simulate: {other}")),
        }
        i += 1;
    }

    Ok(CliAction::SimulateCommand {
        debug_enabled: flags.debug_enabled,
        config_dir: flags.config_dir,
        from,
        step_minutes,
        hours,
        multiplier,
    })
}

/// `field=value` words, or `field value` pairs, in any mix.
fn parse_set(params: &[String], flags: GlobalFlags) -> Result<CliAction, String> {
    let mut fields = Vec::new();

    let mut i = 0;
    while i < params.len() {
        let word = &params[i];
        if word.starts_with("--") {
            return Err(format!("Unknown argument for set: {word}"));
        }
        if let Some((field, value)) = word.split_once('=') {
            if field.is_empty() || value.is_empty() {
                return Err(format!("Expected <field>=<value>, got '{word}'"));
            }
            fields.push((field.to_string(), value.to_string()));
            i += 1;
        } else if let Some(value) = params.get(i + 1) {
            fields.push((word.clone(), value.clone()));
            i += 2;
        } else {
            return Err(format!("Missing value for field '{word}'"));
        }
    }

    if fields.is_empty() {
        return Err("Missing field or value".to_string());
    }

    Ok(CliAction::SetCommand {
        debug_enabled: flags.debug_enabled,
        config_dir: flags.config_dir,
        fields,
    })
}

fn parse_import(params: &[String], flags: GlobalFlags) -> Result<CliAction, String> {
    let kind = match params.first().map(String::as_str) {
        Some("sun") | Some("sun-times") => ImportKind::Sun,
        Some("location") | Some("loc") => ImportKind::Location,
        Some(other) => {
            return Err(format!(
                "Unknown import kind: {other} (use 'sun' or 'location')"
            ));
        }
        None => return Err("Missing import kind".to_string()),
    };

    let path = match params.get(1) {
        Some(path) if !path.starts_with("--") => path.clone(),
        _ => return Err("Missing file to import".to_string()),
    };
    if let Some(extra) = params.get(2) {
        return Err(format!("Unexpected argument for import: {extra}"));
    }

    Ok(CliAction::ImportCommand {
        debug_enabled: flags.debug_enabled,
        config_dir: flags.config_dir,
        kind,
        path,
    })
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    crate::logger::write_output(&format!("┗ {}\n", env!("CARGO_PKG_DESCRIPTION")));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!("{}", env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("lightly [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("run                    Show the overlay and follow the sun (default)");
    log_indented!("status, st             Show the sun position and overlay color");
    log_indented!("simulate, sim          Replay a day against a simulated clock");
    log_indented!("set, s <field>=<value> Update configuration field(s)");
    log_indented!("enable, on             Switch the overlay on");
    log_indented!("disable, off           Switch the overlay off");
    log_indented!("import, i <kind> <file> Import sun times or a location");
    log_indented!("help, h [COMMAND]      Show detailed help for a command");
    log_end!();
}
