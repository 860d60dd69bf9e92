//! Command-line interface definitions and helpers.
//!
//! This module contains argument parsing, settings resolution, the config
//! subcommand handlers and the mapping from error kinds to exit codes.

mod args;
mod commands;
mod exit;

pub use args::{Args, Command, ConfigAction};
pub use commands::{handle_config_action, resolve_settings, run_convert, Settings};
pub use exit::{exit_code, EXIT_CONFIG, EXIT_USAGE};
