//! Handlers for the convert run and the config subcommands.

use std::path::{Path, PathBuf};

use super::args::{Args, ConfigAction};
use super::exit::{exit_code, EXIT_CONFIG, EXIT_USAGE};
use crate::config::{default_path as get_config_path, Config, DEFAULT_CONFIG_TOML};
use crate::pipeline::{Pipeline, TransformOptions};

/// Fully merged settings for one conversion: CLI > config file > defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub options: TransformOptions,
}

/// Merge command-line arguments over a loaded config.
pub fn resolve_settings(args: &Args, config: &Config) -> Result<Settings, String> {
    let input = args
        .input
        .clone()
        .or_else(|| config.paths.input.clone())
        .ok_or_else(|| "no input file given (pass INPUT or set paths.input)".to_string())?;
    let output = args
        .output
        .clone()
        .or_else(|| config.paths.output.clone())
        .ok_or_else(|| "no output file given (pass OUTPUT or set paths.output)".to_string())?;

    let defaults = config.transform_options();
    let options = TransformOptions {
        quality: args.quality.unwrap_or(defaults.quality),
        parallel: defaults.parallel && !args.sequential,
    };
    Ok(Settings {
        input,
        output,
        options,
    })
}

fn load_config(path: Option<&Path>) -> Result<Config, i32> {
    let loaded = match path {
        Some(path) => Config::load_from_explicit(path),
        None => Config::load(None),
    };
    loaded.map_err(|e| {
        eprintln!("Error: {}", e);
        EXIT_CONFIG
    })
}

/// Run one conversion and return the process exit code.
pub fn run_convert(args: &Args) -> i32 {
    let config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let settings = match resolve_settings(args, &config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_USAGE;
        }
    };

    let mut pipeline = Pipeline::new(&settings.input, &settings.output, settings.options);
    match pipeline.run() {
        Ok(summary) => {
            log::info!(
                "wrote {}x{} grayscale jpeg (quality {})",
                summary.destination.width,
                summary.destination.height,
                settings.options.quality
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            log::debug!("pipeline stopped in state {:?}", pipeline.state());
            exit_code(e.kind())
        }
    }
}

/// Handle config subcommand actions and return the process exit code.
pub fn handle_config_action(action: ConfigAction, config_path: Option<&Path>) -> i32 {
    let config_path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    match action {
        ConfigAction::Show => {
            let config = if config_path.exists() {
                match load_config(Some(config_path.as_path())) {
                    Ok(c) => c,
                    Err(code) => return code,
                }
            } else {
                Config::default()
            };
            println!("Current configuration:");
            match toml::to_string_pretty(&config) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return EXIT_CONFIG;
                }
            }

            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
            0
        }
        ConfigAction::Init => {
            if config_path.exists() {
                eprintln!("Config file already exists: {}", config_path.display());
                eprintln!("Use 'jpeg-gray config show' to view current settings.");
                return EXIT_CONFIG;
            }

            if let Some(parent) = config_path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    eprintln!("Error creating config directory: {}", e);
                    return EXIT_CONFIG;
                }
            }

            if let Err(e) = std::fs::write(&config_path, DEFAULT_CONFIG_TOML) {
                eprintln!("Error writing config file: {}", e);
                return EXIT_CONFIG;
            }

            println!("Created config file: {}", config_path.display());
            0
        }
    }
}
