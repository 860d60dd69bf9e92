//! CLI argument parsing with clap.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Convert an RGB JPEG into a grayscale JPEG
#[derive(Parser, Debug)]
#[command(name = "jpeg-gray")]
#[command(version, about = "Convert an RGB JPEG into a grayscale JPEG", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Source RGB JPEG (default: paths.input from the config file)
    pub input: Option<PathBuf>,

    /// Destination grayscale JPEG (default: paths.output from the config file)
    pub output: Option<PathBuf>,

    /// Output JPEG quality, 1-100
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Convert rows on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}
