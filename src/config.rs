//! Configuration file handling for jpeg-gray.
//!
//! Loads configuration from `<config dir>/jpeg-gray/config.toml` or a custom
//! path given with `--config`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::codec::jpeg::DEFAULT_QUALITY;
use crate::pipeline::TransformOptions;

/// Configuration file structure for jpeg-gray.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub transform: TransformConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct PathsConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EncoderConfig {
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransformConfig {
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

fn default_true() -> bool {
    true
}

/// Contents written by `jpeg-gray config init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# jpeg-gray configuration

[paths]
# Source RGB JPEG
# input = "input.jpg"
# Destination grayscale JPEG
# output = "output.jpg"

[encoder]
# JPEG quality, 1-100
quality = 75

[transform]
# Convert rows on all cores
parallel = true
"#;

impl Config {
    /// Load configuration from a file path, or the default location.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let requested = path.is_some();
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);
        if path.exists() {
            Self::load_from_explicit(&path)
        } else {
            if requested {
                log::warn!("config file {} not found, using defaults", path.display());
            } else {
                log::debug!("no config file at {}, using defaults", path.display());
            }
            Ok(Config::default())
        }
    }

    /// Load configuration from a file that must exist.
    pub fn load_from_explicit(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate(path)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.encoder.quality) {
            return Err(ConfigError::InvalidQuality {
                path: path.to_path_buf(),
                quality: self.encoder.quality,
            });
        }
        Ok(())
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            quality: self.encoder.quality,
            parallel: self.transform.parallel,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", path.display())]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid quality {quality} in config file '{}' (expected 1-100)", path.display())]
    InvalidQuality { path: PathBuf, quality: u8 },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("jpeg-gray").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/jpeg-gray/config.toml")
        })
}
