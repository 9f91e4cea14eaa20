// TOML config adapter - Configuration management using TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::SegmentModel;
use crate::engine::command::DEFAULT_ENCODER;
use crate::planner::DEFAULT_CONTAINER;
use crate::utils::logging::{LogFormat, LogLevel};

use super::probe_ffprobe::DEFAULT_PROBE;

/// Config files looked up, in order, when none is given explicitly
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["splitter.toml", "config/splitter.toml"];

/// Default directory for extracted segments
pub const DEFAULT_OUTPUT_DIR: &str = "output_videos";

/// Resolved application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Container extension of output files, without the dot
    pub container: String,
    pub output_dir: PathBuf,
    /// Per-job limit in seconds; 0 disables it
    pub job_timeout_secs: u64,
    pub segment_model: SegmentModel,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: DEFAULT_ENCODER.to_string(),
            ffprobe_path: DEFAULT_PROBE.to_string(),
            container: DEFAULT_CONTAINER.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            job_timeout_secs: 300,
            segment_model: SegmentModel::Adjacent,
            log_level: LogLevel::Info,
            log_format: LogFormat::Pretty,
        }
    }
}

impl SplitterConfig {
    pub fn job_timeout(&self) -> Option<Duration> {
        match self.job_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    splitter: SplitterConfig,
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// First existing file among [`DEFAULT_CONFIG_PATHS`]
    pub fn discover() -> Option<PathBuf> {
        DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file())
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<SplitterConfig, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::FsFail(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse a `[splitter]` section; missing keys keep their defaults
    pub fn parse(content: &str) -> Result<SplitterConfig, DomainError> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| DomainError::BadArgs(format!("Failed to parse TOML config: {}", e)))?;
        Self::validate(&file.splitter)?;
        Ok(file.splitter)
    }

    /// Serialize to a TOML document with a `[splitter]` section
    pub fn to_toml_string(config: &SplitterConfig) -> Result<String, DomainError> {
        toml::to_string_pretty(&ConfigFile {
            splitter: config.clone(),
        })
        .map_err(|e| DomainError::BadArgs(format!("Failed to serialize config: {}", e)))
    }

    /// Write the config, creating parent directories
    pub fn save(config: &SplitterConfig, path: &Path) -> Result<(), DomainError> {
        Self::validate(config)?;
        let content = Self::to_toml_string(config)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DomainError::FsFail(format!("Failed to create config directory: {}", e)))?;
        }
        std::fs::write(path, content)
            .map_err(|e| DomainError::FsFail(format!("Failed to write config file: {}", e)))?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    pub fn validate(config: &SplitterConfig) -> Result<(), DomainError> {
        let container = config.container.trim_start_matches('.');
        if container.is_empty() || container.contains(['/', '\\']) {
            return Err(DomainError::BadArgs(format!(
                "Invalid container extension: '{}'",
                config.container
            )));
        }
        if config.ffmpeg_path.trim().is_empty() {
            return Err(DomainError::BadArgs("ffmpeg_path must not be empty".to_string()));
        }
        if config.ffprobe_path.trim().is_empty() {
            return Err(DomainError::BadArgs("ffprobe_path must not be empty".to_string()));
        }
        Ok(())
    }
}
