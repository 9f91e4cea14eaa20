//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::adapters::toml_config::{SplitterConfig, TomlConfigAdapter};
use crate::cli::{Cli, Commands};
use crate::domain::model::SegmentModel;
use crate::error::{SplitXError, SplitXResult};
use crate::utils::logging::{LogFormat, LogLevel};

/// Environment variables and the settings they override
pub const ENV_MAPPINGS: [(&str, &str); 8] = [
    ("SPLITX_FFMPEG", "ffmpeg_path"),
    ("SPLITX_FFPROBE", "ffprobe_path"),
    ("SPLITX_CONTAINER", "container"),
    ("SPLITX_OUTPUT_DIR", "output_dir"),
    ("SPLITX_JOB_TIMEOUT", "job_timeout_secs"),
    ("SPLITX_SEGMENT_MODEL", "segment_model"),
    ("SPLITX_LOG_LEVEL", "log_level"),
    ("SPLITX_LOG_FORMAT", "log_format"),
];

/// Settings after every layer was applied, with where they came from.
///
/// Resolution runs before the log subscriber exists, so the sources are
/// reported afterwards through [`ResolvedConfig::log_sources`].
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: SplitterConfig,
    /// Config file that was read, if any
    pub source: Option<PathBuf>,
    /// `SPLITX_*` variables that overrode a setting
    pub env_overrides: Vec<&'static str>,
}

impl ResolvedConfig {
    pub fn log_sources(&self) {
        match &self.source {
            Some(path) => info!("Loaded configuration from: {}", path.display()),
            None => debug!("No configuration file found, using defaults"),
        }
        for var in &self.env_overrides {
            info!("Found environment override: {}", var);
        }
        if !self.env_overrides.is_empty() {
            info!("Applied {} environment variable overrides", self.env_overrides.len());
        }
        debug!(config = ?self.config, "Configuration resolved");
    }
}

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(cli: &Cli) -> SplitXResult<ResolvedConfig> {
    let (mut config, source) = load_config_file(cli.config.as_deref())?;
    let env_overrides = apply_environment(&mut config, |var| std::env::var(var).ok())?;
    apply_cli_overrides(&mut config, cli)?;
    TomlConfigAdapter::validate(&config)?;
    Ok(ResolvedConfig {
        config,
        source,
        env_overrides,
    })
}

/// An explicit file must load; otherwise the first default location found is used
fn load_config_file(explicit: Option<&Path>) -> SplitXResult<(SplitterConfig, Option<PathBuf>)> {
    let path: Option<PathBuf> = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => TomlConfigAdapter::discover(),
    };

    match path {
        Some(path) => Ok((TomlConfigAdapter::load(&path)?, Some(path))),
        None => Ok((SplitterConfig::default(), None)),
    }
}

/// Apply `SPLITX_*` overrides read through `lookup`, returning the variables used
pub fn apply_environment<F>(config: &mut SplitterConfig, lookup: F) -> SplitXResult<Vec<&'static str>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_overrides = Vec::new();

    for (var, key) in ENV_MAPPINGS {
        let Some(value) = lookup(var) else {
            continue;
        };
        let invalid = |message: String| SplitXError::InvalidEnv {
            var: var.to_string(),
            message,
        };

        match key {
            "ffmpeg_path" => config.ffmpeg_path = value,
            "ffprobe_path" => config.ffprobe_path = value,
            "container" => config.container = value,
            "output_dir" => config.output_dir = PathBuf::from(value),
            "job_timeout_secs" => {
                config.job_timeout_secs = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| invalid(e.to_string()))?
            }
            "segment_model" => {
                config.segment_model = SegmentModel::parse(&value).map_err(|e| invalid(e.to_string()))?
            }
            "log_level" => {
                config.log_level = LogLevel::parse(&value).map_err(|e| invalid(e.to_string()))?
            }
            "log_format" => {
                config.log_format = LogFormat::parse(&value).map_err(|e| invalid(e.to_string()))?
            }
            _ => continue,
        }
        env_overrides.push(var);
    }

    Ok(env_overrides)
}

/// Apply CLI argument overrides to configuration
fn apply_cli_overrides(config: &mut SplitterConfig, cli: &Cli) -> SplitXResult<()> {
    if let Some(level) = &cli.log_level {
        config.log_level = LogLevel::parse(level)?;
    }
    if let Some(format) = &cli.log_format {
        config.log_format = LogFormat::parse(format)?;
    }

    if let Commands::Plan(args) | Commands::Split(args) = &cli.command {
        if let Some(model) = &args.model {
            config.segment_model = SegmentModel::parse(model)?;
        }
        if let Some(out_dir) = &args.out_dir {
            config.output_dir = out_dir.clone();
        }
        if let Some(container) = &args.container {
            config.container = container.trim_start_matches('.').to_string();
        }
        if let Some(timeout) = args.timeout {
            config.job_timeout_secs = timeout;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let mut config = SplitterConfig::default();
        let applied = apply_environment(
            &mut config,
            env(&[
                ("SPLITX_FFMPEG", "/opt/ffmpeg/bin/ffmpeg"),
                ("SPLITX_JOB_TIMEOUT", "60"),
                ("SPLITX_SEGMENT_MODEL", "ranges"),
            ]),
        )
        .unwrap();

        assert_eq!(applied, vec!["SPLITX_FFMPEG", "SPLITX_JOB_TIMEOUT", "SPLITX_SEGMENT_MODEL"]);
        assert_eq!(config.ffmpeg_path, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.job_timeout_secs, 60);
        assert_eq!(config.segment_model, SegmentModel::Ranges);
        assert_eq!(config.container, "mp4");
    }

    #[test]
    fn test_invalid_environment_value_names_the_variable() {
        let mut config = SplitterConfig::default();
        let error = apply_environment(&mut config, env(&[("SPLITX_JOB_TIMEOUT", "soon")])).unwrap_err();
        assert!(error.to_string().contains("SPLITX_JOB_TIMEOUT"));
    }

    #[test]
    fn test_cli_overrides_environment() {
        let mut config = SplitterConfig::default();
        apply_environment(&mut config, env(&[("SPLITX_CONTAINER", "mkv"), ("SPLITX_LOG_LEVEL", "warn")])).unwrap();

        let cli = Cli::parse_from([
            "splitter",
            "--log-level",
            "debug",
            "plan",
            "-i",
            "in.mp4",
            "--container",
            ".mov",
            "--timeout",
            "0",
            "-o",
            "clips",
        ]);
        apply_cli_overrides(&mut config, &cli).unwrap();

        assert_eq!(config.container, "mov");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.job_timeout(), None);
        assert_eq!(config.output_dir, PathBuf::from("clips"));
    }

    #[test]
    fn test_explicit_config_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config_file(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splitter.toml");
        std::fs::write(&path, "[splitter]\noutput_dir = \"cuts\"\n").unwrap();

        let (config, source) = load_config_file(Some(&path)).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("cuts"));
        assert_eq!(source, Some(path));
    }
}
