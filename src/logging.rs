//! Logging
//!
//! `tracing` subscriber setup. Settings come from the `[logging]` config
//! section, then CLI flags, then `DECKGEN_LOG*` environment variables, which
//! win over both.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "DECKGEN_LOG";
pub const LOG_FILE_ENV: &str = "DECKGEN_LOG_FILE";
pub const LOG_FORMAT_ENV: &str = "DECKGEN_LOG_FORMAT";
pub const LOG_OUTPUT_ENV: &str = "DECKGEN_LOG_OUTPUT";
pub const LOG_MODULES_ENV: &str = "DECKGEN_LOG_MODULES";

const LOG_FILE_NAME: &str = "deckgen.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ApiError::ConfigError(format!(
                "Invalid log format: {} (expected text or json)",
                other
            ))),
        }
    }
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogOutput {
    #[serde(rename = "stdout")]
    Stdout,
    #[serde(rename = "stderr")]
    Stderr,
    #[default]
    #[serde(rename = "file")]
    File,
    #[serde(rename = "file+stderr")]
    FileAndStderr,
    /// stdout and stderr
    #[serde(rename = "both")]
    Both,
}

impl LogOutput {
    fn uses_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::FileAndStderr)
    }
}

impl FromStr for LogOutput {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            "file+stderr" => Ok(LogOutput::FileAndStderr),
            "both" => Ok(LogOutput::Both),
            other => Err(ApiError::ConfigError(format!(
                "Invalid log output: {} (expected stdout, stderr, file, file+stderr, or both)",
                other
            ))),
        }
    }
}

impl fmt::Display for LogOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogOutput::Stdout => "stdout",
            LogOutput::Stderr => "stderr",
            LogOutput::File => "file",
            LogOutput::FileAndStderr => "file+stderr",
            LogOutput::Both => "both",
        };
        f.write_str(name)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// Default directive: trace, debug, info, warn, error, or off.
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Log file; the platform state directory is used when unset.
    pub file: Option<PathBuf>,
    /// ANSI colours for text logs written to a terminal stream.
    pub color: bool,
    /// Per-module levels, e.g. `deckgen::provider = "debug"`.
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Text,
            output: LogOutput::File,
            file: None,
            color: true,
            modules: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Apply command-line flags. `verbose` means debug on stderr unless an
    /// output was given explicitly.
    pub fn with_overrides(
        mut self,
        level: Option<String>,
        format: Option<String>,
        output: Option<String>,
        file: Option<PathBuf>,
        verbose: bool,
    ) -> Result<Self, ApiError> {
        if verbose {
            self.level = "debug".to_string();
            self.output = LogOutput::Stderr;
        }
        if let Some(level) = level {
            self.level = level;
        }
        if let Some(format) = format {
            self.format = format.parse()?;
        }
        if let Some(output) = output {
            self.output = output.parse()?;
        }
        if file.is_some() {
            self.file = file;
        }
        Ok(self)
    }

    /// Overlay `DECKGEN_LOG_FORMAT` and `DECKGEN_LOG_OUTPUT`.
    fn with_env(mut self) -> Result<Self, ApiError> {
        if let Some(format) = non_empty_env(LOG_FORMAT_ENV) {
            self.format = format.parse()?;
        }
        if let Some(output) = non_empty_env(LOG_OUTPUT_ENV) {
            self.output = output.parse()?;
        }
        Ok(self)
    }

    fn env_filter(&self) -> Result<EnvFilter, ApiError> {
        if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
            return Ok(filter);
        }
        if self.level == "off" {
            return Ok(EnvFilter::new("off"));
        }

        let mut directives: Vec<String> = self
            .modules
            .iter()
            .map(|(module, level)| format!("{}={}", module, level))
            .collect();
        if let Some(spec) = non_empty_env(LOG_MODULES_ENV) {
            directives.extend(
                spec.split(',')
                    .filter_map(|d| d.split_once('='))
                    .map(|(module, level)| format!("{}={}", module.trim(), level.trim())),
            );
        }

        let mut filter = EnvFilter::new(&self.level);
        for directive in directives {
            let parsed = directive.parse().map_err(|e| {
                ApiError::ConfigError(format!("Invalid log directive {}: {}", directive, e))
            })?;
            filter = filter.add_directive(parsed);
        }
        Ok(filter)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Log file location: `cli_file`, then `DECKGEN_LOG_FILE`, then `config_file`,
/// then `<state dir>/<workspace path>/deckgen.log`.
pub fn resolve_log_file_path(
    cli_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    workspace: Option<&Path>,
) -> Result<PathBuf, ApiError> {
    let explicit = cli_file
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| non_empty_env(LOG_FILE_ENV).map(PathBuf::from))
        .or_else(|| config_file.filter(|p| !p.as_os_str().is_empty()));
    match explicit {
        Some(path) => Ok(path),
        None => default_log_file_path(workspace),
    }
}

fn default_log_file_path(workspace: Option<&Path>) -> Result<PathBuf, ApiError> {
    let dirs = directories::ProjectDirs::from("", "deckgen", "deckgen")
        .ok_or_else(|| ApiError::ConfigError("No home directory for the log file".to_string()))?;
    let state_dir = dirs.state_dir().ok_or_else(|| {
        ApiError::ConfigError("Platform has no state directory for the log file".to_string())
    })?;

    let mut dir = state_dir.to_path_buf();
    if let Some(ws) = workspace {
        let canonical = ws.canonicalize().map_err(|e| {
            ApiError::ConfigError(format!("Cannot resolve workspace {}: {}", ws.display(), e))
        })?;
        dir.extend(canonical.components().filter_map(|c| match c {
            Component::Normal(name) => Some(name),
            _ => None,
        }));
    }
    Ok(dir.join(LOG_FILE_NAME))
}

fn open_log_file(path: &Path) -> Result<Arc<std::fs::File>, ApiError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ApiError::ConfigError(format!("Cannot create log directory {}: {}", parent.display(), e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(Arc::new)
        .map_err(|e| ApiError::ConfigError(format!("Cannot open log file {}: {}", path.display(), e)))
}

fn make_writer(
    config: &LoggingConfig,
    workspace: Option<&Path>,
) -> Result<BoxMakeWriter, ApiError> {
    let writer = match config.output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::Both => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        LogOutput::File | LogOutput::FileAndStderr => {
            let path = resolve_log_file_path(None, config.file.clone(), workspace)?;
            let file = open_log_file(&path)?;
            if config.output == LogOutput::FileAndStderr {
                BoxMakeWriter::new(file.and(std::io::stderr))
            } else {
                BoxMakeWriter::new(file)
            }
        }
    };
    Ok(writer)
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: Option<&LoggingConfig>, workspace: Option<&Path>) -> Result<(), ApiError> {
    let config = config.cloned().unwrap_or_default().with_env()?;
    let installed = if !config.enabled {
        tracing_subscriber::registry()
            .with(EnvFilter::new("off"))
            .try_init()
    } else {
        let filter = config.env_filter()?;
        let writer = make_writer(&config, workspace)?;
        let layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(writer);
        match config.format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .try_init(),
            LogFormat::Text => tracing_subscriber::registry()
                .with(filter)
                .with(layer.with_ansi(config.color && !config.output.uses_file()))
                .try_init(),
        }
    };
    installed.map_err(|e| ApiError::ConfigError(format!("Failed to install logger: {}", e)))
}
