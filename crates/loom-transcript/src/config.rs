use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use loom_stream::{MarkerError, MarkerPair, MarkerSet};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::options::TranscriptOptions;

pub const DEFAULT_CONFIG_FILE: &str = "loom.toml";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum LoomConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid marker pair {open:?}/{close:?}: {source}")]
    Marker {
        open: String,
        close: String,
        #[source]
        source: MarkerError,
    },

    #[error("invalid log level {level:?}: {reason}")]
    LogLevel { level: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoomConfig {
    pub transcript: TranscriptSection,
    pub markers: Vec<MarkerEntry>,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TranscriptSection {
    pub show_thinking: bool,
    pub show_url_statuses: bool,
}

impl Default for TranscriptSection {
    fn default() -> Self {
        Self {
            show_thinking: true,
            show_url_statuses: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarkerEntry {
    pub open: String,
    pub close: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub stdout: bool,
    /// Log file; no file layer when absent.
    pub path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            stdout: false,
            path: None,
        }
    }
}

impl LoomConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, LoomConfigError> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, LoomConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found; using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(LoomConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Loads `loom.toml` from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self, LoomConfigError> {
        Self::load(&dir.join(DEFAULT_CONFIG_FILE))
    }

    pub fn validate(&self) -> Result<(), LoomConfigError> {
        self.marker_set()?;
        EnvFilter::try_new(&self.log.level).map_err(|error| LoomConfigError::LogLevel {
            level: self.log.level.clone(),
            reason: error.to_string(),
        })?;
        Ok(())
    }

    /// Configured marker pairs, or the built-in set when none are listed.
    pub fn marker_set(&self) -> Result<MarkerSet, LoomConfigError> {
        let pairs = self
            .markers
            .iter()
            .map(|entry| {
                MarkerPair::new(entry.open.as_str(), entry.close.as_str()).map_err(|source| {
                    LoomConfigError::Marker {
                        open: entry.open.clone(),
                        close: entry.close.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MarkerSet::new(pairs))
    }

    pub fn transcript_options(&self) -> Result<TranscriptOptions, LoomConfigError> {
        Ok(TranscriptOptions {
            show_thinking: self.transcript.show_thinking,
            show_url_statuses: self.transcript.show_url_statuses,
            markers: self.marker_set()?,
        })
    }
}
