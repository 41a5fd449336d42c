use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::converter::Verbosity;

/// Subfolder of the local data directory holding extracted binaries.
pub const EXTRACT_SUBDIR: &str = "media-binaries";

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub binaries: BinariesConfig,
    #[serde(default)]
    pub transcode: TranscodeConfig,
    /// Formats to register adapters for.
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            binaries: BinariesConfig::default(),
            transcode: TranscodeConfig::default(),
            formats: default_formats(),
        }
    }
}

/// Engine binary location
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BinariesConfig {
    /// Where bundled binaries are extracted to (default: local data dir).
    #[serde(default)]
    pub extract_dir: Option<PathBuf>,
    /// Directory serving as the bundled resource store.
    #[serde(default)]
    pub resource_dir: Option<PathBuf>,
}

impl BinariesConfig {
    /// The configured extraction directory, or the platform default.
    pub fn extract_dir(&self) -> PathBuf {
        self.extract_dir.clone().unwrap_or_else(default_extract_dir)
    }
}

fn default_extract_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "mediabridge")
        .map(|dirs| dirs.data_local_dir().join(EXTRACT_SUBDIR))
        .unwrap_or_else(|| std::env::temp_dir().join("mediabridge").join(EXTRACT_SUBDIR))
}

/// Transcode job settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscodeConfig {
    /// Directory for staged input and output files.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Engine log level.
    #[serde(default)]
    pub verbosity: Verbosity,
    /// Limit for a single job; unset waits indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            verbosity: Verbosity::default(),
            timeout_secs: None,
        }
    }
}

impl TranscodeConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("mediabridge")
}

fn default_formats() -> Vec<String> {
    vec!["wav".to_string(), "ogg".to_string(), "mp3".to_string()]
}
