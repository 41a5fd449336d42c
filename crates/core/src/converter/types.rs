//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Engine log level passed with `-v`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    #[default]
    Quiet,
    Panic,
    Fatal,
    Error,
    Warning,
    Info,
    Verbose,
    Debug,
    Trace,
}

impl Verbosity {
    /// Returns the engine argument for this level.
    pub fn as_arg(&self) -> &'static str {
        match self {
            Self::Quiet => "quiet",
            Self::Panic => "panic",
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Verbose => "verbose",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Container format detected by the prober.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Short demuxer name, possibly a comma-separated list ("mov,mp4,m4a").
    pub format_name: String,
    /// Human readable format name.
    pub format_long_name: String,
    /// Whether the prober could not classify the file.
    pub has_error: bool,
    /// Error text reported by the prober, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ProbeReport {
    /// Creates an error report.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            has_error: true,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Whether this report identifies `candidate` (case-insensitive).
    ///
    /// Error reports never match.
    pub fn matches(&self, candidate: &str) -> bool {
        if self.has_error || candidate.is_empty() {
            return false;
        }

        self.format_long_name.eq_ignore_ascii_case(candidate)
            || self.format_name.eq_ignore_ascii_case(candidate)
            || self
                .format_name
                .split(',')
                .any(|name| name.trim().eq_ignore_ascii_case(candidate))
    }
}

/// Parameters of one transcode job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeSpec {
    /// Absolute path of the input file.
    pub input_path: PathBuf,
    /// Absolute path the engine writes to.
    pub output_path: PathBuf,
    /// Target container identifier ("wav", "ogg", "mp3").
    pub target_format: String,
    pub verbosity: Verbosity,
}

impl TranscodeSpec {
    /// Creates a spec with quiet verbosity.
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        target_format: impl Into<String>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            target_format: target_format.into(),
            verbosity: Verbosity::default(),
        }
    }

    /// Sets the engine verbosity.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
}

/// Lifecycle of a transcode job. Transitions never go backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    /// Whether no further transition can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a forward transition.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running)
                | (Self::Queued, Self::Failed)
                | (Self::Running, Self::Succeeded)
                | (Self::Running, Self::Failed)
        )
    }
}
