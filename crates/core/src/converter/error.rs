//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

use super::types::JobState;

/// Errors that can occur while probing or transcoding.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// The input is not in the declared format.
    ///
    /// Expected during format detection; not a system failure.
    #[error("Input is not {format}")]
    NoMatch { format: String },

    /// An engine executable could not be launched.
    #[error("Failed to launch {}", .program.display())]
    ProcessLaunch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine reported a failed job.
    #[error("Transcode failed: {reason}")]
    TranscodeFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// The job did not finish within the configured limit.
    #[error("Transcode timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// A result was requested before the job reached a terminal state.
    #[error("Transcode job has not finished (state: {state:?})")]
    JobNotFinished { state: JobState },

    /// Copying the input into a staged file failed.
    #[error("Failed to stage input at {}", .path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while delivering output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Creates a new no match error.
    pub fn no_match(format: impl Into<String>) -> Self {
        Self::NoMatch {
            format: format.into(),
        }
    }

    /// Creates a new transcode failed error with stderr output.
    pub fn transcode_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::TranscodeFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Whether this is the expected "not this format" outcome.
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatch { .. })
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_) | Self::Staging { .. })
    }
}
