//! Types for the binaries module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which engine executable is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryKind {
    /// Converts media between containers/codecs (ffmpeg).
    Transcoder,
    /// Inspects a file and reports its container format (ffprobe).
    Prober,
}

impl BinaryKind {
    /// Program name without any platform suffix.
    pub fn program_name(&self) -> &'static str {
        match self {
            Self::Transcoder => "ffmpeg",
            Self::Prober => "ffprobe",
        }
    }
}

impl fmt::Display for BinaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transcoder => f.write_str("transcoder"),
            Self::Prober => f.write_str("prober"),
        }
    }
}

/// Strategy that produced a resolved executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOrigin {
    /// Found in the extraction directory from an earlier run.
    PreExtracted,
    /// Installed on the system and found through the path lookup tool.
    SystemInstalled,
    /// Copied out of the bundled resources during this run.
    BundledExtracted,
}

/// A validated, absolute path to an engine executable.
///
/// Immutable once resolved; consumers borrow the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableBinary {
    kind: BinaryKind,
    path: PathBuf,
    origin: BinaryOrigin,
}

impl ExecutableBinary {
    pub(crate) fn new(kind: BinaryKind, path: PathBuf, origin: BinaryOrigin) -> Self {
        Self { kind, path, origin }
    }

    pub fn kind(&self) -> BinaryKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn origin(&self) -> BinaryOrigin {
        self.origin
    }
}

/// The transcoder/prober pair resolved at startup.
#[derive(Debug, Clone)]
pub struct ResolvedBinaries {
    pub transcoder: ExecutableBinary,
    pub prober: ExecutableBinary,
}

impl ResolvedBinaries {
    /// Builds a pair from paths that are already known to be usable.
    ///
    /// Intended for hosts that ship their own engine location and for tests.
    pub fn from_paths(transcoder: impl Into<PathBuf>, prober: impl Into<PathBuf>) -> Self {
        Self {
            transcoder: ExecutableBinary::new(
                BinaryKind::Transcoder,
                transcoder.into(),
                BinaryOrigin::SystemInstalled,
            ),
            prober: ExecutableBinary::new(
                BinaryKind::Prober,
                prober.into(),
                BinaryOrigin::SystemInstalled,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_names() {
        assert_eq!(BinaryKind::Transcoder.program_name(), "ffmpeg");
        assert_eq!(BinaryKind::Prober.program_name(), "ffprobe");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(BinaryKind::Transcoder.to_string(), "transcoder");
        assert_eq!(BinaryKind::Prober.to_string(), "prober");
    }
}
