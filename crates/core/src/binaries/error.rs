//! Error types for the binaries module.

use std::path::PathBuf;
use thiserror::Error;

use super::types::BinaryKind;

/// Errors that can occur while resolving engine executables.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Every strategy was exhausted without finding a usable executable.
    #[error("No {kind} executable found (candidates: {})", .candidates.join(", "))]
    BinaryNotFound {
        kind: BinaryKind,
        candidates: Vec<String>,
    },

    /// The extraction directory could not be created.
    #[error("Failed to create extraction directory: {}", .path.display())]
    ExtractDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A bundled resource could not be read or written out.
    #[error("Failed to extract bundled {name} to {}", .path.display())]
    ExtractionFailed {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The resolved path is not an executable regular file.
    #[error("{kind} at {} is not an executable file", .path.display())]
    NotExecutable { kind: BinaryKind, path: PathBuf },
}

impl ResolveError {
    /// Creates a binary not found error.
    pub fn not_found(kind: BinaryKind, candidates: &[String]) -> Self {
        Self::BinaryNotFound {
            kind,
            candidates: candidates.to_vec(),
        }
    }

    /// The binary kind this error is about, if any.
    pub fn kind(&self) -> Option<BinaryKind> {
        match self {
            Self::BinaryNotFound { kind, .. } | Self::NotExecutable { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_kind() {
        let err = ResolveError::not_found(BinaryKind::Prober, &["ffprobe".to_string()]);
        assert_eq!(err.to_string(), "No prober executable found (candidates: ffprobe)");
        assert_eq!(err.kind(), Some(BinaryKind::Prober));
    }
}
