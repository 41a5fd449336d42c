//! Temp-file staging for engine input and output.

use std::any::Any;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::ConverterError;

/// A value handed to a format adapter by the host pipeline.
///
/// Files, byte buffers and streams can be staged for the engine. `Other`
/// carries any host value the adapters cannot work with.
pub enum MediaInput {
    File(PathBuf),
    Bytes(Vec<u8>),
    Stream(Box<dyn AsyncRead + Send + Unpin>),
    Other(Box<dyn Any + Send>),
}

impl MediaInput {
    /// Wraps an async reader.
    pub fn stream(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// Wraps an arbitrary host value.
    pub fn other(value: impl Any + Send) -> Self {
        Self::Other(Box::new(value))
    }

    /// Whether the value carries media bytes that can be staged.
    pub fn is_media(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Bytes(_) => "bytes",
            Self::Stream(_) => "stream",
            Self::Other(_) => "other",
        }
    }
}

impl fmt::Debug for MediaInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Other(_) => f.write_str("Other(..)"),
        }
    }
}

impl From<PathBuf> for MediaInput {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for MediaInput {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

impl From<Vec<u8>> for MediaInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// A uniquely named temp file, deleted when dropped.
///
/// Call [`StagedFile::into_path`] to take ownership of the file instead.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    armed: bool,
}

impl StagedFile {
    /// Reserves a unique path in `dir` without creating the file.
    ///
    /// Used for engine output: the guard removes whatever ends up there.
    pub fn reserve(dir: &Path, extension: &str) -> Self {
        let id = Uuid::new_v4();
        let name = if extension.is_empty() {
            format!("staged-{}", id)
        } else {
            format!("staged-{}.{}", id, extension)
        };
        Self {
            path: dir.join(name),
            armed: true,
        }
    }

    /// Copies `source` into a new temp file in `dir`.
    pub async fn stage(dir: &Path, source: MediaInput) -> Result<Self, ConverterError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ConverterError::Staging {
                path: dir.to_path_buf(),
                source: e,
            })?;

        // Created before writing so a partial copy is cleaned up too.
        let staged = Self::reserve(dir, "");
        let written = match source {
            MediaInput::File(path) => tokio::fs::copy(&path, &staged.path).await.map(|_| ()),
            MediaInput::Bytes(bytes) => tokio::fs::write(&staged.path, &bytes).await,
            MediaInput::Stream(mut reader) => copy_stream(&mut *reader, &staged.path).await,
            MediaInput::Other(_) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "value does not carry media bytes",
            )),
        };

        written.map_err(|e| ConverterError::Staging {
            path: staged.path.clone(),
            source: e,
        })?;

        debug!("Staged input at {}", staged.path.display());
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disarms cleanup and returns the path; the caller now owns the file.
    pub fn into_path(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed staged file {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove staged file {}: {}", self.path.display(), e),
        }
    }
}

async fn copy_stream(
    reader: &mut (dyn AsyncRead + Send + Unpin),
    destination: &Path,
) -> io::Result<()> {
    let mut file = tokio::fs::File::create(destination).await?;
    tokio::io::copy(reader, &mut file).await?;
    file.flush().await?;
    Ok(())
}
