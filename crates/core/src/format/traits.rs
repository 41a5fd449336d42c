//! Handler contracts the host pipeline calls into.

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::converter::{ConverterError, MediaInput, StagedFile};

/// Result of asking a format to write data.
#[derive(Debug)]
#[must_use]
pub enum WriteOutcome {
    /// The full output was delivered to the destination.
    Success,
    /// The value is not something this format can write.
    WrongFormat,
    /// Writing was attempted and failed; nothing usable was delivered.
    Fail(ConverterError),
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_wrong_format(&self) -> bool {
        matches!(self, Self::WrongFormat)
    }

    /// The failure, if writing failed.
    pub fn error(&self) -> Option<&ConverterError> {
        match self {
            Self::Fail(e) => Some(e),
            _ => None,
        }
    }
}

/// A format that can recognise its own data.
#[async_trait]
pub trait ReadableFormat: Send + Sync {
    /// Format name this handler is registered under.
    fn name(&self) -> &str;

    /// Stages `source` and checks whether it is in this format.
    ///
    /// On a match the caller owns the returned staged copy. A mismatch is
    /// reported as [`ConverterError::NoMatch`].
    async fn read(&self, source: MediaInput) -> Result<StagedFile, ConverterError>;
}

/// A format that can produce its own data from other media.
#[async_trait]
pub trait WritableFormat: Send + Sync {
    /// Format name this handler is registered under.
    fn name(&self) -> &str;

    /// Whether `value` is something this format can write. Does no work.
    fn can_produce(&self, value: &MediaInput) -> bool;

    /// Converts `data` into this format and streams it into `destination`.
    async fn write(
        &self,
        data: MediaInput,
        destination: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> WriteOutcome;
}
