//! Fixed-behaviour format handler for registry tests.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::converter::{ConverterError, MediaInput, StagedFile};
use crate::format::{ReadableFormat, WritableFormat, WriteOutcome};

/// A handler that never reads and always writes its label.
///
/// Stands in for a host's built-in handler so tests can tell which handler
/// a registry returns.
#[derive(Debug, Clone)]
pub struct StaticFormat {
    name: String,
    label: String,
}

impl StaticFormat {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

#[async_trait]
impl ReadableFormat for StaticFormat {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, _source: MediaInput) -> Result<StagedFile, ConverterError> {
        Err(ConverterError::no_match(&self.name))
    }
}

#[async_trait]
impl WritableFormat for StaticFormat {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_produce(&self, _value: &MediaInput) -> bool {
        true
    }

    async fn write(
        &self,
        _data: MediaInput,
        destination: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> WriteOutcome {
        match destination.write_all(self.label.as_bytes()).await {
            Ok(()) => WriteOutcome::Success,
            Err(e) => WriteOutcome::Fail(e.into()),
        }
    }
}
