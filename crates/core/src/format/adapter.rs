//! Format adapters backed by the external engine.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::traits::{ReadableFormat, WritableFormat, WriteOutcome};
use crate::binaries::{is_executable, ResolveError, ResolvedBinaries};
use crate::config::TranscodeConfig;
use crate::converter::{
    ConverterError, FormatProber, MediaInput, StagedFile, TranscodeSpec, Transcoder, Verbosity,
};

/// Engine state shared by every adapter: resolved binaries, the prober, the
/// transcoder and staging settings. Read-only after construction.
#[derive(Debug)]
pub struct MediaEngine {
    binaries: ResolvedBinaries,
    prober: FormatProber,
    transcoder: Transcoder,
    temp_dir: PathBuf,
    verbosity: Verbosity,
    timeout: Option<Duration>,
}

impl MediaEngine {
    /// Creates an engine, checking that both executables are usable.
    pub fn new(binaries: ResolvedBinaries, settings: &TranscodeConfig) -> Result<Self, ResolveError> {
        for binary in [&binaries.transcoder, &binaries.prober] {
            if !is_executable(binary.path()) {
                return Err(ResolveError::NotExecutable {
                    kind: binary.kind(),
                    path: binary.path().to_path_buf(),
                });
            }
        }

        let temp_dir = std::path::absolute(&settings.temp_dir)
            .unwrap_or_else(|_| settings.temp_dir.clone());

        Ok(Self {
            prober: FormatProber::new(binaries.prober.path()),
            transcoder: Transcoder::new(binaries.transcoder.path()),
            binaries,
            temp_dir,
            verbosity: settings.verbosity,
            timeout: settings.timeout(),
        })
    }

    pub fn binaries(&self) -> &ResolvedBinaries {
        &self.binaries
    }

    pub fn prober(&self) -> &FormatProber {
        &self.prober
    }

    pub fn transcoder(&self) -> &Transcoder {
        &self.transcoder
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Reads and writes one declared format ("wav", "ogg", "mp3") through the engine.
#[derive(Debug, Clone)]
pub struct MediaFormatAdapter {
    format: String,
    engine: Arc<MediaEngine>,
    verbosity: Verbosity,
}

impl MediaFormatAdapter {
    pub fn new(format: impl Into<String>, engine: Arc<MediaEngine>) -> Self {
        let verbosity = engine.verbosity;
        Self {
            format: format.into(),
            engine,
            verbosity,
        }
    }

    /// Overrides the engine verbosity for jobs started by this adapter.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Transcodes `data` and copies the result into `destination`.
    ///
    /// Staged files are guards, so every early return cleans up.
    async fn transcode_into(
        &self,
        data: MediaInput,
        destination: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<(), ConverterError> {
        let temp_dir = self.engine.temp_dir();
        tokio::fs::create_dir_all(temp_dir)
            .await
            .map_err(|e| ConverterError::Staging {
                path: temp_dir.to_path_buf(),
                source: e,
            })?;

        let (input_path, _staged_input) = match data {
            MediaInput::File(path) => {
                let absolute = std::path::absolute(&path)
                    .map_err(|e| ConverterError::Staging { path, source: e })?;
                (absolute, None)
            }
            source => {
                let staged = StagedFile::stage(temp_dir, source).await?;
                (staged.path().to_path_buf(), Some(staged))
            }
        };

        let output = StagedFile::reserve(temp_dir, &self.format);
        let spec = TranscodeSpec::new(input_path, output.path(), &self.format)
            .with_verbosity(self.verbosity);

        let mut job = self.engine.transcoder().submit(spec)?;
        job.wait(self.engine.timeout()).await;
        let produced = job.result()?;

        let mut file = tokio::fs::File::open(produced).await?;
        tokio::io::copy(&mut file, &mut *destination).await?;
        destination.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ReadableFormat for MediaFormatAdapter {
    fn name(&self) -> &str {
        &self.format
    }

    async fn read(&self, source: MediaInput) -> Result<StagedFile, ConverterError> {
        if !source.is_media() {
            return Err(ConverterError::no_match(&self.format));
        }

        let staged = StagedFile::stage(self.engine.temp_dir(), source).await?;
        let report = self.engine.prober().classify(staged.path()).await?;
        if report.matches(&self.format) {
            debug!("{} matched as {}", staged.path().display(), self.format);
            Ok(staged)
        } else {
            debug!(
                "{} is not {} (probed {:?})",
                staged.path().display(),
                self.format,
                report.format_name
            );
            Err(ConverterError::no_match(&self.format))
        }
    }
}

#[async_trait]
impl WritableFormat for MediaFormatAdapter {
    fn name(&self) -> &str {
        &self.format
    }

    fn can_produce(&self, value: &MediaInput) -> bool {
        value.is_media()
    }

    async fn write(
        &self,
        data: MediaInput,
        destination: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> WriteOutcome {
        if !self.can_produce(&data) {
            debug!("{} cannot write a {} value", self.format, data.kind());
            return WriteOutcome::WrongFormat;
        }

        match self.transcode_into(data, destination).await {
            Ok(()) => WriteOutcome::Success,
            Err(e) => {
                warn!("Writing {} failed: {}", self.format, e);
                WriteOutcome::Fail(e)
            }
        }
    }
}
