//! Startup resolution of the transcoder and prober executables.

use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::ResolveError;
use super::platform::Platform;
use super::resources::ResourceBundle;
use super::types::{BinaryKind, BinaryOrigin, ExecutableBinary, ResolvedBinaries};
use crate::process::{ProcessRunner, SystemProcessRunner};

/// Finds or provisions the engine executables for the current platform.
///
/// Strategies, first success wins:
///
/// 1. a file already present in the extraction directory,
/// 2. a system installation, detected by its version banner and located with
///    the platform lookup tool,
/// 3. a bundled resource copied into the extraction directory.
pub struct BinaryResolver<R = SystemProcessRunner> {
    extract_dir: PathBuf,
    platform: Platform,
    runner: R,
    resources: Arc<dyn ResourceBundle>,
    search_path: Option<OsString>,
}

impl BinaryResolver<SystemProcessRunner> {
    /// Creates a resolver for the current platform.
    pub fn new(extract_dir: impl Into<PathBuf>, resources: Arc<dyn ResourceBundle>) -> Self {
        Self::with_runner(extract_dir, resources, SystemProcessRunner)
    }
}

impl<R: ProcessRunner> BinaryResolver<R> {
    /// Creates a resolver that launches processes through `runner`.
    pub fn with_runner(
        extract_dir: impl Into<PathBuf>,
        resources: Arc<dyn ResourceBundle>,
        runner: R,
    ) -> Self {
        let extract_dir = extract_dir.into();
        let extract_dir = std::path::absolute(&extract_dir).unwrap_or(extract_dir);
        Self {
            extract_dir,
            platform: Platform::current(),
            runner,
            resources,
            search_path: None,
        }
    }

    /// Overrides the platform used for naming and lookup.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Overrides the `PATH`-style list searched when the lookup tool gives
    /// no usable answer. Defaults to the process `PATH`.
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn extract_dir(&self) -> &Path {
        &self.extract_dir
    }

    /// Creates the extraction directory if it does not exist yet.
    pub fn prepare(&self) -> Result<(), ResolveError> {
        std::fs::create_dir_all(&self.extract_dir).map_err(|e| ResolveError::ExtractDirFailed {
            path: self.extract_dir.clone(),
            source: e,
        })
    }

    /// Resolves both executables.
    pub fn resolve_all(&self) -> Result<ResolvedBinaries, ResolveError> {
        Ok(ResolvedBinaries {
            transcoder: self.resolve(BinaryKind::Transcoder)?,
            prober: self.resolve(BinaryKind::Prober)?,
        })
    }

    /// Resolves one executable.
    ///
    /// Fails with [`ResolveError::BinaryNotFound`] only when every strategy
    /// is exhausted.
    pub fn resolve(&self, kind: BinaryKind) -> Result<ExecutableBinary, ResolveError> {
        self.prepare()?;
        let candidates = self.platform.candidates(kind);

        let binary = if let Some(path) = self.find_pre_extracted(&candidates) {
            ExecutableBinary::new(kind, path, BinaryOrigin::PreExtracted)
        } else if let Some(path) = self.find_installed(kind) {
            ExecutableBinary::new(kind, path, BinaryOrigin::SystemInstalled)
        } else {
            let path = self.extract_bundled(kind, &candidates)?;
            ExecutableBinary::new(kind, path, BinaryOrigin::BundledExtracted)
        };

        if !is_executable(binary.path()) {
            return Err(ResolveError::NotExecutable {
                kind,
                path: binary.path().to_path_buf(),
            });
        }

        info!(
            "Resolved {} at {} ({:?})",
            kind,
            binary.path().display(),
            binary.origin()
        );
        Ok(binary)
    }

    fn find_pre_extracted(&self, candidates: &[String]) -> Option<PathBuf> {
        for name in candidates {
            let path = self.extract_dir.join(name);
            if !path.exists() {
                continue;
            }
            if is_executable(&path) {
                return Some(path);
            }
            warn!(
                "Ignoring pre-extracted {} because it is not executable",
                path.display()
            );
        }
        None
    }

    /// Detects a system installation by its version banner.
    ///
    /// Launch failures mean "not installed", never an error.
    fn find_installed(&self, kind: BinaryKind) -> Option<PathBuf> {
        let program = kind.program_name();
        let output = match self.runner.run(OsStr::new(program), &[]) {
            Ok(output) => output,
            Err(e) => {
                debug!("{} is not installed: {}", program, e);
                return None;
            }
        };

        // ffmpeg prints its banner on stderr, so accept either stream.
        let banner = format!("{} version", program);
        if !output.stdout_text().starts_with(&banner) && !output.stderr_text().starts_with(&banner)
        {
            debug!("{} did not report a version banner", program);
            return None;
        }

        self.locate_installed(program)
    }

    fn locate_installed(&self, program: &str) -> Option<PathBuf> {
        let tool = self.platform.lookup_tool();
        match self.runner.run(OsStr::new(tool), &[program]) {
            Ok(output) => {
                if let Some(line) = output.first_stdout_line() {
                    let path = PathBuf::from(line);
                    if path.is_absolute() && path.is_file() {
                        return Some(path);
                    }
                    debug!("{} {} answered unusable path {}", tool, program, path.display());
                }
            }
            Err(e) => debug!("Lookup tool {} unavailable: {}", tool, e),
        }

        let found = match &self.search_path {
            Some(paths) => which::which_in(program, Some(paths), &self.extract_dir),
            None => which::which(program),
        };
        match found {
            Ok(path) => {
                debug!("Found {} at {} by searching PATH", program, path.display());
                Some(path)
            }
            Err(e) => {
                debug!("{} not found on PATH: {}", program, e);
                None
            }
        }
    }

    fn extract_bundled(&self, kind: BinaryKind, candidates: &[String]) -> Result<PathBuf, ResolveError> {
        let Some(name) = candidates.iter().find(|name| self.resources.contains(name)) else {
            return Err(ResolveError::not_found(kind, candidates));
        };

        let destination = self.extract_dir.join(name);
        let extraction_failed = |source: std::io::Error| ResolveError::ExtractionFailed {
            name: name.clone(),
            path: destination.clone(),
            source,
        };

        let bytes = self
            .resources
            .read(name)
            .map_err(extraction_failed)?
            .ok_or_else(|| ResolveError::not_found(kind, candidates))?;

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(extraction_failed)?;
        }

        // Write beside the destination and rename, so an interrupted
        // extraction never looks like a pre-extracted binary.
        let partial = self
            .extract_dir
            .join(format!(".{}.{}.part", name, uuid::Uuid::new_v4()));
        let written = write_executable(&partial, &bytes)
            .and_then(|()| std::fs::rename(&partial, &destination));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&partial);
            return Err(extraction_failed(e));
        }

        info!("Extracted bundled {} to {}", name, destination.display());
        Ok(destination)
    }
}

fn write_executable(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}

/// Whether `path` is a regular file the current platform can execute.
pub(crate) fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binaries::resources::{EmbeddedResources, NoResources};
    use crate::process::ProcessOutput;
    use crate::testing::MockProcessRunner;
    use tempfile::TempDir;

    fn resolver(
        extract_dir: &Path,
        resources: impl ResourceBundle + 'static,
        runner: MockProcessRunner,
    ) -> BinaryResolver<MockProcessRunner> {
        BinaryResolver::with_runner(extract_dir, Arc::new(resources), runner)
            .with_platform(Platform::Linux)
    }

    fn installed_binary(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        write_executable(&path, b"#!/bin/sh\n").unwrap();
        path
    }

    #[test]
    fn test_creates_extraction_directory() {
        let temp = TempDir::new().unwrap();
        let extract_dir = temp.path().join("nested").join("binaries");
        let resolver = resolver(&extract_dir, NoResources, MockProcessRunner::new());

        resolver.prepare().unwrap();
        resolver.prepare().unwrap();
        assert!(extract_dir.is_dir());
    }

    #[test]
    fn test_pre_extracted_wins_without_probing_system() {
        let temp = TempDir::new().unwrap();
        let existing = installed_binary(temp.path(), "ffmpeg");
        let runner = MockProcessRunner::new();
        let resolver = resolver(temp.path(), NoResources, runner.clone());

        let binary = resolver.resolve(BinaryKind::Transcoder).unwrap();
        assert_eq!(binary.path(), existing);
        assert_eq!(binary.origin(), BinaryOrigin::PreExtracted);
        assert!(runner.calls().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_pre_extracted_is_replaced_by_bundle() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("ffprobe"), b"stale").unwrap();
        let resources = EmbeddedResources::new().with("ffprobe", b"fresh");
        let resolver = resolver(temp.path(), resources, MockProcessRunner::new());

        let binary = resolver.resolve(BinaryKind::Prober).unwrap();
        assert_eq!(binary.origin(), BinaryOrigin::BundledExtracted);
        assert_eq!(std::fs::read(binary.path()).unwrap(), b"fresh");
    }

    #[test]
    fn test_system_installed_located_with_lookup_tool() {
        let temp = TempDir::new().unwrap();
        let extract_dir = temp.path().join("extract");
        let bin_dir = temp.path().join("bin");
        std::fs::create_dir_all(&bin_dir).unwrap();
        let installed = installed_binary(&bin_dir, "ffprobe");

        let runner = MockProcessRunner::new();
        runner.respond(
            "ffprobe",
            ProcessOutput::with_stdout("ffprobe version 6.1 Copyright (c) 2007-2023", 1),
        );
        runner.respond(
            "which",
            ProcessOutput::with_stdout(format!("{}\n", installed.display()), 0),
        );
        let resolver = resolver(&extract_dir, NoResources, runner.clone());

        let binary = resolver.resolve(BinaryKind::Prober).unwrap();
        assert_eq!(binary.path(), installed);
        assert_eq!(binary.origin(), BinaryOrigin::SystemInstalled);
        assert_eq!(
            runner.calls(),
            vec![
                ("ffprobe".to_string(), vec![]),
                ("which".to_string(), vec!["ffprobe".to_string()]),
            ]
        );
    }

    #[test]
    fn test_search_path_used_when_lookup_tool_missing() {
        let temp = TempDir::new().unwrap();
        let extract_dir = temp.path().join("extract");
        let bin_dir = temp.path().join("bin");
        std::fs::create_dir_all(&bin_dir).unwrap();
        let installed = installed_binary(&bin_dir, "ffmpeg");

        let runner = MockProcessRunner::new();
        runner.respond(
            "ffmpeg",
            ProcessOutput::with_stderr("ffmpeg version 6.1 Copyright (c) 2000-2023", 1),
        );
        let resolver =
            resolver(&extract_dir, NoResources, runner.clone()).with_search_path(&bin_dir);

        let binary = resolver.resolve(BinaryKind::Transcoder).unwrap();
        assert_eq!(binary.path(), installed);
        assert_eq!(binary.origin(), BinaryOrigin::SystemInstalled);
        // The lookup tool was tried and could not be launched.
        assert_eq!(runner.calls()[1].0, "which");
    }

    #[test]
    fn test_search_path_used_when_lookup_answer_is_not_a_file() {
        let temp = TempDir::new().unwrap();
        let extract_dir = temp.path().join("extract");
        let bin_dir = temp.path().join("bin");
        std::fs::create_dir_all(&bin_dir).unwrap();
        let installed = installed_binary(&bin_dir, "ffprobe");

        let runner = MockProcessRunner::new();
        runner.respond(
            "ffprobe",
            ProcessOutput::with_stdout("ffprobe version 6.1 Copyright (c) 2007-2023", 1),
        );
        runner.respond(
            "which",
            ProcessOutput::with_stdout(format!("{}\n", temp.path().join("gone").display()), 0),
        );
        let resolver = resolver(&extract_dir, NoResources, runner).with_search_path(&bin_dir);

        let binary = resolver.resolve(BinaryKind::Prober).unwrap();
        assert_eq!(binary.path(), installed);
    }

    #[test]
    fn test_empty_search_path_falls_through_to_bundle() {
        let temp = TempDir::new().unwrap();
        let extract_dir = temp.path().join("extract");
        let empty_dir = temp.path().join("empty");
        std::fs::create_dir_all(&empty_dir).unwrap();

        let runner = MockProcessRunner::new();
        runner.respond("ffmpeg", ProcessOutput::with_stdout("ffmpeg version 6.1", 1));
        let resources = EmbeddedResources::new().with("ffmpeg", b"bundled");
        let resolver = resolver(&extract_dir, resources, runner).with_search_path(&empty_dir);

        let binary = resolver.resolve(BinaryKind::Transcoder).unwrap();
        assert_eq!(binary.origin(), BinaryOrigin::BundledExtracted);
    }

    #[test]
    fn test_system_installed_resolution_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let extract_dir = temp.path().join("extract");
        let bin_dir = temp.path().join("bin");
        std::fs::create_dir_all(&bin_dir).unwrap();
        let installed = installed_binary(&bin_dir, "ffmpeg");

        let runner = MockProcessRunner::new();
        runner.respond("ffmpeg", ProcessOutput::with_stdout("ffmpeg version 6.1", 1));
        runner.respond(
            "which",
            ProcessOutput::with_stdout(installed.display().to_string(), 0),
        );
        let resolver = resolver(&extract_dir, NoResources, runner);

        let first = resolver.resolve(BinaryKind::Transcoder).unwrap();
        let second = resolver.resolve(BinaryKind::Transcoder).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.origin(), BinaryOrigin::SystemInstalled);
        // Nothing was extracted, so the next run still finds the system copy.
        assert_eq!(std::fs::read_dir(&extract_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_banner_on_stderr_counts_as_installed() {
        let temp = TempDir::new().unwrap();
        let extract_dir = temp.path().join("extract");
        let installed = installed_binary(temp.path(), "ffmpeg");

        let runner = MockProcessRunner::new();
        runner.respond(
            "ffmpeg",
            ProcessOutput::with_stderr("ffmpeg version n6.1 Copyright (c) 2000-2023", 1),
        );
        runner.respond(
            "which",
            ProcessOutput::with_stdout(installed.display().to_string(), 0),
        );
        let resolver = resolver(&extract_dir, NoResources, runner);

        let binary = resolver.resolve(BinaryKind::Transcoder).unwrap();
        assert_eq!(binary.origin(), BinaryOrigin::SystemInstalled);
    }

    #[test]
    fn test_wrong_banner_falls_through_to_bundle() {
        let temp = TempDir::new().unwrap();
        let runner = MockProcessRunner::new();
        runner.respond("ffmpeg", ProcessOutput::with_stdout("something else entirely", 0));
        let resources = EmbeddedResources::new().with("ffmpeg", b"bundled");
        let resolver = resolver(temp.path(), resources, runner.clone());

        let binary = resolver.resolve(BinaryKind::Transcoder).unwrap();
        assert_eq!(binary.origin(), BinaryOrigin::BundledExtracted);
        // The lookup tool is never consulted without a banner.
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_bundled_extraction_copies_bytes_verbatim() {
        let temp = TempDir::new().unwrap();
        let extract_dir = temp.path().join("extract");
        let payload: &'static [u8] = b"\x7fELF\x02\x01\x01\x00payload";
        let resources = EmbeddedResources::new().with("ffmpeg", payload);
        let resolver = resolver(&extract_dir, resources, MockProcessRunner::new());

        let binary = resolver.resolve(BinaryKind::Transcoder).unwrap();
        assert_eq!(binary.path(), extract_dir.join("ffmpeg"));
        assert_eq!(binary.origin(), BinaryOrigin::BundledExtracted);
        assert_eq!(std::fs::read(binary.path()).unwrap(), payload);
        assert!(is_executable(binary.path()));

        // No partial files are left behind.
        let leftovers: Vec<_> = std::fs::read_dir(&extract_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("ffmpeg")]);
    }

    #[test]
    fn test_resolution_is_idempotent_across_strategies() {
        let temp = TempDir::new().unwrap();
        let resources = EmbeddedResources::new().with("ffprobe", b"bundled");
        let resolver = resolver(temp.path(), resources, MockProcessRunner::new());

        let first = resolver.resolve(BinaryKind::Prober).unwrap();
        let second = resolver.resolve(BinaryKind::Prober).unwrap();
        assert_eq!(first.path(), second.path());
        assert_eq!(first.origin(), BinaryOrigin::BundledExtracted);
        assert_eq!(second.origin(), BinaryOrigin::PreExtracted);
    }

    #[test]
    fn test_not_found_when_every_strategy_exhausted() {
        let temp = TempDir::new().unwrap();
        let resources = EmbeddedResources::new().with("ffmpeg.exe", b"wrong platform");
        let resolver = resolver(temp.path(), resources, MockProcessRunner::new());

        let err = resolver.resolve(BinaryKind::Transcoder).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::BinaryNotFound {
                kind: BinaryKind::Transcoder,
                ..
            }
        ));
    }

    #[test]
    fn test_resolve_all_reports_failing_kind() {
        let temp = TempDir::new().unwrap();
        let resources = EmbeddedResources::new().with("ffmpeg", b"bundled");
        let resolver = resolver(temp.path(), resources, MockProcessRunner::new());

        let err = resolver.resolve_all().unwrap_err();
        assert_eq!(err.kind(), Some(BinaryKind::Prober));
    }

    #[test]
    fn test_windows_uses_where_and_exe_names() {
        let temp = TempDir::new().unwrap();
        let resources = EmbeddedResources::new().with("ffmpeg.exe", b"bundled");
        let runner = MockProcessRunner::new();
        let resolver = BinaryResolver::with_runner(temp.path(), Arc::new(resources), runner)
            .with_platform(Platform::Windows);

        let binary = resolver.resolve(BinaryKind::Transcoder).unwrap();
        assert_eq!(binary.path(), temp.path().join("ffmpeg.exe"));
    }
}
