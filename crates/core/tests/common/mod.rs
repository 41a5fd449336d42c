//! Shared harness for integration tests.
//!
//! The fake engine scripts are written once per test binary. Every harness
//! gets its own staging directory so leak checks do not interfere.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tempfile::TempDir;

use mediabridge_core::{
    config::{BinariesConfig, Config, TranscodeConfig},
    format::{MediaEngine, MediaFormatAdapter},
    testing::write_fake_tools,
    ResolvedBinaries,
};

struct FakeTools {
    dir: TempDir,
    binaries: ResolvedBinaries,
}

fn fake_tools() -> &'static FakeTools {
    static TOOLS: OnceLock<FakeTools> = OnceLock::new();
    TOOLS.get_or_init(|| {
        let dir = TempDir::new().expect("Failed to create tools dir");
        let binaries = write_fake_tools(dir.path()).expect("Failed to write fake tools");
        FakeTools { dir, binaries }
    })
}

pub struct TestHarness {
    pub engine: Arc<MediaEngine>,
    pub work_dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout_secs: Option<u64>) -> Self {
        let work_dir = TempDir::new().expect("Failed to create work dir");
        let settings = transcode_settings(work_dir.path(), timeout_secs);
        let engine = MediaEngine::new(fake_tools().binaries.clone(), &settings)
            .expect("Fake tools should be executable");

        Self {
            engine: Arc::new(engine),
            work_dir,
        }
    }

    pub fn adapter(&self, format: &str) -> MediaFormatAdapter {
        MediaFormatAdapter::new(format, Arc::clone(&self.engine))
    }

    pub fn binaries(&self) -> ResolvedBinaries {
        fake_tools().binaries.clone()
    }

    /// Config whose extraction directory already holds the fake tools.
    pub fn config(&self) -> Config {
        Config {
            binaries: BinariesConfig {
                extract_dir: Some(fake_tools().dir.path().to_path_buf()),
                resource_dir: None,
            },
            transcode: transcode_settings(self.work_dir.path(), None),
            ..Default::default()
        }
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.work_dir.path().join("staging")
    }

    pub fn write_input(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.work_dir.path().join(name);
        std::fs::write(&path, bytes).expect("Failed to write input");
        path
    }

    /// Number of files left in the staging directory.
    pub fn staged_count(&self) -> usize {
        std::fs::read_dir(self.staging_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

fn transcode_settings(work_dir: &Path, timeout_secs: Option<u64>) -> TranscodeConfig {
    TranscodeConfig {
        temp_dir: work_dir.join("staging"),
        timeout_secs,
        ..Default::default()
    }
}
