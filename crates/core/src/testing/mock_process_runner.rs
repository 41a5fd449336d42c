//! Mock process runner for testing.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::io;
use std::sync::{Arc, Mutex};

use crate::process::{ProcessOutput, ProcessRunner};

/// Mock implementation of the ProcessRunner trait.
///
/// Provides controllable behavior for testing:
/// - Canned output per program
/// - Programs without a response fail to launch with `NotFound`
/// - Every invocation is recorded
///
/// Clones share state, so a test can keep one clone for assertions while the
/// resolver owns another.
///
/// # Example
///
/// ```rust,ignore
/// use mediabridge_core::process::ProcessOutput;
/// use mediabridge_core::testing::MockProcessRunner;
///
/// let runner = MockProcessRunner::new();
/// runner.respond("ffmpeg", ProcessOutput::with_stderr("ffmpeg version 6.1", 1));
///
/// // Resolve with a clone...
///
/// assert_eq!(runner.calls()[0].0, "ffmpeg");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockProcessRunner {
    /// Canned responses keyed by program.
    responses: Arc<Mutex<HashMap<String, ProcessOutput>>>,
    /// Recorded (program, args) pairs.
    calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl MockProcessRunner {
    /// Create a new mock runner with no programs installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `program` launchable, returning `output` on every run.
    pub fn respond(&self, program: &str, output: ProcessOutput) {
        self.responses
            .lock()
            .unwrap()
            .insert(program.to_string(), output);
    }

    /// Get all recorded invocations.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for MockProcessRunner {
    fn run(&self, program: &OsStr, args: &[&str]) -> io::Result<ProcessOutput> {
        let program = program.to_string_lossy().into_owned();
        self.calls.lock().unwrap().push((
            program.clone(),
            args.iter().map(|a| a.to_string()).collect(),
        ));

        self.responses
            .lock()
            .unwrap()
            .get(&program)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{}: not found", program)))
    }
}
