//! Blocking subprocess execution used for version probing and path lookup.
//!
//! The runner never interprets exit codes. Probed programs may exit non-zero
//! even when they are installed correctly (ffmpeg without arguments does), so
//! callers decide what counts as success.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::process::{Command, Stdio};

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Bytes written to stdout.
    pub stdout: Vec<u8>,
    /// Bytes written to stderr.
    pub stderr: Vec<u8>,
    /// Exit code, `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    /// Creates an output with the given stdout and exit code.
    pub fn with_stdout(stdout: impl Into<Vec<u8>>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: Vec::new(),
            exit_code: Some(exit_code),
        }
    }

    /// Creates an output with the given stderr and exit code.
    pub fn with_stderr(stderr: impl Into<Vec<u8>>, exit_code: i32) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
        }
    }

    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// First non-empty stdout line, trimmed.
    pub fn first_stdout_line(&self) -> Option<String> {
        self.stdout_text()
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
    }
}

/// Runs a command to completion, blocking the calling thread.
pub trait ProcessRunner: Send + Sync {
    /// Launches `program` with `args` and waits for it to exit.
    ///
    /// Returns an error only when the process could not be launched or its
    /// output could not be collected.
    fn run(&self, program: &OsStr, args: &[&str]) -> io::Result<ProcessOutput>;
}

/// [`ProcessRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &OsStr, args: &[&str]) -> io::Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        Ok(ProcessOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        })
    }
}
