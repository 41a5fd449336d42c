//! Transcode jobs driven through the ffmpeg executable.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::ConverterError;
use super::types::{JobState, TranscodeSpec};

/// Launches transcode jobs.
#[derive(Debug, Clone)]
pub struct Transcoder {
    ffmpeg_path: PathBuf,
}

impl Transcoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    /// Builds ffmpeg arguments for a job.
    pub fn build_args(spec: &TranscodeSpec) -> Vec<String> {
        vec![
            "-y".to_string(), // Overwrite the reserved output path
            "-v".to_string(),
            // Level tags on every stderr line; see `reported_errors`.
            format!("level+{}", spec.verbosity.as_arg()),
            "-i".to_string(),
            spec.input_path.to_string_lossy().to_string(),
            "-f".to_string(),
            spec.target_format.clone(),
            spec.output_path.to_string_lossy().to_string(),
        ]
    }

    /// Starts a job. Returns as soon as the process is spawned.
    ///
    /// The process is killed if the returned handle is dropped before the
    /// job finishes.
    pub fn submit(&self, spec: TranscodeSpec) -> Result<JobHandle, ConverterError> {
        let mut handle = JobHandle::queued(spec);
        let args = Self::build_args(&handle.spec);

        let mut child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ConverterError::ProcessLaunch {
                program: self.ffmpeg_path.clone(),
                source: e,
            })?;

        // Drain stderr concurrently so a chatty engine never blocks on the pipe.
        handle.stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf).await;
                String::from_utf8_lossy(&buf).into_owned()
            })
        });
        handle.child = Some(child);
        handle.transition(JobState::Running);

        debug!("Submitted transcode job {} with args {:?}", handle.id, args);
        Ok(handle)
    }
}

/// A running or finished transcode job.
#[derive(Debug)]
pub struct JobHandle {
    id: Uuid,
    spec: TranscodeSpec,
    state: JobState,
    started: Instant,
    child: Option<Child>,
    stderr_task: Option<JoinHandle<String>>,
    failure: Option<Failure>,
}

#[derive(Debug)]
enum Failure {
    Engine {
        reason: String,
        stderr: Option<String>,
    },
    TimedOut(Duration),
}

impl JobHandle {
    fn queued(spec: TranscodeSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            spec,
            state: JobState::Queued,
            started: Instant::now(),
            child: None,
            stderr_task: None,
            failure: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn spec(&self) -> &TranscodeSpec {
        &self.spec
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// OS process id of the engine while it is running.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Checks for completion without waiting.
    ///
    /// Intended to be called on an interval until a terminal state is seen.
    pub async fn poll(&mut self) -> JobState {
        if self.state.is_terminal() {
            return self.state;
        }
        let Some(child) = self.child.as_mut() else {
            return self.state;
        };

        match child.try_wait() {
            Ok(Some(status)) => self.finish(status).await,
            Ok(None) => {}
            Err(e) => self.fail(format!("Failed to query transcoder status: {}", e), None),
        }
        self.state
    }

    /// Waits for the job to reach a terminal state.
    ///
    /// With a timeout, an engine that has not exited in time is killed and
    /// the job fails.
    pub async fn wait(&mut self, timeout: Option<Duration>) -> JobState {
        if self.state.is_terminal() {
            return self.state;
        }
        let Some(child) = self.child.as_mut() else {
            return self.state;
        };

        let waited = match timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill timed out transcode job {}: {}", self.id, e);
                    }
                    self.child = None;
                    self.failure = Some(Failure::TimedOut(limit));
                    self.transition(JobState::Failed);
                    return self.state;
                }
            },
            None => child.wait().await,
        };

        match waited {
            Ok(status) => self.finish(status).await,
            Err(e) => self.fail(format!("Failed to wait for transcoder: {}", e), None),
        }
        self.state
    }

    /// The output file of a succeeded job.
    pub fn result(&self) -> Result<&Path, ConverterError> {
        match self.state {
            JobState::Succeeded => Ok(&self.spec.output_path),
            JobState::Failed => Err(match &self.failure {
                Some(Failure::TimedOut(limit)) => ConverterError::Timeout {
                    timeout_secs: limit.as_secs(),
                },
                Some(Failure::Engine { reason, stderr }) => {
                    ConverterError::transcode_failed(reason.clone(), stderr.clone())
                }
                None => ConverterError::transcode_failed("Transcode failed", None),
            }),
            state => Err(ConverterError::JobNotFinished { state }),
        }
    }

    /// Decides the terminal state once the process has exited.
    ///
    /// Success needs exit code 0, no error lines on stderr and an output file.
    async fn finish(&mut self, status: ExitStatus) {
        self.child = None;
        let stderr = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        let stderr = stderr.trim();

        let error_lines = reported_errors(stderr);

        if !status.success() {
            let reason = format!("ffmpeg exited with code: {:?}", status.code());
            self.fail(reason, (!stderr.is_empty()).then(|| stderr.to_string()));
        } else if !error_lines.is_empty() {
            self.fail("ffmpeg reported errors", Some(error_lines.join("\n")));
        } else if tokio::fs::metadata(&self.spec.output_path).await.is_err() {
            self.fail("Output file not created", None);
        } else {
            self.transition(JobState::Succeeded);
            info!(
                "Transcode job {} finished in {} ms",
                self.id,
                self.started.elapsed().as_millis()
            );
        }
    }

    fn fail(&mut self, reason: impl Into<String>, stderr: Option<String>) {
        let reason = reason.into();
        warn!("Transcode job {} failed: {}", self.id, reason);
        self.failure = Some(Failure::Engine { reason, stderr });
        self.transition(JobState::Failed);
    }

    fn transition(&mut self, next: JobState) {
        if self.state.can_transition_to(next) {
            debug!("Transcode job {}: {:?} -> {:?}", self.id, self.state, next);
            self.state = next;
        }
    }
}

/// Stderr lines the engine tagged as errors.
///
/// Lines look like `[error] ...` or, with a component prefix,
/// `[aac @ 0x5581] [error] ...`.
fn reported_errors(stderr: &str) -> Vec<&str> {
    const ERROR_TAGS: [&str; 3] = ["[error]", "[fatal]", "[panic]"];
    stderr
        .lines()
        .filter(|line| ERROR_TAGS.iter().any(|tag| line.contains(tag)))
        .collect()
}
