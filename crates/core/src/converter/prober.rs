//! Container format classification with ffprobe.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use super::error::ConverterError;
use super::types::ProbeReport;

/// Classifies files by invoking the prober executable.
#[derive(Debug, Clone)]
pub struct FormatProber {
    ffprobe_path: PathBuf,
}

impl FormatProber {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe_path
    }

    /// Builds ffprobe arguments for a format report.
    fn build_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
            "-show_error".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }

    /// Probes `path` and returns the engine's report.
    ///
    /// A file the engine cannot classify yields a report with `has_error`
    /// set. Only a failure to launch the prober is returned as an error.
    pub async fn classify(&self, path: &Path) -> Result<ProbeReport, ConverterError> {
        let output = Command::new(&self.ffprobe_path)
            .args(Self::build_args(path))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ConverterError::ProcessLaunch {
                program: self.ffprobe_path.clone(),
                source: e,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let report = Self::parse_report(&stdout, output.status.success());
        debug!(
            "Probed {}: format={:?} error={}",
            path.display(),
            report.format_name,
            report.has_error
        );
        Ok(report)
    }

    /// Whether `path` is in `candidate` format.
    ///
    /// Never fails: probe errors, and prober launch failures, are "no".
    pub async fn identify(&self, path: &Path, candidate: &str) -> bool {
        match self.classify(path).await {
            Ok(report) => report.matches(candidate),
            Err(e) => {
                warn!("Could not probe {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Parses ffprobe JSON output into a ProbeReport.
    fn parse_report(output: &str, exited_successfully: bool) -> ProbeReport {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: Option<ProbeFormat>,
            error: Option<ProbeError>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            #[serde(default)]
            format_name: String,
            #[serde(default)]
            format_long_name: String,
        }

        #[derive(Deserialize)]
        struct ProbeError {
            code: Option<i64>,
            string: Option<String>,
        }

        let probe: ProbeOutput = match serde_json::from_str(output) {
            Ok(probe) => probe,
            Err(e) => return ProbeReport::error(format!("Unreadable ffprobe output: {}", e)),
        };

        if let Some(error) = probe.error {
            let message = match (error.string, error.code) {
                (Some(text), _) => text,
                (None, Some(code)) => format!("ffprobe error code {}", code),
                (None, None) => "ffprobe reported an error".to_string(),
            };
            return ProbeReport::error(message);
        }

        let Some(format) = probe.format else {
            return ProbeReport::error("ffprobe reported no format");
        };

        if !exited_successfully {
            return ProbeReport {
                format_name: format.format_name,
                format_long_name: format.format_long_name,
                has_error: true,
                error_message: Some("ffprobe exited with an error".to_string()),
            };
        }

        ProbeReport {
            format_name: format.format_name,
            format_long_name: format.format_long_name,
            has_error: false,
            error_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_ends_with_path() {
        let args = FormatProber::build_args(Path::new("/tmp/staged-1"));
        assert_eq!(args.last().unwrap(), "/tmp/staged-1");
        assert!(args.contains(&"-show_format".to_string()));
        assert!(args.contains(&"-show_error".to_string()));
        assert!(args.contains(&"json".to_string()));
    }

    #[test]
    fn test_parse_wav_report() {
        let json = r#"{
            "format": {
                "filename": "/tmp/staged-1",
                "nb_streams": 1,
                "format_name": "wav",
                "format_long_name": "WAV / WAVE (Waveform Audio)",
                "duration": "2.000000",
                "size": "352844"
            }
        }"#;

        let report = FormatProber::parse_report(json, true);
        assert!(!report.has_error);
        assert_eq!(report.format_name, "wav");
        assert_eq!(report.format_long_name, "WAV / WAVE (Waveform Audio)");
        assert!(report.matches("wav"));
        assert!(!report.matches("mp3"));
    }

    #[test]
    fn test_parse_error_report() {
        let json = r#"{
            "error": {
                "code": -1094995529,
                "string": "Invalid data found when processing input"
            }
        }"#;

        let report = FormatProber::parse_report(json, false);
        assert!(report.has_error);
        assert_eq!(
            report.error_message.as_deref(),
            Some("Invalid data found when processing input")
        );
        assert!(!report.matches("wav"));
    }

    #[test]
    fn test_parse_error_code_only() {
        let report = FormatProber::parse_report(r#"{"error": {"code": -2}}"#, false);
        assert_eq!(report.error_message.as_deref(), Some("ffprobe error code -2"));
    }

    #[test]
    fn test_parse_garbage_output() {
        let report = FormatProber::parse_report("not json at all", true);
        assert!(report.has_error);
        assert!(!report.matches(""));
    }

    #[test]
    fn test_parse_missing_format() {
        let report = FormatProber::parse_report("{}", true);
        assert!(report.has_error);
    }

    #[test]
    fn test_non_zero_exit_marks_error() {
        let json = r#"{"format": {"format_name": "ogg", "format_long_name": "Ogg"}}"#;
        let report = FormatProber::parse_report(json, false);
        assert!(report.has_error);
        assert_eq!(report.format_name, "ogg");
        assert!(!report.matches("ogg"));
    }

    #[tokio::test]
    async fn test_missing_prober_is_launch_error() {
        let prober = FormatProber::new("/nonexistent/ffprobe");
        let err = prober.classify(Path::new("/tmp/whatever")).await.unwrap_err();
        assert!(matches!(err, ConverterError::ProcessLaunch { .. }));
        assert!(!prober.identify(Path::new("/tmp/whatever"), "wav").await);
    }
}
