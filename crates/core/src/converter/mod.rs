//! Converter module for probing and transcoding media through ffmpeg.
//!
//! This module wraps the two engine executables:
//!
//! - [`FormatProber`] runs ffprobe against a file and reports its container
//!   format.
//! - [`Transcoder`] launches ffmpeg jobs. Each [`JobHandle`] moves through
//!   `Queued -> Running -> Succeeded | Failed` and never goes back.
//! - [`StagedFile`] copies arbitrary input into a uniquely named temp file
//!   and deletes it again when dropped.
//!
//! # Example
//!
//! ```ignore
//! use mediabridge_core::converter::{FormatProber, Transcoder, TranscodeSpec};
//!
//! let prober = FormatProber::new("/usr/bin/ffprobe");
//! if prober.identify(Path::new("/music/track.wav"), "wav").await {
//!     let transcoder = Transcoder::new("/usr/bin/ffmpeg");
//!     let mut job = transcoder.submit(TranscodeSpec::new(
//!         "/music/track.wav",
//!         "/tmp/track.ogg",
//!         "ogg",
//!     ))?;
//!     job.wait(None).await;
//!     println!("Wrote {}", job.result()?.display());
//! }
//! ```

mod error;
mod job;
mod prober;
mod staging;
mod types;

pub use error::ConverterError;
pub use job::{JobHandle, Transcoder};
pub use prober::FormatProber;
pub use staging::{MediaInput, StagedFile};
pub use types::{JobState, ProbeReport, TranscodeSpec, Verbosity};
