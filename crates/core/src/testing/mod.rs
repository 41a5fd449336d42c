//! Testing utilities and stand-ins for the external engine.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediabridge_core::config::TranscodeConfig;
//! use mediabridge_core::format::MediaFormatAdapter;
//! use mediabridge_core::testing::{fake_engine_at, fixtures};
//!
//! let engine = Arc::new(fake_engine_at(tools_dir, &TranscodeConfig::default()));
//! let wav = MediaFormatAdapter::new("wav", engine);
//! let staged = wav.read(fixtures::wav_bytes().into()).await?;
//! ```

#[cfg(unix)]
mod fake_tools;
mod mock_process_runner;
mod static_format;

#[cfg(unix)]
pub use fake_tools::{fake_engine_at, write_fake_tools};
pub use mock_process_runner::MockProcessRunner;
pub use static_format::StaticFormat;

/// Minimal file headers the fake engine recognises.
pub mod fixtures {
    /// A RIFF/WAVE header.
    pub fn wav_bytes() -> Vec<u8> {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&36u32.to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes
    }

    /// An Ogg page header.
    pub fn ogg_bytes() -> Vec<u8> {
        b"OggS\x00\x02\x00\x00".to_vec()
    }

    /// An ID3v2.3 tag header.
    pub fn mp3_bytes() -> Vec<u8> {
        b"ID3\x03\x00\x00\x00\x00".to_vec()
    }

    /// Bytes the fake transcoder accepts but reports an error for.
    pub fn broken_bytes() -> Vec<u8> {
        b"BROKEN media payload".to_vec()
    }

    /// Bytes the fake transcoder takes two seconds to convert.
    pub fn slow_bytes() -> Vec<u8> {
        b"SLOW media payload".to_vec()
    }
}
