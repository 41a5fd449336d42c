//! Binaries module for locating the engine executables.
//!
//! Resolution runs once at process start, before any concurrent work, and
//! produces immutable absolute paths for the transcoder (ffmpeg) and the
//! prober (ffprobe).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mediabridge_core::binaries::{BinaryResolver, DirectoryResources};
//!
//! let resolver = BinaryResolver::new(
//!     "/home/user/.local/share/mediabridge/media-binaries",
//!     Arc::new(DirectoryResources::new("/opt/mediabridge/bundled")),
//! );
//! let binaries = resolver.resolve_all()?;
//! println!("ffmpeg at {}", binaries.transcoder.path().display());
//! ```

mod error;
mod platform;
mod resolver;
mod resources;
mod types;

pub use error::ResolveError;
pub use platform::Platform;
pub use resolver::BinaryResolver;
pub use resources::{DirectoryResources, EmbeddedResources, NoResources, ResourceBundle};
pub use types::{BinaryKind, BinaryOrigin, ExecutableBinary, ResolvedBinaries};

pub(crate) use resolver::is_executable;
