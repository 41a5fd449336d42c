//! Format handlers for the host pipeline.
//!
//! A [`MediaPlugin`] owns one [`MediaEngine`] and registers a
//! [`MediaFormatAdapter`] per configured format into a [`FormatRegistry`].

mod adapter;
mod plugin;
mod registry;
mod traits;

pub use adapter::{MediaEngine, MediaFormatAdapter};
pub use plugin::{MediaPlugin, PluginError};
pub use registry::{FormatRegistry, FormatSet};
pub use traits::{ReadableFormat, WritableFormat, WriteOutcome};
