pub mod binaries;
pub mod config;
pub mod converter;
pub mod format;
pub mod process;
pub mod testing;

pub use binaries::{
    BinaryKind, BinaryOrigin, BinaryResolver, DirectoryResources, EmbeddedResources,
    ExecutableBinary, NoResources, ResolveError, ResolvedBinaries, ResourceBundle,
};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError,
};
pub use converter::{
    ConverterError, FormatProber, JobHandle, JobState, MediaInput, ProbeReport, StagedFile,
    TranscodeSpec, Transcoder, Verbosity,
};
pub use format::{
    FormatRegistry, FormatSet, MediaEngine, MediaFormatAdapter, MediaPlugin, PluginError,
    ReadableFormat, WritableFormat, WriteOutcome,
};
pub use process::{ProcessOutput, ProcessRunner, SystemProcessRunner};
