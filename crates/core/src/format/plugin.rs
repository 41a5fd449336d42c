//! Lifecycle of the media formats inside a host registry.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::adapter::{MediaEngine, MediaFormatAdapter};
use super::registry::FormatRegistry;
use super::traits::{ReadableFormat, WritableFormat};
use crate::binaries::{
    BinaryResolver, DirectoryResources, NoResources, ResolveError, ResolvedBinaries,
    ResourceBundle,
};
use crate::config::{validate_config, Config, ConfigError};

#[derive(Debug, Error)]
pub enum PluginError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Handlers a loaded plugin took out of the registry.
#[derive(Default)]
struct Displaced {
    readable: Vec<Arc<dyn ReadableFormat>>,
    writable: Vec<Arc<dyn WritableFormat>>,
}

/// Owns the engine and swaps its adapters in and out of a host registry.
///
/// `load` replaces any handler already registered under one of the configured
/// format names and `unload` puts those handlers back. Both are idempotent.
pub struct MediaPlugin {
    engine: Arc<MediaEngine>,
    formats: Vec<String>,
    displaced: Option<Displaced>,
}

impl MediaPlugin {
    /// Resolves the engine binaries, using the configured resource directory
    /// as the bundle when one is set.
    ///
    /// Blocks while probing for installed binaries.
    pub fn initialise(config: &Config) -> Result<Self, PluginError> {
        let resources: Arc<dyn ResourceBundle> = match &config.binaries.resource_dir {
            Some(dir) => Arc::new(DirectoryResources::new(dir)),
            None => Arc::new(NoResources),
        };
        Self::initialise_with_resources(config, resources)
    }

    /// Resolves the engine binaries from `resources`.
    pub fn initialise_with_resources(
        config: &Config,
        resources: Arc<dyn ResourceBundle>,
    ) -> Result<Self, PluginError> {
        validate_config(config)?;
        let resolver = BinaryResolver::new(config.binaries.extract_dir(), resources);
        let binaries = resolver.resolve_all()?;
        Self::with_binaries(binaries, config)
    }

    /// Builds the plugin around binaries the host already resolved.
    pub fn with_binaries(binaries: ResolvedBinaries, config: &Config) -> Result<Self, PluginError> {
        let engine = MediaEngine::new(binaries, &config.transcode)?;
        Ok(Self {
            engine: Arc::new(engine),
            formats: config.formats.clone(),
            displaced: None,
        })
    }

    pub fn engine(&self) -> &Arc<MediaEngine> {
        &self.engine
    }

    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    pub fn is_loaded(&self) -> bool {
        self.displaced.is_some()
    }

    /// One adapter per configured format, sharing the engine.
    pub fn adapters(&self) -> Vec<MediaFormatAdapter> {
        self.formats
            .iter()
            .map(|format| MediaFormatAdapter::new(format, Arc::clone(&self.engine)))
            .collect()
    }

    /// Registers the adapters, remembering what they displace.
    pub fn load(&mut self, registry: &mut dyn FormatRegistry) {
        if self.is_loaded() {
            debug!("Media formats already loaded");
            return;
        }

        let mut displaced = Displaced::default();
        for adapter in self.adapters() {
            let name = adapter.format().to_string();
            displaced.readable.extend(registry.remove_readable(&name));
            displaced.writable.extend(registry.remove_writable(&name));

            let adapter = Arc::new(adapter);
            registry.add_readable(adapter.clone());
            registry.add_writable(adapter);
        }

        info!(
            "Loaded media formats {:?}, replacing {} default handlers",
            self.formats,
            displaced.readable.len() + displaced.writable.len()
        );
        self.displaced = Some(displaced);
    }

    /// Removes the adapters and restores the displaced handlers.
    pub fn unload(&mut self, registry: &mut dyn FormatRegistry) {
        let Some(displaced) = self.displaced.take() else {
            debug!("Media formats not loaded");
            return;
        };

        for name in &self.formats {
            registry.remove_readable(name);
            registry.remove_writable(name);
        }
        for format in displaced.readable {
            registry.add_readable(format);
        }
        for format in displaced.writable {
            registry.add_writable(format);
        }

        info!("Unloaded media formats {:?}", self.formats);
    }
}

impl std::fmt::Debug for MediaPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPlugin")
            .field("engine", &self.engine)
            .field("formats", &self.formats)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_config_is_rejected_before_resolving() {
        let config = Config {
            formats: vec![],
            ..Default::default()
        };
        let err = MediaPlugin::initialise_with_resources(&config, Arc::new(NoResources))
            .unwrap_err();
        assert!(matches!(err, PluginError::Config(_)));
    }

    #[test]
    fn test_missing_binaries_are_rejected() {
        let temp = TempDir::new().unwrap();
        let binaries = ResolvedBinaries::from_paths(
            temp.path().join("ffmpeg"),
            temp.path().join("ffprobe"),
        );
        let err = MediaPlugin::with_binaries(binaries, &Config::default()).unwrap_err();
        assert!(matches!(
            err,
            PluginError::Resolve(ResolveError::NotExecutable { .. })
        ));
    }
}
