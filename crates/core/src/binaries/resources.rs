//! Bundled engine executables.
//!
//! The host decides where bundled binaries come from: static byte slices
//! compiled into the program, a directory shipped next to it, or nothing.
//! A missing resource is reported as `None`, never as an error.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

/// Read access to bundled resources by file name.
pub trait ResourceBundle: Send + Sync {
    /// Whether a resource with this name exists.
    fn contains(&self, name: &str) -> bool;

    /// Reads a resource. Returns `Ok(None)` when it does not exist.
    fn read(&self, name: &str) -> io::Result<Option<Cow<'_, [u8]>>>;
}

/// Resources compiled into the program, e.g. with `include_bytes!`.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResources {
    entries: HashMap<String, &'static [u8]>,
}

impl EmbeddedResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource under `name`.
    pub fn with(mut self, name: impl Into<String>, bytes: &'static [u8]) -> Self {
        self.entries.insert(name.into(), bytes);
        self
    }
}

impl ResourceBundle for EmbeddedResources {
    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn read(&self, name: &str) -> io::Result<Option<Cow<'_, [u8]>>> {
        Ok(self.entries.get(name).map(|bytes| Cow::Borrowed(*bytes)))
    }
}

/// Resources stored as files in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resource_path(&self, name: &str) -> Option<PathBuf> {
        // Names are plain file names; anything that could escape the root is absent.
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return None;
        }
        Some(self.root.join(name))
    }
}

impl ResourceBundle for DirectoryResources {
    fn contains(&self, name: &str) -> bool {
        self.resource_path(name).is_some_and(|path| path.is_file())
    }

    fn read(&self, name: &str) -> io::Result<Option<Cow<'_, [u8]>>> {
        let Some(path) = self.resource_path(name) else {
            return Ok(None);
        };
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(Cow::Owned(bytes))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// A bundle with no resources.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResources;

impl ResourceBundle for NoResources {
    fn contains(&self, _name: &str) -> bool {
        false
    }

    fn read(&self, _name: &str) -> io::Result<Option<Cow<'_, [u8]>>> {
        Ok(None)
    }
}
