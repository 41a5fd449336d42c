//! Host registries of readable and writable formats.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::traits::{ReadableFormat, WritableFormat};

/// Where a host keeps its format handlers, keyed by format name.
pub trait FormatRegistry {
    /// Adds a reader, replacing any reader registered under the same name.
    fn add_readable(&mut self, format: Arc<dyn ReadableFormat>);

    /// Adds a writer, replacing any writer registered under the same name.
    fn add_writable(&mut self, format: Arc<dyn WritableFormat>);

    /// Removes and returns the reader registered under `name`.
    fn remove_readable(&mut self, name: &str) -> Option<Arc<dyn ReadableFormat>>;

    /// Removes and returns the writer registered under `name`.
    fn remove_writable(&mut self, name: &str) -> Option<Arc<dyn WritableFormat>>;
}

/// In-memory [`FormatRegistry`].
#[derive(Default, Clone)]
pub struct FormatSet {
    readable: BTreeMap<String, Arc<dyn ReadableFormat>>,
    writable: BTreeMap<String, Arc<dyn WritableFormat>>,
}

impl FormatSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn readable(&self, name: &str) -> Option<&Arc<dyn ReadableFormat>> {
        self.readable.get(name)
    }

    pub fn writable(&self, name: &str) -> Option<&Arc<dyn WritableFormat>> {
        self.writable.get(name)
    }

    /// Registered readers in name order.
    pub fn readers(&self) -> impl Iterator<Item = &Arc<dyn ReadableFormat>> {
        self.readable.values()
    }

    pub fn readable_names(&self) -> Vec<&str> {
        self.readable.keys().map(String::as_str).collect()
    }

    pub fn writable_names(&self) -> Vec<&str> {
        self.writable.keys().map(String::as_str).collect()
    }
}

impl FormatRegistry for FormatSet {
    fn add_readable(&mut self, format: Arc<dyn ReadableFormat>) {
        self.readable.insert(format.name().to_string(), format);
    }

    fn add_writable(&mut self, format: Arc<dyn WritableFormat>) {
        self.writable.insert(format.name().to_string(), format);
    }

    fn remove_readable(&mut self, name: &str) -> Option<Arc<dyn ReadableFormat>> {
        self.readable.remove(name)
    }

    fn remove_writable(&mut self, name: &str) -> Option<Arc<dyn WritableFormat>> {
        self.writable.remove(name)
    }
}

impl fmt::Debug for FormatSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatSet")
            .field("readable", &self.readable_names())
            .field("writable", &self.writable_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticFormat;

    #[test]
    fn test_add_replaces_same_name() {
        let mut set = FormatSet::new();
        set.add_readable(Arc::new(StaticFormat::new("wav", "first")));
        set.add_readable(Arc::new(StaticFormat::new("wav", "second")));

        assert_eq!(set.readable_names(), vec!["wav"]);
        let removed = set.remove_readable("wav").unwrap();
        assert_eq!(removed.name(), "wav");
        assert!(set.readable("wav").is_none());
    }

    #[test]
    fn test_readable_and_writable_are_independent() {
        let mut set = FormatSet::new();
        set.add_writable(Arc::new(StaticFormat::new("mp3", "builtin")));

        assert!(set.readable("mp3").is_none());
        assert!(set.writable("mp3").is_some());
        assert!(set.remove_readable("mp3").is_none());
        assert_eq!(set.writable_names(), vec!["mp3"]);
    }

    #[test]
    fn test_debug_lists_names() {
        let mut set = FormatSet::new();
        set.add_readable(Arc::new(StaticFormat::new("ogg", "builtin")));
        assert_eq!(
            format!("{:?}", set),
            r#"FormatSet { readable: ["ogg"], writable: [] }"#
        );
    }
}
