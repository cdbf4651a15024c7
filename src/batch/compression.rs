//! Key compression for text vertex-id caches

use indexmap::IndexSet;
use std::fmt::Debug;

/// Reversible-enough rewriting of text ids before they are stored
///
/// Two distinct inputs must never compress to the same key.
pub trait StringCompression: Debug {
    /// Compress an id that is about to be stored, registering any state it needs
    fn compress(&mut self, id: &str) -> String;

    /// Compress an id for lookup; `None` means it cannot have been stored
    fn compressed(&self, id: &str) -> Option<String>;
}

/// Stores ids as given
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompression;

impl StringCompression for NoCompression {
    fn compress(&mut self, id: &str) -> String {
        id.to_string()
    }

    fn compressed(&self, id: &str) -> Option<String> {
        Some(id.to_string())
    }
}

/// Replaces the namespace of URL-like ids with a short numeric handle
///
/// `http://example.org/people#alice` is split after the last `/` or `#`;
/// the namespace is interned once and the stored key becomes `<n>|alice`.
/// Ids without a separator are stored as `|id`.
#[derive(Debug, Clone, Default)]
pub struct UrlCompression {
    namespaces: IndexSet<String>,
}

impl UrlCompression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct namespaces seen so far
    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    fn split(id: &str) -> Option<(&str, &str)> {
        id.rfind(|c: char| c == '/' || c == '#').map(|at| id.split_at(at + 1))
    }
}

impl StringCompression for UrlCompression {
    fn compress(&mut self, id: &str) -> String {
        match Self::split(id) {
            Some((namespace, local)) => {
                let (handle, _) = self.namespaces.insert_full(namespace.to_string());
                format!("{}|{}", handle, local)
            }
            None => format!("|{}", id),
        }
    }

    fn compressed(&self, id: &str) -> Option<String> {
        match Self::split(id) {
            Some((namespace, local)) => self
                .namespaces
                .get_index_of(namespace)
                .map(|handle| format!("{}|{}", handle, local)),
            None => Some(format!("|{}", id)),
        }
    }
}
