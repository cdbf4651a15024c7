//! Bulk loading with bounded memory
//!
//! The loader commits every `buffer_size` inserts and resolves vertices by
//! external id through a [`VertexIdCache`] chosen for the id shape.

pub mod compression;
pub mod id_cache;
pub mod loader;

pub use compression::{NoCompression, StringCompression, UrlCompression};
pub use id_cache::{LongIdCache, ObjectIdCache, StringIdCache, VertexIdCache, VertexIdType};
pub use loader::{BatchConfig, BatchGraph, LoadedEdge, LoadedVertex, DEFAULT_BUFFER_SIZE};
