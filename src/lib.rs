//! Property graph storage with automatic indices and a bulk loader
//!
//! An in-memory property graph whose secondary indices follow every
//! property mutation, plus an append-only loader that streams large graphs
//! into any transactional store with bounded memory.
//!
//! # Components
//!
//! - [`graph`]: vertices, edges, properties and the [`GraphStore`]
//! - [`index`]: manual, automatic and key indices
//! - [`batch`]: vertex id caches and the [`BatchGraph`] loader
//!
//! ## Example Usage
//!
//! ```rust
//! use propgraph::graph::{Direction, ElementKind, GraphStore, PropertyValue};
//!
//! let mut store = GraphStore::new();
//!
//! // Create vertices
//! let alice = store.add_vertex(Some("alice".into())).unwrap();
//! let bob = store.add_vertex(Some("bob".into())).unwrap();
//!
//! // Create an edge and give it a weight
//! let knows = store.add_edge(None, &alice, &bob, "knows").unwrap();
//! store.set_edge_property(&knows, "weight", 0.5f64).unwrap();
//!
//! // Look it up through a key index
//! store.create_key_index("weight", ElementKind::Edge).unwrap();
//! let weighted = store.edges_with("weight", &PropertyValue::from(0.5f64));
//! assert_eq!(weighted.len(), 1);
//!
//! assert_eq!(store.neighbors(&alice, Direction::Out, &[]).unwrap().len(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod graph;
pub mod index;

// Re-export main types for convenience
pub use graph::{
    Conclusion, Direction, Edge, ElementId, ElementKind, ErrorKind, Features, GraphError, GraphResult,
    GraphStatistics, GraphStore, PropertyMap, PropertyValue, StoreConfig, TransactionalGraph, Vertex,
};

pub use index::{AutoKeys, IndexKind, PropertyIndex};

pub use batch::{BatchConfig, BatchGraph, LoadedEdge, LoadedVertex, VertexIdCache, VertexIdType};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
