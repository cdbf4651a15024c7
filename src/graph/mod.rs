//! Core property graph implementation
//!
//! This module implements the property graph data model with:
//! - Vertices with properties and per-label adjacency
//! - Directed, labelled edges with properties
//! - Self loops and parallel edges, subject to store capabilities
//! - In-memory storage that keeps automatic indices in sync

pub mod edge;
pub mod error;
pub mod event;
pub mod features;
pub mod property;
pub mod store;
pub mod transaction;
pub mod types;
pub mod vertex;

// Re-export main types
pub use edge::Edge;
pub use error::{ErrorKind, GraphError, GraphResult};
pub use event::{GraphEvent, TransactionBuffer};
pub use features::{Features, StoreConfig};
pub use property::{Properties, PropertyMap, PropertyObserver, PropertyValue, ID_KEY, LABEL_KEY};
pub use store::{GraphStatistics, GraphStore};
pub use transaction::{Conclusion, TransactionalGraph};
pub use types::{Direction, ElementId, ElementKind};
pub use vertex::Vertex;
