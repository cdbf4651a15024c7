//! Secondary indices over vertices and edges
//!
//! Manual indices are filled by explicit calls; automatic and key indices
//! follow live property values through the store's mutation path.

pub mod property_index;
pub mod manager;

pub use property_index::{AutoKeys, ElementView, IndexKind, PropertyIndex};
pub use manager::{IndexManager, IndexNotifier};
