//! The transactional mutation contract
//!
//! [`TransactionalGraph`] is what a bulk loader needs from a backing store:
//! transaction boundaries plus the insert and property-write subset of the
//! store API. It says nothing about how elements are held, so remote or
//! on-disk engines can implement it as well as [`GraphStore`](super::GraphStore).

use super::error::GraphResult;
use super::features::Features;
use super::property::PropertyValue;
use super::types::ElementId;

/// How a transaction ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conclusion {
    Success,
    Failure,
}

/// Mutation contract of a store that commits in transactions
pub trait TransactionalGraph {
    fn features(&self) -> &Features;

    /// Open a transaction; fails if one is already open
    fn start_transaction(&mut self) -> GraphResult<()>;

    /// Commit (`Success`) or roll back (`Failure`) the open transaction
    fn stop_transaction(&mut self, conclusion: Conclusion) -> GraphResult<()>;

    /// Insert a vertex, returning the identifier the store assigned
    fn add_vertex(&mut self, id: Option<ElementId>) -> GraphResult<ElementId>;

    fn add_edge(
        &mut self,
        id: Option<ElementId>,
        tail: &ElementId,
        head: &ElementId,
        label: &str,
    ) -> GraphResult<ElementId>;

    fn set_vertex_property(
        &mut self,
        vertex: &ElementId,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>>;

    fn set_edge_property(
        &mut self,
        edge: &ElementId,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>>;

    fn vertex_property(&self, vertex: &ElementId, key: &str) -> GraphResult<Option<PropertyValue>>;

    fn contains_vertex(&self, vertex: &ElementId) -> bool;

    /// Vertices whose `key` property equals `value`
    fn vertex_ids_with(&self, key: &str, value: &PropertyValue) -> Vec<ElementId>;
}
