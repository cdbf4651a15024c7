//! In-memory graph storage implementation
//!
//! The store owns every vertex and edge, assigns identifiers, maintains
//! adjacency and routes every property mutation through the index manager
//! so automatic indices stay in step with live values.
//!
//! Structural mutation takes `&mut self`, so concurrent writers need
//! external serialization; shared `&self` readers may inspect any element at
//! the same time.

use super::edge::Edge;
use super::error::{GraphError, GraphResult};
use super::event::{GraphEvent, TransactionBuffer};
use super::features::{Features, StoreConfig};
use super::property::{PropertyValue, ID_KEY, LABEL_KEY};
use super::transaction::{Conclusion, TransactionalGraph};
use super::types::{Direction, ElementId, ElementKind};
use super::vertex::{End, Vertex};
use crate::index::{AutoKeys, ElementView, IndexManager, PropertyIndex};
use indexmap::{IndexMap, IndexSet};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Summary counters of a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphStatistics {
    pub vertex_count: usize,
    pub edge_count: usize,
    /// Edge count per label
    pub edge_labels: BTreeMap<String, usize>,
    pub named_indices: usize,
    pub vertex_key_indices: usize,
    pub edge_key_indices: usize,
}

/// In-memory graph storage
///
/// Elements live in insertion-ordered tables keyed by identifier:
/// - vertices: ElementId -> Vertex (with per-label adjacency)
/// - edges: ElementId -> Edge
///
/// Generated identifiers come from one counter shared by both tables.
#[derive(Debug)]
pub struct GraphStore {
    config: StoreConfig,

    vertices: IndexMap<ElementId, Vertex>,

    edges: IndexMap<ElementId, Edge>,

    indices: IndexManager,

    /// Next candidate for a generated identifier; `None` once exhausted
    next_id: Option<i64>,

    /// Open transaction, if any
    transaction: Option<TransactionBuffer>,

    commits: u64,
}

impl GraphStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::with_config(StoreConfig::in_memory())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        debug!("Creating graph store: {:?}", config.features);
        GraphStore {
            config,
            vertices: IndexMap::new(),
            edges: IndexMap::new(),
            indices: IndexManager::new(),
            next_id: Some(1),
            transaction: None,
            commits: 0,
        }
    }

    pub fn features(&self) -> &Features {
        &self.config.features
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ============================================================
    // Identifiers
    // ============================================================

    /// Resolve a caller-supplied identifier; `None` means "generate one"
    fn supplied(&self, id: Option<ElementId>) -> Option<ElementId> {
        if self.config.features.ignores_supplied_ids {
            return None;
        }
        id.filter(|id| !id.is_empty())
    }

    /// Next counter value not bound to any vertex or edge
    fn generate_id(&mut self) -> GraphResult<ElementId> {
        loop {
            let current = self.next_id.ok_or(GraphError::IdSpaceExhausted)?;
            self.next_id = current.checked_add(1);
            let candidate = ElementId::Long(current);
            if !self.vertices.contains_key(&candidate) && !self.edges.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
    }

    fn record(&mut self, event: impl FnOnce() -> GraphEvent) {
        if let Some(buffer) = &mut self.transaction {
            buffer.push(event());
        }
    }

    // ============================================================
    // Vertices
    // ============================================================

    /// Create a vertex
    ///
    /// A supplied identifier that is already bound to a vertex is rejected.
    pub fn add_vertex(&mut self, id: Option<ElementId>) -> GraphResult<ElementId> {
        let id = match self.supplied(id) {
            Some(id) if self.vertices.contains_key(&id) => {
                return Err(GraphError::VertexAlreadyExists(id));
            }
            Some(id) => id,
            None => self.generate_id()?,
        };
        self.insert_vertex(id.clone());
        Ok(id)
    }

    fn insert_vertex(&mut self, id: ElementId) {
        let vertex = Vertex::new(id.clone());
        self.indices.element_added(
            ElementView {
                id: vertex.id(),
                label: None,
                properties: vertex.properties(),
            },
            ElementKind::Vertex,
        );
        self.vertices.insert(id.clone(), vertex);
        self.record(|| GraphEvent::VertexAdded { id });
    }

    pub fn get_vertex(&self, id: &ElementId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn contains_vertex(&self, id: &ElementId) -> bool {
        self.vertices.contains_key(id)
    }

    /// Remove a vertex and every incident edge
    ///
    /// Edges go first, through the same path as [`GraphStore::remove_edge`].
    pub fn remove_vertex(&mut self, id: &ElementId) -> GraphResult<Vertex> {
        let vertex = self
            .vertices
            .get(id)
            .ok_or_else(|| GraphError::VertexNotFound(id.clone()))?;
        // self loops appear in both directions
        let incident: IndexSet<ElementId> = vertex.edge_ids(Direction::Both, &[]).into_iter().collect();
        for edge in &incident {
            self.remove_edge(edge)?;
        }

        let vertex = self
            .vertices
            .swap_remove(id)
            .ok_or_else(|| GraphError::VertexNotFound(id.clone()))?;
        self.indices.remove_element(ElementKind::Vertex, id);
        debug!("Removed vertex {} with {} incident edges", id, incident.len());
        self.record(|| GraphEvent::VertexRemoved {
            id: id.clone(),
            properties: vertex.properties().as_map().clone(),
        });
        Ok(vertex)
    }

    // ============================================================
    // Edges
    // ============================================================

    /// Create an edge from `tail` to `head`
    pub fn add_edge(
        &mut self,
        id: Option<ElementId>,
        tail: &ElementId,
        head: &ElementId,
        label: &str,
    ) -> GraphResult<ElementId> {
        if label.is_empty() {
            return Err(GraphError::EmptyLabel);
        }
        let tail_vertex = self
            .vertices
            .get(tail)
            .ok_or_else(|| GraphError::VertexNotFound(tail.clone()))?;
        if !self.vertices.contains_key(head) {
            return Err(GraphError::VertexNotFound(head.clone()));
        }
        let features = &self.config.features;
        if tail == head && !features.supports_self_loops {
            return Err(GraphError::SelfLoopsNotSupported);
        }
        if !features.supports_duplicate_edges {
            let parallel = tail_vertex
                .edge_ids(Direction::Out, &[label])
                .iter()
                .filter_map(|edge| self.edges.get(edge))
                .any(|edge| edge.head() == head);
            if parallel {
                return Err(GraphError::DuplicateEdgesNotSupported);
            }
        }

        let id = match self.supplied(id) {
            Some(id) if self.edges.contains_key(&id) => {
                return Err(GraphError::EdgeAlreadyExists(id));
            }
            Some(id) => id,
            None => self.generate_id()?,
        };
        self.insert_edge(id.clone(), tail.clone(), head.clone(), label.to_string());
        Ok(id)
    }

    /// Link a validated edge into both endpoints and the automatic indices
    fn insert_edge(&mut self, id: ElementId, tail: ElementId, head: ElementId, label: String) {
        if let Some(vertex) = self.vertices.get_mut(&tail) {
            vertex.link(End::Out, &label, id.clone());
        }
        if let Some(vertex) = self.vertices.get_mut(&head) {
            vertex.link(End::In, &label, id.clone());
        }
        let edge = Edge::new(id.clone(), tail.clone(), head.clone(), label.clone());
        self.indices.element_added(
            ElementView {
                id: edge.id(),
                label: Some(edge.label()),
                properties: edge.properties(),
            },
            ElementKind::Edge,
        );
        self.edges.insert(id.clone(), edge);
        self.record(|| GraphEvent::EdgeAdded { id, tail, head, label });
    }

    pub fn get_edge(&self, id: &ElementId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Remove an edge, detaching it from both endpoints and every index
    pub fn remove_edge(&mut self, id: &ElementId) -> GraphResult<Edge> {
        let edge = self
            .edges
            .swap_remove(id)
            .ok_or_else(|| GraphError::EdgeNotFound(id.clone()))?;
        if let Some(vertex) = self.vertices.get_mut(edge.tail()) {
            vertex.unlink(End::Out, edge.label(), id);
        }
        if let Some(vertex) = self.vertices.get_mut(edge.head()) {
            vertex.unlink(End::In, edge.label(), id);
        }
        self.indices.remove_element(ElementKind::Edge, id);
        self.record(|| GraphEvent::edge_removed(&edge));
        Ok(edge)
    }

    // ============================================================
    // Properties
    // ============================================================

    pub fn set_vertex_property(
        &mut self,
        id: &ElementId,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        self.set_property(ElementKind::Vertex, id, key, value.into())
    }

    pub fn remove_vertex_property(&mut self, id: &ElementId, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.remove_property(ElementKind::Vertex, id, key)
    }

    pub fn set_edge_property(
        &mut self,
        id: &ElementId,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        self.set_property(ElementKind::Edge, id, key, value.into())
    }

    pub fn remove_edge_property(&mut self, id: &ElementId, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.remove_property(ElementKind::Edge, id, key)
    }

    fn set_property(
        &mut self,
        kind: ElementKind,
        id: &ElementId,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>> {
        check_supported(&self.config.features, kind, &value)?;
        let recorded = self.transaction.is_some().then(|| value.clone());
        let properties = match kind {
            ElementKind::Vertex => self.vertices.get_mut(id).map(Vertex::properties_mut),
            ElementKind::Edge => self.edges.get_mut(id).map(Edge::properties_mut),
        };
        let properties = properties.ok_or_else(|| not_found(kind, id))?;
        let old = properties.set(key, value, &mut self.indices.notifier(kind, id))?;
        self.record(|| GraphEvent::PropertyChanged {
            kind,
            id: id.clone(),
            key: key.to_string(),
            old_value: old.clone(),
            new_value: recorded,
        });
        Ok(old)
    }

    fn remove_property(
        &mut self,
        kind: ElementKind,
        id: &ElementId,
        key: &str,
    ) -> GraphResult<Option<PropertyValue>> {
        let properties = match kind {
            ElementKind::Vertex => self.vertices.get_mut(id).map(Vertex::properties_mut),
            ElementKind::Edge => self.edges.get_mut(id).map(Edge::properties_mut),
        };
        let properties = properties.ok_or_else(|| not_found(kind, id))?;
        let old = properties.remove(key, &mut self.indices.notifier(kind, id))?;
        if old.is_some() {
            self.record(|| GraphEvent::PropertyChanged {
                kind,
                id: id.clone(),
                key: key.to_string(),
                old_value: old.clone(),
                new_value: None,
            });
        }
        Ok(old)
    }

    // ============================================================
    // Traversal and snapshots
    // ============================================================

    /// Incident edges of a vertex, optionally filtered by label
    pub fn edges_of(&self, vertex: &ElementId, direction: Direction, labels: &[&str]) -> GraphResult<Vec<&Edge>> {
        let vertex = self
            .vertices
            .get(vertex)
            .ok_or_else(|| GraphError::VertexNotFound(vertex.clone()))?;
        Ok(vertex
            .edge_ids(direction, labels)
            .iter()
            .filter_map(|id| self.edges.get(id))
            .collect())
    }

    /// Vertices on the far side of the incident edges
    pub fn neighbors(&self, vertex: &ElementId, direction: Direction, labels: &[&str]) -> GraphResult<Vec<&Vertex>> {
        let mut result = Vec::new();
        if direction.includes_out() {
            for edge in self.edges_of(vertex, Direction::Out, labels)? {
                result.extend(self.vertices.get(edge.head()));
            }
        }
        if direction.includes_in() {
            for edge in self.edges_of(vertex, Direction::In, labels)? {
                result.extend(self.vertices.get(edge.tail()));
            }
        }
        Ok(result)
    }

    /// All vertices, in insertion order until the first removal
    pub fn vertices(&self) -> Vec<&Vertex> {
        self.vertices.values().collect()
    }

    pub fn edges(&self) -> Vec<&Edge> {
        self.edges.values().collect()
    }

    /// Owned snapshot of vertex identifiers, safe to walk while mutating
    pub fn vertex_ids(&self) -> Vec<ElementId> {
        self.vertices.keys().cloned().collect()
    }

    pub fn edge_ids(&self) -> Vec<ElementId> {
        self.edges.keys().cloned().collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Vertices whose `key` equals `value`, through a key index when one exists
    pub fn vertices_with(&self, key: &str, value: &PropertyValue) -> Vec<&Vertex> {
        match self.indices.key_index(key, ElementKind::Vertex) {
            Some(index) => index
                .get(key, value)
                .iter()
                .filter_map(|id| self.vertices.get(id))
                .collect(),
            None => self
                .vertices
                .values()
                .filter(|vertex| vertex.property(key) == Some(value))
                .collect(),
        }
    }

    /// Edges whose `key` equals `value`; `label` matches the edge label
    pub fn edges_with(&self, key: &str, value: &PropertyValue) -> Vec<&Edge> {
        match self.indices.key_index(key, ElementKind::Edge) {
            Some(index) => index
                .get(key, value)
                .iter()
                .filter_map(|id| self.edges.get(id))
                .collect(),
            None if key == LABEL_KEY => self
                .edges
                .values()
                .filter(|edge| value.as_string() == Some(edge.label()))
                .collect(),
            None => self
                .edges
                .values()
                .filter(|edge| edge.property(key) == Some(value))
                .collect(),
        }
    }

    pub fn statistics(&self) -> GraphStatistics {
        let mut edge_labels = BTreeMap::new();
        for edge in self.edges.values() {
            *edge_labels.entry(edge.label().to_string()).or_insert(0) += 1;
        }
        GraphStatistics {
            vertex_count: self.vertices.len(),
            edge_count: self.edges.len(),
            edge_labels,
            named_indices: self.indices.indices().count(),
            vertex_key_indices: self.indices.indexed_keys(ElementKind::Vertex).len(),
            edge_key_indices: self.indices.indexed_keys(ElementKind::Edge).len(),
        }
    }

    /// Remove every element and index and restart identifier generation
    ///
    /// An open transaction stays open but forgets what it recorded.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.indices.clear();
        self.next_id = Some(1);
        if let Some(buffer) = &mut self.transaction {
            buffer.flush();
        }
    }

    // ============================================================
    // Indices
    // ============================================================

    fn check_indexable(&self, kind: ElementKind) -> GraphResult<()> {
        if self.config.features.supports_index_over(kind) {
            Ok(())
        } else {
            Err(GraphError::UnindexableKind(kind))
        }
    }

    fn check_key_indexable(&self, kind: ElementKind, key: &str) -> GraphResult<()> {
        if !self.config.features.supports_key_index_over(kind) {
            return Err(GraphError::UnindexableKind(kind));
        }
        if key.is_empty() {
            return Err(GraphError::EmptyPropertyKey);
        }
        if key == ID_KEY {
            return Err(GraphError::ReservedProperty(key.to_string()));
        }
        Ok(())
    }

    /// Create a manual index
    pub fn create_index(&mut self, name: &str, kind: ElementKind) -> GraphResult<&mut PropertyIndex> {
        self.check_indexable(kind)?;
        self.indices.create_index(name, kind)
    }

    /// Create an automatic index over `keys`, backfilled from existing elements
    pub fn create_automatic_index(
        &mut self,
        name: &str,
        kind: ElementKind,
        keys: AutoKeys,
    ) -> GraphResult<&PropertyIndex> {
        self.check_indexable(kind)?;
        match kind {
            ElementKind::Vertex => {
                self.indices
                    .create_automatic_index(name, kind, keys, vertex_views(&self.vertices))
            }
            ElementKind::Edge => {
                self.indices
                    .create_automatic_index(name, kind, keys, edge_views(&self.edges))
            }
        }
    }

    pub fn get_index(&self, name: &str, kind: ElementKind) -> GraphResult<Option<&PropertyIndex>> {
        self.indices.get_index(name, kind)
    }

    /// Mutable access to a manual index for explicit `put`/`remove`
    pub fn index_mut(&mut self, name: &str, kind: ElementKind) -> GraphResult<Option<&mut PropertyIndex>> {
        self.indices.manual_index_mut(name, kind)
    }

    pub fn drop_index(&mut self, name: &str) -> bool {
        self.indices.drop_index(name)
    }

    pub fn indices(&self) -> impl Iterator<Item = &PropertyIndex> {
        self.indices.indices()
    }

    /// Create a key index; `Ok(false)` if it already existed
    pub fn create_key_index(&mut self, key: &str, kind: ElementKind) -> GraphResult<bool> {
        self.check_key_indexable(kind, key)?;
        let created = match kind {
            ElementKind::Vertex => self
                .indices
                .create_key_index(key, kind, vertex_views(&self.vertices)),
            ElementKind::Edge => self.indices.create_key_index(key, kind, edge_views(&self.edges)),
        };
        Ok(created)
    }

    pub fn drop_key_index(&mut self, key: &str, kind: ElementKind) -> GraphResult<bool> {
        self.check_key_indexable(kind, key)?;
        Ok(self.indices.drop_key_index(key, kind))
    }

    pub fn indexed_keys(&self, kind: ElementKind) -> GraphResult<BTreeSet<String>> {
        if !self.config.features.supports_key_index_over(kind) {
            return Err(GraphError::UnindexableKind(kind));
        }
        Ok(self.indices.indexed_keys(kind))
    }

    pub fn key_index(&self, key: &str, kind: ElementKind) -> Option<&PropertyIndex> {
        self.indices.key_index(key, kind)
    }

    // ============================================================
    // Transactions
    // ============================================================

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Number of committed transactions
    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn start_transaction(&mut self) -> GraphResult<()> {
        if !self.config.features.supports_transactions {
            return Err(GraphError::Config("transactions are not supported".to_string()));
        }
        if self.transaction.is_some() {
            return Err(GraphError::TransactionAlreadyOpen);
        }
        self.transaction = Some(TransactionBuffer::new());
        Ok(())
    }

    /// Close the open transaction, handing its events to the caller
    pub fn commit(&mut self) -> GraphResult<TransactionBuffer> {
        let buffer = self.transaction.take().ok_or(GraphError::NoOpenTransaction)?;
        self.commits += 1;
        debug!("Committed transaction {} with {} events", self.commits, buffer.len());
        Ok(buffer)
    }

    /// Undo everything recorded by the open transaction
    ///
    /// Manual index entries purged by a removal inside the transaction are
    /// not restored.
    pub fn rollback(&mut self) -> GraphResult<()> {
        let buffer = self.transaction.take().ok_or(GraphError::NoOpenTransaction)?;
        let undone = buffer.len();
        for event in buffer.into_iter().rev() {
            self.undo(event)?;
        }
        info!("Rolled back transaction with {} events", undone);
        Ok(())
    }

    fn undo(&mut self, event: GraphEvent) -> GraphResult<()> {
        match event {
            GraphEvent::VertexAdded { id } => {
                self.remove_vertex(&id)?;
            }
            GraphEvent::EdgeAdded { id, .. } => {
                self.remove_edge(&id)?;
            }
            GraphEvent::PropertyChanged {
                kind, id, key, old_value, ..
            } => match old_value {
                Some(old) => {
                    self.set_property(kind, &id, &key, old)?;
                }
                None => {
                    self.remove_property(kind, &id, &key)?;
                }
            },
            GraphEvent::VertexRemoved { id, properties } => {
                self.insert_vertex(id.clone());
                for (key, value) in properties {
                    self.set_property(ElementKind::Vertex, &id, &key, value)?;
                }
            }
            GraphEvent::EdgeRemoved {
                id,
                tail,
                head,
                label,
                properties,
            } => {
                self.insert_edge(id.clone(), tail, head, label);
                for (key, value) in properties {
                    self.set_property(ElementKind::Edge, &id, &key, value)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(kind: ElementKind, id: &ElementId) -> GraphError {
    match kind {
        ElementKind::Vertex => GraphError::VertexNotFound(id.clone()),
        ElementKind::Edge => GraphError::EdgeNotFound(id.clone()),
    }
}

fn vertex_views(vertices: &IndexMap<ElementId, Vertex>) -> impl Iterator<Item = ElementView<'_>> {
    vertices.values().map(|vertex| ElementView {
        id: vertex.id(),
        label: None,
        properties: vertex.properties(),
    })
}

fn edge_views(edges: &IndexMap<ElementId, Edge>) -> impl Iterator<Item = ElementView<'_>> {
    edges.values().map(|edge| ElementView {
        id: edge.id(),
        label: Some(edge.label()),
        properties: edge.properties(),
    })
}

/// Reject values the store's capabilities exclude
fn check_supported(features: &Features, kind: ElementKind, value: &PropertyValue) -> GraphResult<()> {
    let element_supported = match kind {
        ElementKind::Vertex => features.supports_vertex_properties,
        ElementKind::Edge => features.supports_edge_properties,
    };
    if !element_supported {
        return Err(GraphError::Config(format!("{} properties are not supported", kind)));
    }
    let value_supported = match value {
        PropertyValue::Null => true,
        PropertyValue::Boolean(_) => features.supports_boolean_property,
        PropertyValue::Integer(_) => features.supports_integer_property,
        PropertyValue::Long(_) => features.supports_long_property,
        PropertyValue::Float(_) => features.supports_float_property,
        PropertyValue::Double(_) => features.supports_double_property,
        PropertyValue::String(_) => features.supports_string_property,
        PropertyValue::List(_) => features.supports_list_property,
        PropertyValue::Map(_) => features.supports_map_property,
        PropertyValue::Bytes(_) => features.supports_bytes_property,
        PropertyValue::Serialized { .. } => features.supports_serialized_objects,
    };
    if value_supported {
        Ok(())
    } else {
        Err(GraphError::Config(format!(
            "{} property values are not supported",
            value.type_name()
        )))
    }
}

impl TransactionalGraph for GraphStore {
    fn features(&self) -> &Features {
        &self.config.features
    }

    fn start_transaction(&mut self) -> GraphResult<()> {
        GraphStore::start_transaction(self)
    }

    fn stop_transaction(&mut self, conclusion: Conclusion) -> GraphResult<()> {
        match conclusion {
            Conclusion::Success => self.commit().map(|_| ()),
            Conclusion::Failure => self.rollback(),
        }
    }

    fn add_vertex(&mut self, id: Option<ElementId>) -> GraphResult<ElementId> {
        GraphStore::add_vertex(self, id)
    }

    fn add_edge(
        &mut self,
        id: Option<ElementId>,
        tail: &ElementId,
        head: &ElementId,
        label: &str,
    ) -> GraphResult<ElementId> {
        GraphStore::add_edge(self, id, tail, head, label)
    }

    fn set_vertex_property(
        &mut self,
        vertex: &ElementId,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>> {
        self.set_property(ElementKind::Vertex, vertex, key, value)
    }

    fn set_edge_property(
        &mut self,
        edge: &ElementId,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>> {
        self.set_property(ElementKind::Edge, edge, key, value)
    }

    fn vertex_property(&self, vertex: &ElementId, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.vertices
            .get(vertex)
            .map(|v| v.property(key).cloned())
            .ok_or_else(|| GraphError::VertexNotFound(vertex.clone()))
    }

    fn contains_vertex(&self, vertex: &ElementId) -> bool {
        GraphStore::contains_vertex(self, vertex)
    }

    fn vertex_ids_with(&self, key: &str, value: &PropertyValue) -> Vec<ElementId> {
        self.vertices_with(key, value)
            .into_iter()
            .map(|vertex| vertex.id().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(a: &str, b: &str) -> (GraphStore, ElementId, ElementId) {
        let mut store = GraphStore::new();
        let a = store.add_vertex(Some(a.into())).unwrap();
        let b = store.add_vertex(Some(b.into())).unwrap();
        (store, a, b)
    }

    #[test]
    fn test_add_and_get_vertex() {
        let mut store = GraphStore::new();
        let id = store.add_vertex(Some("alice".into())).unwrap();

        assert_eq!(store.vertex_count(), 1);
        assert_eq!(store.get_vertex(&id).unwrap().id(), &ElementId::from("alice"));
        assert!(store.get_vertex(&ElementId::from("bob")).is_none());
    }

    #[test]
    fn test_duplicate_vertex_id_is_rejected() {
        let mut store = GraphStore::new();
        store.add_vertex(Some("a".into())).unwrap();
        assert_eq!(
            store.add_vertex(Some("a".into())),
            Err(GraphError::VertexAlreadyExists("a".into()))
        );
        assert_eq!(store.vertex_count(), 1);
    }

    #[test]
    fn test_generated_ids_skip_supplied_ones() {
        let mut store = GraphStore::new();
        let a = store.add_vertex(Some(ElementId::from(1i64))).unwrap();
        store.add_edge(Some(ElementId::from(2i64)), &a, &a, "self").unwrap();

        // 1 and 2 are taken by a vertex and an edge
        assert_eq!(store.add_vertex(None).unwrap(), ElementId::from(3i64));
        // empty text counts as no id
        assert_eq!(store.add_vertex(Some("".into())).unwrap(), ElementId::from(4i64));
    }

    #[test]
    fn test_id_space_exhaustion() {
        let mut store = GraphStore::new();
        store.next_id = Some(i64::MAX - 1);
        assert_eq!(store.add_vertex(None).unwrap(), ElementId::Long(i64::MAX - 1));
        assert_eq!(store.add_vertex(None).unwrap(), ElementId::Long(i64::MAX));
        assert_eq!(store.add_vertex(None), Err(GraphError::IdSpaceExhausted));
        assert_eq!(store.vertex_count(), 2);
    }

    #[test]
    fn test_ignores_supplied_ids() {
        let mut config = StoreConfig::in_memory();
        config.features.ignores_supplied_ids = true;
        let mut store = GraphStore::with_config(config);

        let id = store.add_vertex(Some("wanted".into())).unwrap();
        assert_eq!(id, ElementId::from(1i64));
    }

    #[test]
    fn test_add_edge_links_both_ends() {
        let (mut store, a, b) = store_with("a", "b");
        let e = store.add_edge(None, &a, &b, "knows").unwrap();

        let out = store.edges_of(&a, Direction::Out, &[]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id(), &e);
        assert_eq!(store.edges_of(&b, Direction::In, &["knows"]).unwrap().len(), 1);
        assert!(store.edges_of(&b, Direction::Out, &[]).unwrap().is_empty());
        assert!(store.edges_of(&a, Direction::Out, &["likes"]).unwrap().is_empty());
    }

    #[test]
    fn test_edge_validation() {
        let (mut store, a, _) = store_with("a", "b");
        let missing = ElementId::from("zzz");

        assert_eq!(store.add_edge(None, &a, &a, ""), Err(GraphError::EmptyLabel));
        assert_eq!(
            store.add_edge(None, &missing, &a, "knows"),
            Err(GraphError::VertexNotFound(missing.clone()))
        );
        assert_eq!(
            store.add_edge(None, &a, &missing, "knows"),
            Err(GraphError::VertexNotFound(missing))
        );
    }

    #[test]
    fn test_duplicate_edge_id_is_rejected() {
        let (mut store, a, b) = store_with("a", "b");
        store.add_edge(Some("e".into()), &a, &b, "knows").unwrap();
        assert_eq!(
            store.add_edge(Some("e".into()), &b, &a, "knows"),
            Err(GraphError::EdgeAlreadyExists("e".into()))
        );
    }

    #[test]
    fn test_self_loops_and_parallel_edges() {
        let (mut store, a, b) = store_with("a", "b");
        store.add_edge(None, &a, &a, "self").unwrap();
        store.add_edge(None, &a, &b, "knows").unwrap();
        store.add_edge(None, &a, &b, "knows").unwrap();

        assert_eq!(store.edge_count(), 3);
        assert_eq!(store.edges_of(&a, Direction::Both, &["self"]).unwrap().len(), 2);
        assert_eq!(store.neighbors(&a, Direction::Out, &["knows"]).unwrap().len(), 2);
    }

    #[test]
    fn test_capabilities_restrict_edges() {
        let mut config = StoreConfig::in_memory();
        config.features.supports_self_loops = false;
        config.features.supports_duplicate_edges = false;
        let mut store = GraphStore::with_config(config);
        let a = store.add_vertex(None).unwrap();
        let b = store.add_vertex(None).unwrap();

        assert_eq!(store.add_edge(None, &a, &a, "x"), Err(GraphError::SelfLoopsNotSupported));
        store.add_edge(None, &a, &b, "x").unwrap();
        assert_eq!(
            store.add_edge(None, &a, &b, "x"),
            Err(GraphError::DuplicateEdgesNotSupported)
        );
        // a different label is not a duplicate
        store.add_edge(None, &a, &b, "y").unwrap();
    }

    #[test]
    fn test_remove_edge() {
        let (mut store, a, b) = store_with("a", "b");
        let e = store.add_edge(None, &a, &b, "knows").unwrap();

        let removed = store.remove_edge(&e).unwrap();
        assert_eq!(removed.label(), "knows");
        assert_eq!(store.edge_count(), 0);
        assert!(store.edges_of(&a, Direction::Out, &[]).unwrap().is_empty());
        assert!(store.edges_of(&b, Direction::In, &[]).unwrap().is_empty());
        assert_eq!(store.remove_edge(&e).unwrap_err(), GraphError::EdgeNotFound(e));
    }

    #[test]
    fn test_remove_vertex_cascades() {
        let mut store = GraphStore::new();
        let a = store.add_vertex(None).unwrap();
        let b = store.add_vertex(None).unwrap();
        let c = store.add_vertex(None).unwrap();
        store.add_edge(None, &a, &b, "knows").unwrap();
        store.add_edge(None, &c, &a, "knows").unwrap();
        store.add_edge(None, &a, &a, "self").unwrap();
        store.add_edge(None, &b, &c, "knows").unwrap();

        store.remove_vertex(&a).unwrap();
        assert_eq!(store.vertex_count(), 2);
        assert_eq!(store.edge_count(), 1);
        assert!(store.edges_of(&b, Direction::In, &[]).unwrap().is_empty());
        assert_eq!(store.edges_of(&b, Direction::Out, &[]).unwrap().len(), 1);
    }

    #[test]
    fn test_properties_go_through_store() {
        let (mut store, a, _) = store_with("a", "b");
        assert_eq!(store.set_vertex_property(&a, "age", 30i64).unwrap(), None);
        assert_eq!(
            store.set_vertex_property(&a, "age", 31i64).unwrap(),
            Some(PropertyValue::from(30i64))
        );
        assert_eq!(
            store.set_vertex_property(&a, "id", 1i64),
            Err(GraphError::ReservedProperty("id".into()))
        );
        assert_eq!(
            store.remove_vertex_property(&a, "age").unwrap(),
            Some(PropertyValue::from(31i64))
        );
        assert_eq!(
            store.set_vertex_property(&ElementId::from("x"), "k", 1i64),
            Err(GraphError::VertexNotFound("x".into()))
        );
    }

    #[test]
    fn test_unsupported_value_type() {
        let mut config = StoreConfig::in_memory();
        config.features.supports_map_property = false;
        let mut store = GraphStore::with_config(config);
        let a = store.add_vertex(None).unwrap();

        let err = store
            .set_vertex_property(&a, "m", PropertyValue::Map(BTreeMap::new()))
            .unwrap_err();
        assert!(matches!(err, GraphError::Config(_)));
    }

    #[test]
    fn test_key_index_follows_updates() {
        let (mut store, a, b) = store_with("a", "b");
        store.set_vertex_property(&a, "city", "Paris").unwrap();
        assert!(store.create_key_index("city", ElementKind::Vertex).unwrap());

        // backfilled
        let index = store.key_index("city", ElementKind::Vertex).unwrap();
        assert_eq!(index.get("city", &"Paris".into()), vec![a.clone()]);

        store.set_vertex_property(&a, "city", "Rome").unwrap();
        store.set_vertex_property(&b, "city", "Rome").unwrap();
        let index = store.key_index("city", ElementKind::Vertex).unwrap();
        assert_eq!(index.count("city", &"Paris".into()), 0);
        assert_eq!(index.count("city", &"Rome".into()), 2);
        assert_eq!(store.vertices_with("city", &"Rome".into()).len(), 2);

        store.remove_vertex(&a).unwrap();
        let index = store.key_index("city", ElementKind::Vertex).unwrap();
        assert_eq!(index.get("city", &"Rome".into()), vec![b]);

        assert!(store.drop_key_index("city", ElementKind::Vertex).unwrap());
        assert!(store.indexed_keys(ElementKind::Vertex).unwrap().is_empty());
    }

    #[test]
    fn test_key_index_on_unsupported_kind() {
        let mut config = StoreConfig::in_memory();
        config.features.supports_edge_key_index = false;
        let mut store = GraphStore::with_config(config);

        assert_eq!(
            store.create_key_index("w", ElementKind::Edge),
            Err(GraphError::UnindexableKind(ElementKind::Edge))
        );
        assert_eq!(
            store.indexed_keys(ElementKind::Edge),
            Err(GraphError::UnindexableKind(ElementKind::Edge))
        );
        assert_eq!(
            store.create_key_index("id", ElementKind::Vertex),
            Err(GraphError::ReservedProperty("id".into()))
        );
    }

    #[test]
    fn test_automatic_edge_index_sees_labels() {
        let (mut store, a, b) = store_with("a", "b");
        let e1 = store.add_edge(None, &a, &b, "knows").unwrap();
        store
            .create_automatic_index("edges", ElementKind::Edge, AutoKeys::All)
            .unwrap();
        let e2 = store.add_edge(None, &b, &a, "knows").unwrap();

        let index = store.get_index("edges", ElementKind::Edge).unwrap().unwrap();
        let found = index.get(LABEL_KEY, &"knows".into());
        assert_eq!(found, vec![e1, e2]);
    }

    #[test]
    fn test_manual_index_is_independent_of_properties() {
        let (mut store, a, _) = store_with("a", "b");
        store.create_index("people", ElementKind::Vertex).unwrap();
        store.set_vertex_property(&a, "name", "Alice").unwrap();
        store
            .index_mut("people", ElementKind::Vertex)
            .unwrap()
            .unwrap()
            .put("name", "Someone else".into(), a.clone());

        let index = store.get_index("people", ElementKind::Vertex).unwrap().unwrap();
        assert_eq!(index.count("name", &"Alice".into()), 0);
        assert_eq!(index.get("name", &"Someone else".into()), vec![a.clone()]);

        store.remove_vertex(&a).unwrap();
        let index = store.get_index("people", ElementKind::Vertex).unwrap().unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_transaction_discipline() {
        let mut store = GraphStore::new();
        assert_eq!(store.commit().unwrap_err(), GraphError::NoOpenTransaction);
        store.start_transaction().unwrap();
        assert_eq!(store.start_transaction(), Err(GraphError::TransactionAlreadyOpen));

        let a = store.add_vertex(None).unwrap();
        store.set_vertex_property(&a, "k", 1i64).unwrap();
        let buffer = store.commit().unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(store.commits(), 1);
        assert!(!store.in_transaction());
    }

    #[test]
    fn test_rollback_restores_state() {
        let (mut store, a, b) = store_with("a", "b");
        store.set_vertex_property(&a, "name", "Alice").unwrap();
        let e = store.add_edge(Some("e".into()), &a, &b, "knows").unwrap();
        store.set_edge_property(&e, "weight", 0.5f64).unwrap();
        store.create_key_index("name", ElementKind::Vertex).unwrap();

        store.start_transaction().unwrap();
        store.set_vertex_property(&a, "name", "Changed").unwrap();
        let c = store.add_vertex(None).unwrap();
        store.add_edge(None, &c, &a, "likes").unwrap();
        store.remove_vertex(&b).unwrap();
        store.rollback().unwrap();

        assert_eq!(store.vertex_count(), 2);
        assert_eq!(store.edge_count(), 1);
        assert!(store.get_vertex(&c).is_none());
        let edge = store.get_edge(&e).unwrap();
        assert_eq!(edge.property("weight"), Some(&PropertyValue::from(0.5f64)));
        assert_eq!(store.edges_of(&b, Direction::In, &["knows"]).unwrap().len(), 1);
        assert_eq!(store.vertices_with("name", &"Alice".into()).len(), 1);
        assert!(store.vertices_with("name", &"Changed".into()).is_empty());
    }

    #[test]
    fn test_snapshot_ids_allow_mutation() {
        let mut store = GraphStore::new();
        for _ in 0..5 {
            store.add_vertex(None).unwrap();
        }
        for id in store.vertex_ids() {
            store.remove_vertex(&id).unwrap();
        }
        assert_eq!(store.vertex_count(), 0);
    }

    #[test]
    fn test_clear() {
        let (mut store, a, b) = store_with("a", "b");
        store.add_edge(None, &a, &b, "knows").unwrap();
        store.create_index("idx", ElementKind::Vertex).unwrap();

        store.clear();
        assert_eq!(store.vertex_count(), 0);
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.indices().count(), 0);
        assert_eq!(store.add_vertex(None).unwrap(), ElementId::from(1i64));
    }

    #[test]
    fn test_statistics() {
        let (mut store, a, b) = store_with("a", "b");
        store.add_edge(None, &a, &b, "knows").unwrap();
        store.add_edge(None, &b, &a, "knows").unwrap();
        store.add_edge(None, &a, &a, "self").unwrap();

        let stats = store.statistics();
        assert_eq!(stats.vertex_count, 2);
        assert_eq!(stats.edge_count, 3);
        assert_eq!(stats.edge_labels.get("knows"), Some(&2));
    }
}
