//! Vertex implementation for the property graph
//!
//! A vertex keeps its incident edges in two adjacency maps, one per
//! direction, each bucketed by edge label so label-filtered traversal does
//! not have to look at unrelated edges.

use super::property::{Properties, PropertyValue};
use super::types::{Direction, ElementId, ElementKind};
use indexmap::{IndexMap, IndexSet};

/// Edge ids grouped by label
pub(crate) type Adjacency = IndexMap<String, IndexSet<ElementId>>;

/// Which end of an edge a vertex is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum End {
    /// The vertex is the edge's tail
    Out,
    /// The vertex is the edge's head
    In,
}

/// A vertex in the property graph
#[derive(Debug, Clone)]
pub struct Vertex {
    id: ElementId,
    properties: Properties,
    /// Edges whose tail is this vertex
    out_edges: Adjacency,
    /// Edges whose head is this vertex
    in_edges: Adjacency,
}

impl Vertex {
    pub(crate) fn new(id: ElementId) -> Self {
        Vertex {
            id,
            properties: Properties::new(ElementKind::Vertex),
            out_edges: Adjacency::new(),
            in_edges: Adjacency::new(),
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn property_keys(&self) -> Vec<&str> {
        self.properties.keys().collect()
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub(crate) fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    /// Incident edge ids in the given direction, optionally restricted to labels
    ///
    /// An empty `labels` slice selects every label. A self loop is reported
    /// once for `Out`, once for `In` and twice for `Both`.
    pub fn edge_ids(&self, direction: Direction, labels: &[&str]) -> Vec<ElementId> {
        let mut ids = Vec::new();
        if direction.includes_out() {
            collect(&self.out_edges, labels, &mut ids);
        }
        if direction.includes_in() {
            collect(&self.in_edges, labels, &mut ids);
        }
        ids
    }

    pub fn degree(&self, direction: Direction) -> usize {
        let count = |adj: &Adjacency| adj.values().map(IndexSet::len).sum::<usize>();
        let mut total = 0;
        if direction.includes_out() {
            total += count(&self.out_edges);
        }
        if direction.includes_in() {
            total += count(&self.in_edges);
        }
        total
    }

    /// Labels with at least one edge in the given direction
    pub fn labels(&self, direction: Direction) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        if direction.includes_out() {
            labels.extend(self.out_edges.keys().map(String::as_str));
        }
        if direction.includes_in() {
            for label in self.in_edges.keys() {
                if !labels.contains(&label.as_str()) {
                    labels.push(label.as_str());
                }
            }
        }
        labels
    }

    fn adjacency_mut(&mut self, end: End) -> &mut Adjacency {
        match end {
            End::Out => &mut self.out_edges,
            End::In => &mut self.in_edges,
        }
    }

    pub(crate) fn link(&mut self, end: End, label: &str, edge: ElementId) {
        let adj = self.adjacency_mut(end);
        adj.entry(label.to_string()).or_default().insert(edge);
    }

    /// Detach an edge id; label buckets are dropped once empty
    pub(crate) fn unlink(&mut self, end: End, label: &str, edge: &ElementId) {
        let adj = self.adjacency_mut(end);
        if let Some(bucket) = adj.get_mut(label) {
            bucket.shift_remove(edge);
            if bucket.is_empty() {
                adj.shift_remove(label);
            }
        }
    }
}

fn collect(adj: &Adjacency, labels: &[&str], out: &mut Vec<ElementId>) {
    if labels.is_empty() {
        out.extend(adj.values().flatten().cloned());
    } else {
        for label in labels {
            if let Some(bucket) = adj.get(*label) {
                out.extend(bucket.iter().cloned());
            }
        }
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Vertex {}

impl std::hash::Hash for Vertex {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
