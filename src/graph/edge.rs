//! Edge implementation for the property graph

use super::property::{Properties, PropertyValue};
use super::types::{ElementId, ElementKind};

/// A directed, labelled edge
///
/// The label and both endpoints are fixed at creation. Self loops and
/// parallel edges are ordinary edges as far as this type is concerned; the
/// store decides whether to admit them.
#[derive(Debug, Clone)]
pub struct Edge {
    id: ElementId,
    label: String,
    /// Vertex the edge goes out of
    tail: ElementId,
    /// Vertex the edge goes into
    head: ElementId,
    properties: Properties,
}

impl Edge {
    pub(crate) fn new(id: ElementId, tail: ElementId, head: ElementId, label: impl Into<String>) -> Self {
        Edge {
            id,
            label: label.into(),
            tail,
            head,
            properties: Properties::new(ElementKind::Edge),
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn tail(&self) -> &ElementId {
        &self.tail
    }

    pub fn head(&self) -> &ElementId {
        &self.head
    }

    pub fn is_self_loop(&self) -> bool {
        self.tail == self.head
    }

    /// The endpoint opposite to `vertex`, if `vertex` is an endpoint at all
    pub fn other_end(&self, vertex: &ElementId) -> Option<&ElementId> {
        if &self.tail == vertex {
            Some(&self.head)
        } else if &self.head == vertex {
            Some(&self.tail)
        } else {
            None
        }
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
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::property::{Detached, LABEL_KEY};
    use crate::graph::GraphError;

    #[test]
    fn test_create_edge() {
        let edge = Edge::new(
            ElementId::from("e1"),
            ElementId::from("a"),
            ElementId::from("b"),
            "knows",
        );

        assert_eq!(edge.id(), &ElementId::from("e1"));
        assert_eq!(edge.tail(), &ElementId::from("a"));
        assert_eq!(edge.head(), &ElementId::from("b"));
        assert_eq!(edge.label(), "knows");
        assert!(!edge.is_self_loop());
    }

    #[test]
    fn test_other_end() {
        let a = ElementId::from(1i64);
        let b = ElementId::from(2i64);
        let edge = Edge::new(ElementId::from(3i64), a.clone(), b.clone(), "links");

        assert_eq!(edge.other_end(&a), Some(&b));
        assert_eq!(edge.other_end(&b), Some(&a));
        assert_eq!(edge.other_end(&ElementId::from(9i64)), None);
    }

    #[test]
    fn test_label_is_not_a_property() {
        let mut edge = Edge::new(
            ElementId::from(1i64),
            ElementId::from(2i64),
            ElementId::from(2i64),
            "self",
        );
        assert!(edge.is_self_loop());

        let result = edge.properties_mut().set(LABEL_KEY, "other".into(), &mut Detached);
        assert_eq!(result, Err(GraphError::ReservedProperty("label".into())));
        assert_eq!(edge.property(LABEL_KEY), None);
        assert_eq!(edge.label(), "self");
    }

    #[test]
    fn test_edge_properties() {
        let mut edge = Edge::new(
            ElementId::from(1i64),
            ElementId::from(2i64),
            ElementId::from(3i64),
            "knows",
        );
        edge.properties_mut().set("weight", 0.5f64.into(), &mut Detached).unwrap();
        assert_eq!(edge.property("weight").unwrap().as_double(), Some(0.5));
        assert_eq!(edge.property_keys(), vec!["weight"]);
    }
}
