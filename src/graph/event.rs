//! Graph mutation events
//!
//! While a transaction is open the store records every mutation as a
//! [`GraphEvent`] in an explicit [`TransactionBuffer`]. Committing hands the
//! buffer to the caller (for listeners to flush); rolling back replays it in
//! reverse.

use super::edge::Edge;
use super::property::{PropertyMap, PropertyValue};
use super::types::{ElementId, ElementKind};

#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    VertexAdded {
        id: ElementId,
    },
    EdgeAdded {
        id: ElementId,
        tail: ElementId,
        head: ElementId,
        label: String,
    },
    PropertyChanged {
        kind: ElementKind,
        id: ElementId,
        key: String,
        old_value: Option<PropertyValue>,
        new_value: Option<PropertyValue>,
    },
    /// Emitted after every incident edge has been removed
    VertexRemoved {
        id: ElementId,
        properties: PropertyMap,
    },
    EdgeRemoved {
        id: ElementId,
        tail: ElementId,
        head: ElementId,
        label: String,
        properties: PropertyMap,
    },
}

impl GraphEvent {
    pub(crate) fn edge_removed(edge: &Edge) -> Self {
        GraphEvent::EdgeRemoved {
            id: edge.id().clone(),
            tail: edge.tail().clone(),
            head: edge.head().clone(),
            label: edge.label().to_string(),
            properties: edge.properties().as_map().clone(),
        }
    }
}

/// Mutations recorded during one transaction, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionBuffer {
    events: Vec<GraphEvent>,
}

impl TransactionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, event: GraphEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GraphEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drain the events for delivery to listeners
    pub fn flush(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }
}

impl IntoIterator for TransactionBuffer {
    type Item = GraphEvent;
    type IntoIter = std::vec::IntoIter<GraphEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_flush() {
        let mut buffer = TransactionBuffer::new();
        buffer.push(GraphEvent::VertexAdded { id: ElementId::from(1i64) });
        assert_eq!(buffer.len(), 1);

        let events = buffer.flush();
        assert_eq!(events.len(), 1);
        assert!(buffer.is_empty());
    }
}
