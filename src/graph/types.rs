//! Core type definitions for the graph store

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a vertex or an edge
///
/// Identifiers are opaque to the store and compared by value. Generated
/// identifiers are always `Long`; callers may supply either form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(untagged)]
pub enum ElementId {
    Long(i64),
    Text(String),
}

impl ElementId {
    /// An empty text identifier means "no identifier supplied"
    pub fn is_empty(&self) -> bool {
        matches!(self, ElementId::Text(s) if s.is_empty())
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            ElementId::Long(n) => Some(*n),
            ElementId::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ElementId::Text(s) => Some(s),
            ElementId::Long(_) => None,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Long(n) => write!(f, "{}", n),
            ElementId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ElementId {
    fn from(id: i64) -> Self {
        ElementId::Long(id)
    }
}

impl From<i32> for ElementId {
    fn from(id: i32) -> Self {
        ElementId::Long(id as i64)
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        ElementId::Text(s)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        ElementId::Text(s.to_string())
    }
}

/// The two concrete element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Vertex,
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Vertex => write!(f, "vertex"),
            ElementKind::Edge => write!(f, "edge"),
        }
    }
}

/// Traversal direction relative to a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Edges whose tail is the vertex
    Out,
    /// Edges whose head is the vertex
    In,
    Both,
}

impl Direction {
    pub fn includes_out(self) -> bool {
        matches!(self, Direction::Out | Direction::Both)
    }

    pub fn includes_in(self) -> bool {
        matches!(self, Direction::In | Direction::Both)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_id_conversions() {
        let id: ElementId = 42i64.into();
        assert_eq!(id.as_long(), Some(42));
        assert_eq!(format!("{}", id), "42");

        let id2: ElementId = "alice".into();
        assert_eq!(id2.as_text(), Some("alice"));
        assert_eq!(id2.as_long(), None);
    }

    #[test]
    fn test_empty_id() {
        assert!(ElementId::from("").is_empty());
        assert!(!ElementId::from("a").is_empty());
        assert!(!ElementId::from(0i64).is_empty());
    }

    #[test]
    fn test_id_equality_is_by_value_and_form() {
        assert_eq!(ElementId::from(1i64), ElementId::from(1i32));
        assert_ne!(ElementId::from(1i64), ElementId::from("1"));
    }

    #[test]
    fn test_direction() {
        assert!(Direction::Both.includes_out());
        assert!(Direction::Both.includes_in());
        assert!(!Direction::Out.includes_in());
        assert!(!Direction::In.includes_out());
    }
}
