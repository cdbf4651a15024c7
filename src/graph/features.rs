//! Store capabilities and configuration
//!
//! [`Features`] is the capability descriptor collaborators consult to adapt
//! their behaviour. It is plain data: every flag is a mandatory field, so a
//! descriptor with an unset flag cannot be constructed (or deserialized).

use super::error::{GraphError, GraphResult};
use super::types::ElementKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Capability descriptor of a graph store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Features {
    /// More than one edge with the same label between the same ordered pair
    pub supports_duplicate_edges: bool,
    pub supports_self_loops: bool,
    pub supports_serialized_objects: bool,
    pub supports_boolean_property: bool,
    pub supports_integer_property: bool,
    pub supports_long_property: bool,
    pub supports_float_property: bool,
    pub supports_double_property: bool,
    pub supports_string_property: bool,
    pub supports_list_property: bool,
    pub supports_map_property: bool,
    pub supports_bytes_property: bool,
    /// Supplied identifiers are replaced by generated ones
    pub ignores_supplied_ids: bool,
    pub is_persistent: bool,
    /// The store decorates another store
    pub is_wrapper: bool,
    pub supports_indices: bool,
    pub supports_vertex_index: bool,
    pub supports_edge_index: bool,
    pub supports_key_indices: bool,
    pub supports_vertex_key_index: bool,
    pub supports_edge_key_index: bool,
    pub supports_vertex_iteration: bool,
    pub supports_edge_iteration: bool,
    pub supports_edge_retrieval: bool,
    pub supports_vertex_properties: bool,
    pub supports_edge_properties: bool,
    pub supports_transactions: bool,
    pub supports_threaded_transactions: bool,
}

impl Features {
    /// Capabilities of the in-memory [`GraphStore`](super::GraphStore)
    pub const fn in_memory() -> Self {
        Features {
            supports_duplicate_edges: true,
            supports_self_loops: true,
            supports_serialized_objects: true,
            supports_boolean_property: true,
            supports_integer_property: true,
            supports_long_property: true,
            supports_float_property: true,
            supports_double_property: true,
            supports_string_property: true,
            supports_list_property: true,
            supports_map_property: true,
            supports_bytes_property: true,
            ignores_supplied_ids: false,
            is_persistent: false,
            is_wrapper: false,
            supports_indices: true,
            supports_vertex_index: true,
            supports_edge_index: true,
            supports_key_indices: true,
            supports_vertex_key_index: true,
            supports_edge_key_index: true,
            supports_vertex_iteration: true,
            supports_edge_iteration: true,
            supports_edge_retrieval: true,
            supports_vertex_properties: true,
            supports_edge_properties: true,
            supports_transactions: true,
            supports_threaded_transactions: false,
        }
    }

    /// Whether manual/automatic indices may be built over `kind`
    pub fn supports_index_over(&self, kind: ElementKind) -> bool {
        self.supports_indices
            && match kind {
                ElementKind::Vertex => self.supports_vertex_index,
                ElementKind::Edge => self.supports_edge_index,
            }
    }

    /// Whether key indices may be built over `kind`
    pub fn supports_key_index_over(&self, kind: ElementKind) -> bool {
        self.supports_key_indices
            && match kind {
                ElementKind::Vertex => self.supports_vertex_key_index,
                ElementKind::Edge => self.supports_edge_key_index,
            }
    }
}

/// Construction-time configuration of a [`GraphStore`](super::GraphStore)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub features: Features,
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        StoreConfig {
            features: Features::in_memory(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> GraphResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| GraphError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> GraphResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GraphError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trip() {
        let config = StoreConfig::in_memory();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert_eq!(StoreConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_missing_flag_is_rejected() {
        let yaml = "features:\n  supports_self_loops: true\n";
        let err = StoreConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, GraphError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.yaml");
        let mut config = StoreConfig::in_memory();
        config.features.supports_self_loops = false;
        std::fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

        let loaded = StoreConfig::load(&path).unwrap();
        assert!(!loaded.features.supports_self_loops);
        assert!(StoreConfig::load(dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_index_support_checks() {
        let mut features = Features::in_memory();
        assert!(features.supports_key_index_over(ElementKind::Edge));
        features.supports_edge_key_index = false;
        assert!(!features.supports_key_index_over(ElementKind::Edge));
        assert!(features.supports_key_index_over(ElementKind::Vertex));
    }
}
