//! Manager for property indices
//!
//! Owns the named (manual and automatic) indices and the per-key indices of
//! a store, and routes property mutations into the automatic ones.

use super::property_index::{AutoKeys, ElementView, IndexKind, PropertyIndex};
use crate::graph::property::{PropertyObserver, LABEL_KEY};
use crate::graph::{ElementId, ElementKind, GraphError, GraphResult, PropertyValue};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Manager for all indices of one store
#[derive(Debug, Default)]
pub struct IndexManager {
    /// Manual and automatic indices by name
    named: IndexMap<String, PropertyIndex>,
    /// Key indices over vertices, by key
    vertex_keys: IndexMap<String, PropertyIndex>,
    /// Key indices over edges, by key
    edge_keys: IndexMap<String, PropertyIndex>,
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty manual index
    pub fn create_index(&mut self, name: &str, element_kind: ElementKind) -> GraphResult<&mut PropertyIndex> {
        self.insert_named(PropertyIndex::new(name, element_kind, IndexKind::Manual))
    }

    /// Create an automatic index and backfill it from existing elements
    ///
    /// The index is only registered once every element has been scanned.
    pub fn create_automatic_index<'a, I>(
        &mut self,
        name: &str,
        element_kind: ElementKind,
        keys: AutoKeys,
        elements: I,
    ) -> GraphResult<&PropertyIndex>
    where
        I: IntoIterator<Item = ElementView<'a>>,
    {
        if self.named.contains_key(name) {
            return Err(GraphError::IndexAlreadyExists(name.to_string()));
        }
        let mut index = PropertyIndex::new(name, element_kind, IndexKind::Automatic(keys));
        let backfilled = backfill(&mut index, elements);
        info!(
            "Created automatic {} index '{}' with {} entries",
            element_kind, name, backfilled
        );
        self.insert_named(index).map(|index| &*index)
    }

    fn insert_named(&mut self, index: PropertyIndex) -> GraphResult<&mut PropertyIndex> {
        let name = index.name().to_string();
        if self.named.contains_key(&name) {
            return Err(GraphError::IndexAlreadyExists(name));
        }
        Ok(self.named.entry(name).or_insert(index))
    }

    /// Look up a named index
    ///
    /// An unknown name is `None`; a name bound to the other element kind is
    /// an error.
    pub fn get_index(&self, name: &str, element_kind: ElementKind) -> GraphResult<Option<&PropertyIndex>> {
        match self.named.get(name) {
            None => Ok(None),
            Some(index) if index.element_kind() == element_kind => Ok(Some(index)),
            Some(index) => Err(GraphError::IndexKindMismatch {
                name: name.to_string(),
                expected: element_kind,
                actual: index.element_kind(),
            }),
        }
    }

    /// Mutable access to a manual index
    ///
    /// Automatic indices are maintained by the store and cannot be edited.
    pub fn manual_index_mut(
        &mut self,
        name: &str,
        element_kind: ElementKind,
    ) -> GraphResult<Option<&mut PropertyIndex>> {
        match self.named.get_mut(name) {
            None => Ok(None),
            Some(index) if index.element_kind() != element_kind => Err(GraphError::IndexKindMismatch {
                name: name.to_string(),
                expected: element_kind,
                actual: index.element_kind(),
            }),
            Some(index) if *index.kind() != IndexKind::Manual => Err(GraphError::Config(format!(
                "index '{}' is maintained automatically",
                name
            ))),
            Some(index) => Ok(Some(index)),
        }
    }

    pub fn drop_index(&mut self, name: &str) -> bool {
        let dropped = self.named.shift_remove(name).is_some();
        if dropped {
            info!("Dropped index '{}'", name);
        }
        dropped
    }

    /// Named indices in creation order
    pub fn indices(&self) -> impl Iterator<Item = &PropertyIndex> {
        self.named.values()
    }

    /// Create a key index and backfill it; `false` if it already existed
    pub fn create_key_index<'a, I>(&mut self, key: &str, element_kind: ElementKind, elements: I) -> bool
    where
        I: IntoIterator<Item = ElementView<'a>>,
    {
        let keys = self.key_indices_mut(element_kind);
        if keys.contains_key(key) {
            return false;
        }
        let mut index = PropertyIndex::new(key, element_kind, IndexKind::Key(key.to_string()));
        let backfilled = backfill(&mut index, elements);
        info!(
            "Created {} key index on '{}' with {} entries",
            element_kind, key, backfilled
        );
        keys.insert(key.to_string(), index);
        true
    }

    pub fn drop_key_index(&mut self, key: &str, element_kind: ElementKind) -> bool {
        let dropped = self.key_indices_mut(element_kind).shift_remove(key).is_some();
        if dropped {
            info!("Dropped {} key index on '{}'", element_kind, key);
        }
        dropped
    }

    pub fn key_index(&self, key: &str, element_kind: ElementKind) -> Option<&PropertyIndex> {
        self.key_indices(element_kind).get(key)
    }

    pub fn indexed_keys(&self, element_kind: ElementKind) -> BTreeSet<String> {
        self.key_indices(element_kind).keys().cloned().collect()
    }

    fn key_indices(&self, element_kind: ElementKind) -> &IndexMap<String, PropertyIndex> {
        match element_kind {
            ElementKind::Vertex => &self.vertex_keys,
            ElementKind::Edge => &self.edge_keys,
        }
    }

    fn key_indices_mut(&mut self, element_kind: ElementKind) -> &mut IndexMap<String, PropertyIndex> {
        match element_kind {
            ElementKind::Vertex => &mut self.vertex_keys,
            ElementKind::Edge => &mut self.edge_keys,
        }
    }

    /// Automatic and key indices over `element_kind`
    fn automatic_mut(&mut self, element_kind: ElementKind) -> impl Iterator<Item = &mut PropertyIndex> + '_ {
        let keyed = match element_kind {
            ElementKind::Vertex => &mut self.vertex_keys,
            ElementKind::Edge => &mut self.edge_keys,
        };
        self.named
            .values_mut()
            .filter(move |index| {
                index.element_kind() == element_kind && matches!(index.kind(), IndexKind::Automatic(_))
            })
            .chain(keyed.values_mut())
    }

    /// Index a freshly created element (edge labels count as a tracked key)
    pub fn element_added(&mut self, element: ElementView<'_>, element_kind: ElementKind) {
        for index in self.automatic_mut(element_kind) {
            index.index_element(element);
        }
    }

    /// Purge an element from every index of its kind, manual ones included
    ///
    /// Cost is linear in the total size of those indices.
    pub fn remove_element(&mut self, element_kind: ElementKind, element: &ElementId) -> usize {
        let keyed = match element_kind {
            ElementKind::Vertex => &mut self.vertex_keys,
            ElementKind::Edge => &mut self.edge_keys,
        };
        let removed: usize = self
            .named
            .values_mut()
            .filter(|index| index.element_kind() == element_kind)
            .chain(keyed.values_mut())
            .map(|index| index.remove_element(element))
            .sum();
        debug!("Purged {} {} from {} index entries", element_kind, element, removed);
        removed
    }

    /// Observer that mirrors one element's property changes into the indices
    pub fn notifier(&mut self, element_kind: ElementKind, element: &ElementId) -> IndexNotifier<'_> {
        IndexNotifier {
            manager: self,
            element_kind,
            element: element.clone(),
        }
    }

    pub fn clear(&mut self) {
        self.named.clear();
        self.vertex_keys.clear();
        self.edge_keys.clear();
    }
}

fn backfill<'a, I>(index: &mut PropertyIndex, elements: I) -> usize
where
    I: IntoIterator<Item = ElementView<'a>>,
{
    elements.into_iter().map(|element| index.index_element(element)).sum()
}

/// [`PropertyObserver`] bound to one element
///
/// Each change is applied as one remove of the old value followed by one put
/// of the new value, inside the property mutation call itself.
pub struct IndexNotifier<'a> {
    manager: &'a mut IndexManager,
    element_kind: ElementKind,
    element: ElementId,
}

impl PropertyObserver for IndexNotifier<'_> {
    fn property_changed(&mut self, key: &str, old: Option<&PropertyValue>, new: Option<&PropertyValue>) {
        debug_assert!(
            !(self.element_kind == ElementKind::Edge && key == LABEL_KEY),
            "edge labels are immutable"
        );
        let element = &self.element;
        for index in self.manager.automatic_mut(self.element_kind) {
            if !index.tracks(key) {
                continue;
            }
            if let Some(old) = old {
                index.remove(key, old, element);
            }
            if let Some(new) = new {
                index.put(key, new.clone(), element.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::property::Detached;
    use crate::graph::Properties;

    fn props(pairs: &[(&str, PropertyValue)]) -> Properties {
        let mut props = Properties::new(ElementKind::Vertex);
        for (key, value) in pairs {
            props.set(key, value.clone(), &mut Detached).unwrap();
        }
        props
    }

    #[test]
    fn test_create_and_get_manual_index() {
        let mut manager = IndexManager::new();
        manager.create_index("people", ElementKind::Vertex).unwrap();

        assert!(manager.get_index("people", ElementKind::Vertex).unwrap().is_some());
        assert!(manager.get_index("nobody", ElementKind::Vertex).unwrap().is_none());
        assert_eq!(
            manager.create_index("people", ElementKind::Edge).unwrap_err(),
            GraphError::IndexAlreadyExists("people".into())
        );
        assert!(matches!(
            manager.get_index("people", ElementKind::Edge),
            Err(GraphError::IndexKindMismatch { .. })
        ));
    }

    #[test]
    fn test_automatic_index_is_not_manually_editable() {
        let mut manager = IndexManager::new();
        manager
            .create_automatic_index("auto", ElementKind::Vertex, AutoKeys::All, Vec::new())
            .unwrap();
        assert!(manager.manual_index_mut("auto", ElementKind::Vertex).is_err());
    }

    #[test]
    fn test_key_index_backfill() {
        let mut manager = IndexManager::new();
        let a = ElementId::from("a");
        let b = ElementId::from("b");
        let pa = props(&[("name", "x".into())]);
        let pb = props(&[("other", 1i64.into())]);
        let views = vec![
            ElementView { id: &a, label: None, properties: &pa },
            ElementView { id: &b, label: None, properties: &pb },
        ];

        assert!(manager.create_key_index("name", ElementKind::Vertex, views));
        assert!(!manager.create_key_index("name", ElementKind::Vertex, Vec::new()));

        let index = manager.key_index("name", ElementKind::Vertex).unwrap();
        assert_eq!(index.get("name", &"x".into()), vec![a]);
        assert_eq!(
            manager.indexed_keys(ElementKind::Vertex).into_iter().collect::<Vec<_>>(),
            vec!["name".to_string()]
        );
        assert!(manager.indexed_keys(ElementKind::Edge).is_empty());
    }

    #[test]
    fn test_notifier_moves_entry() {
        let mut manager = IndexManager::new();
        manager.create_key_index("name", ElementKind::Vertex, Vec::new());
        let id = ElementId::from(1i64);

        let mut vertex = props(&[]);
        vertex
            .set("name", "old".into(), &mut manager.notifier(ElementKind::Vertex, &id))
            .unwrap();
        vertex
            .set("name", "new".into(), &mut manager.notifier(ElementKind::Vertex, &id))
            .unwrap();

        let index = manager.key_index("name", ElementKind::Vertex).unwrap();
        assert_eq!(index.count("name", &"old".into()), 0);
        assert_eq!(index.get("name", &"new".into()), vec![id.clone()]);

        vertex
            .remove("name", &mut manager.notifier(ElementKind::Vertex, &id))
            .unwrap();
        assert!(manager.key_index("name", ElementKind::Vertex).unwrap().is_empty());
    }

    #[test]
    fn test_manual_index_ignores_notifications() {
        let mut manager = IndexManager::new();
        manager.create_index("manual", ElementKind::Vertex).unwrap();
        let id = ElementId::from(1i64);
        let mut vertex = props(&[]);
        vertex
            .set("name", "x".into(), &mut manager.notifier(ElementKind::Vertex, &id))
            .unwrap();

        let index = manager.get_index("manual", ElementKind::Vertex).unwrap().unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_element_covers_all_kinds_of_index() {
        let mut manager = IndexManager::new();
        let id = ElementId::from(5i64);
        manager
            .create_index("manual", ElementKind::Edge)
            .unwrap()
            .put("k", "v".into(), id.clone());
        manager.create_key_index("k", ElementKind::Edge, Vec::new());
        manager
            .create_automatic_index("auto", ElementKind::Edge, AutoKeys::All, Vec::new())
            .unwrap();
        let edge_props = Properties::new(ElementKind::Edge);
        manager.element_added(
            ElementView { id: &id, label: Some("knows"), properties: &edge_props },
            ElementKind::Edge,
        );

        // manual + automatic label entry
        assert_eq!(manager.remove_element(ElementKind::Edge, &id), 2);
        assert_eq!(manager.remove_element(ElementKind::Edge, &id), 0);
    }
}
