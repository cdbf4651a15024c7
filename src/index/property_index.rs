//! Ordered multimap index from (key, value) to elements
//!
//! Buckets are created lazily on `put` and dropped as soon as they become
//! empty, so an index never holds more buckets than live entries.

use crate::graph::property::LABEL_KEY;
use crate::graph::{ElementId, ElementKind, Properties, PropertyValue};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::RangeBounds;

/// Keys an automatic index keeps in sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoKeys {
    All,
    Subset(BTreeSet<String>),
}

impl AutoKeys {
    pub fn subset<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AutoKeys::Subset(keys.into_iter().map(Into::into).collect())
    }
}

/// How an index is populated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    /// Populated only through explicit `put`/`remove` calls
    Manual,
    /// Follows the live properties of every element of its kind
    Automatic(AutoKeys),
    /// Single-key automatic index used for equality lookups
    Key(String),
}

/// Borrowed view of an element, used to (re)index it
#[derive(Debug, Clone, Copy)]
pub struct ElementView<'a> {
    pub id: &'a ElementId,
    /// Edge label; `None` for vertices
    pub label: Option<&'a str>,
    pub properties: &'a Properties,
}

type ValueBuckets = BTreeMap<PropertyValue, IndexSet<ElementId>>;

/// Index for elements of one kind
#[derive(Debug, Clone)]
pub struct PropertyIndex {
    name: String,
    element_kind: ElementKind,
    kind: IndexKind,
    /// key -> value -> elements
    buckets: HashMap<String, ValueBuckets>,
}

impl PropertyIndex {
    pub fn new(name: impl Into<String>, element_kind: ElementKind, kind: IndexKind) -> Self {
        Self {
            name: name.into(),
            element_kind,
            kind,
            buckets: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element_kind(&self) -> ElementKind {
        self.element_kind
    }

    pub fn kind(&self) -> &IndexKind {
        &self.kind
    }

    /// Whether mutations of `key` must be mirrored into this index
    pub fn tracks(&self, key: &str) -> bool {
        match &self.kind {
            IndexKind::Manual => false,
            IndexKind::Automatic(AutoKeys::All) => true,
            IndexKind::Automatic(AutoKeys::Subset(keys)) => keys.contains(key),
            IndexKind::Key(tracked) => tracked == key,
        }
    }

    pub fn put(&mut self, key: &str, value: PropertyValue, element: ElementId) {
        self.buckets
            .entry(key.to_string())
            .or_default()
            .entry(value)
            .or_default()
            .insert(element);
    }

    /// Elements indexed under (key, value); empty when either is unknown
    pub fn get(&self, key: &str, value: &PropertyValue) -> Vec<ElementId> {
        self.buckets
            .get(key)
            .and_then(|values| values.get(value))
            .map(|elements| elements.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, key: &str, value: &PropertyValue) -> usize {
        self.buckets
            .get(key)
            .and_then(|values| values.get(value))
            .map_or(0, IndexSet::len)
    }

    /// Elements indexed under `key` with a value inside `range`, in value order
    pub fn range<R>(&self, key: &str, range: R) -> Vec<ElementId>
    where
        R: RangeBounds<PropertyValue>,
    {
        let mut result = Vec::new();
        if let Some(values) = self.buckets.get(key) {
            for (_, elements) in values.range(range) {
                result.extend(elements.iter().cloned());
            }
        }
        result
    }

    /// Remove one entry; a missing entry is not an error
    pub fn remove(&mut self, key: &str, value: &PropertyValue, element: &ElementId) -> bool {
        let Some(values) = self.buckets.get_mut(key) else {
            return false;
        };
        let Some(elements) = values.get_mut(value) else {
            return false;
        };
        let removed = elements.shift_remove(element);
        if elements.is_empty() {
            values.remove(value);
        }
        if values.is_empty() {
            self.buckets.remove(key);
        }
        removed
    }

    /// Purge every occurrence of `element`
    ///
    /// This walks every bucket of the index, so it costs O(index size). It
    /// runs for every vertex or edge removal and dominates their cost.
    pub fn remove_element(&mut self, element: &ElementId) -> usize {
        let mut removed = 0;
        self.buckets.retain(|_, values| {
            values.retain(|_, elements| {
                if elements.shift_remove(element) {
                    removed += 1;
                }
                !elements.is_empty()
            });
            !values.is_empty()
        });
        removed
    }

    /// Index every tracked attribute of an element
    pub fn index_element(&mut self, element: ElementView<'_>) -> usize {
        let mut added = 0;
        if let Some(label) = element.label {
            if self.tracks(LABEL_KEY) {
                self.put(LABEL_KEY, PropertyValue::from(label), element.id.clone());
                added += 1;
            }
        }
        for (key, value) in element.properties.iter() {
            if self.tracks(key) {
                self.put(key, value.clone(), element.id.clone());
                added += 1;
            }
        }
        added
    }

    /// Keys that currently have at least one entry
    pub fn keys(&self) -> Vec<&str> {
        self.buckets.keys().map(String::as_str).collect()
    }

    /// Number of live (key, value) buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.values().map(BTreeMap::len).sum()
    }

    /// Number of (key, value, element) entries
    pub fn len(&self) -> usize {
        self.buckets
            .values()
            .flat_map(BTreeMap::values)
            .map(IndexSet::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::property::Detached;
    use std::ops::Bound;

    fn manual() -> PropertyIndex {
        PropertyIndex::new("people", ElementKind::Vertex, IndexKind::Manual)
    }

    #[test]
    fn test_property_index_ops() {
        let mut index = manual();
        let n1 = ElementId::from(1i64);
        let n2 = ElementId::from(2i64);
        let val = PropertyValue::from(100i64);

        index.put("score", val.clone(), n1.clone());
        index.put("score", val.clone(), n2.clone());

        let results = index.get("score", &val);
        assert_eq!(results.len(), 2);
        assert!(results.contains(&n1));
        assert!(results.contains(&n2));
        assert_eq!(index.count("score", &val), 2);

        assert!(index.remove("score", &val, &n1));
        assert_eq!(index.get("score", &val), vec![n2]);
    }

    #[test]
    fn test_unknown_key_or_value_is_empty() {
        let mut index = manual();
        index.put("name", "a".into(), ElementId::from(1i64));

        assert!(index.get("missing", &"a".into()).is_empty());
        assert!(index.get("name", &"b".into()).is_empty());
        assert_eq!(index.count("name", &"b".into()), 0);
    }

    #[test]
    fn test_empty_buckets_are_dropped() {
        let mut index = manual();
        let id = ElementId::from(1i64);
        index.put("name", "a".into(), id.clone());
        assert_eq!(index.bucket_count(), 1);

        assert!(index.remove("name", &"a".into(), &id));
        assert_eq!(index.count("name", &"a".into()), 0);
        assert_eq!(index.bucket_count(), 0);
        assert!(index.keys().is_empty());
        assert!(index.is_empty());

        // removing again is a no-op
        assert!(!index.remove("name", &"a".into(), &id));
    }

    #[test]
    fn test_remove_element_purges_all_buckets() {
        let mut index = manual();
        let a = ElementId::from("a");
        let b = ElementId::from("b");
        index.put("name", "x".into(), a.clone());
        index.put("name", "y".into(), a.clone());
        index.put("age", 3i64.into(), a.clone());
        index.put("age", 3i64.into(), b.clone());

        assert_eq!(index.remove_element(&a), 3);
        assert_eq!(index.len(), 1);
        assert_eq!(index.keys(), vec!["age"]);
        assert_eq!(index.get("age", &3i64.into()), vec![b]);
    }

    #[test]
    fn test_property_index_range() {
        let mut index = manual();
        for i in 1..=10i64 {
            index.put("n", PropertyValue::from(i), ElementId::from(i));
        }

        let range = (
            Bound::Included(PropertyValue::from(3i64)),
            Bound::Included(PropertyValue::from(7i64)),
        );
        let results = index.range("n", range);
        assert_eq!(results.len(), 5);
        for i in 3..=7i64 {
            assert!(results.contains(&ElementId::from(i)));
        }
        assert!(index.range("other", ..).is_empty());
    }

    #[test]
    fn test_tracking() {
        let all = PropertyIndex::new("a", ElementKind::Edge, IndexKind::Automatic(AutoKeys::All));
        let some = PropertyIndex::new(
            "s",
            ElementKind::Edge,
            IndexKind::Automatic(AutoKeys::subset(["weight"])),
        );
        let key = PropertyIndex::new("k", ElementKind::Edge, IndexKind::Key("since".into()));

        assert!(all.tracks("anything"));
        assert!(some.tracks("weight"));
        assert!(!some.tracks("since"));
        assert!(key.tracks("since"));
        assert!(!manual().tracks("name"));
    }

    #[test]
    fn test_index_element_with_label() {
        let mut props = Properties::new(ElementKind::Edge);
        props.set("weight", 0.5f64.into(), &mut Detached).unwrap();
        props.set("note", "x".into(), &mut Detached).unwrap();
        let id = ElementId::from(9i64);

        let mut index = PropertyIndex::new(
            "edges",
            ElementKind::Edge,
            IndexKind::Automatic(AutoKeys::subset(["weight", LABEL_KEY])),
        );
        let added = index.index_element(ElementView {
            id: &id,
            label: Some("knows"),
            properties: &props,
        });

        assert_eq!(added, 2);
        assert_eq!(index.get(LABEL_KEY, &"knows".into()), vec![id.clone()]);
        assert_eq!(index.get("weight", &0.5f64.into()), vec![id]);
        assert_eq!(index.count("note", &"x".into()), 0);
    }
}
