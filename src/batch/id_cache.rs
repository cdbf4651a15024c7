//! Vertex id caches used by the bulk loader
//!
//! A cache maps the external id a caller used for a vertex to the id the
//! backing store assigned, so the loader never has to hold vertices.

use super::compression::{NoCompression, StringCompression, UrlCompression};
use crate::graph::{ElementId, GraphError, GraphResult};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// External id to store id mapping scoped to one load
pub trait VertexIdCache: Debug {
    fn add(&mut self, vertex: ElementId, external: &ElementId) -> GraphResult<()>;

    /// Store id for `external`; wrongly shaped ids are an error, not a miss
    fn get_vertex(&self, external: &ElementId) -> GraphResult<Option<ElementId>>;

    /// Called at every commit boundary of the load
    fn new_transaction(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shape of the external vertex ids of a load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexIdType {
    /// Any id
    #[default]
    Object,
    /// Integer ids only
    Number,
    /// Text ids only
    String,
    /// Text ids sharing URL namespaces
    Url,
}

impl VertexIdType {
    pub fn cache(self) -> Box<dyn VertexIdCache> {
        match self {
            VertexIdType::Object => Box::new(ObjectIdCache::new()),
            VertexIdType::Number => Box::new(LongIdCache::new()),
            VertexIdType::String => Box::new(StringIdCache::new(NoCompression)),
            VertexIdType::Url => Box::new(StringIdCache::new(UrlCompression::new())),
        }
    }
}

/// Hash map over arbitrary ids
#[derive(Debug, Default)]
pub struct ObjectIdCache {
    map: FxHashMap<ElementId, ElementId>,
}

impl ObjectIdCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VertexIdCache for ObjectIdCache {
    fn add(&mut self, vertex: ElementId, external: &ElementId) -> GraphResult<()> {
        self.map.insert(external.clone(), vertex);
        Ok(())
    }

    fn get_vertex(&self, external: &ElementId) -> GraphResult<Option<ElementId>> {
        Ok(self.map.get(external).cloned())
    }

    fn new_transaction(&mut self) {}

    fn len(&self) -> usize {
        self.map.len()
    }
}

fn long_id(external: &ElementId) -> GraphResult<i64> {
    external.as_long().ok_or_else(|| GraphError::UnsupportedIdType {
        expected: "number",
        id: external.clone(),
    })
}

fn text_id(external: &ElementId) -> GraphResult<&str> {
    external.as_text().ok_or_else(|| GraphError::UnsupportedIdType {
        expected: "text",
        id: external.clone(),
    })
}

/// Integer ids in packed sorted columns
///
/// Ids added since the last commit boundary sit in a small hash tail that
/// `new_transaction` merges into the sorted columns.
#[derive(Debug, Default)]
pub struct LongIdCache {
    keys: Vec<i64>,
    vertices: Vec<ElementId>,
    tail: FxHashMap<i64, ElementId>,
}

impl LongIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries not yet merged into the sorted columns
    pub fn pending(&self) -> usize {
        self.tail.len()
    }
}

impl VertexIdCache for LongIdCache {
    fn add(&mut self, vertex: ElementId, external: &ElementId) -> GraphResult<()> {
        let key = long_id(external)?;
        match self.keys.binary_search(&key) {
            Ok(at) => self.vertices[at] = vertex,
            Err(_) => {
                self.tail.insert(key, vertex);
            }
        }
        Ok(())
    }

    fn get_vertex(&self, external: &ElementId) -> GraphResult<Option<ElementId>> {
        let key = long_id(external)?;
        if let Ok(at) = self.keys.binary_search(&key) {
            return Ok(Some(self.vertices[at].clone()));
        }
        Ok(self.tail.get(&key).cloned())
    }

    /// Sort the tail and merge it into the columns from the back
    fn new_transaction(&mut self) {
        if self.tail.is_empty() {
            return;
        }
        let mut pending: Vec<(i64, ElementId)> = self.tail.drain().collect();
        pending.sort_unstable_by_key(|(key, _)| *key);

        let mut unmerged = self.keys.len();
        let total = unmerged + pending.len();
        self.keys.resize(total, 0);
        self.vertices.resize(total, ElementId::Long(0));
        let mut write = total;
        // tail keys are never already in the columns
        while let Some((key, vertex)) = pending.pop() {
            while unmerged > 0 && self.keys[unmerged - 1] > key {
                unmerged -= 1;
                write -= 1;
                self.keys[write] = self.keys[unmerged];
                self.vertices.swap(write, unmerged);
            }
            write -= 1;
            self.keys[write] = key;
            self.vertices[write] = vertex;
        }
    }

    fn len(&self) -> usize {
        self.keys.len() + self.tail.len()
    }
}

/// Text ids in an ordered map, optionally compressed
#[derive(Debug, Default)]
pub struct StringIdCache<C> {
    compression: C,
    map: BTreeMap<String, ElementId>,
}

impl<C: StringCompression> StringIdCache<C> {
    pub fn new(compression: C) -> Self {
        Self {
            compression,
            map: BTreeMap::new(),
        }
    }

    pub fn compression(&self) -> &C {
        &self.compression
    }
}

impl<C: StringCompression> VertexIdCache for StringIdCache<C> {
    fn add(&mut self, vertex: ElementId, external: &ElementId) -> GraphResult<()> {
        let key = self.compression.compress(text_id(external)?);
        self.map.insert(key, vertex);
        Ok(())
    }

    fn get_vertex(&self, external: &ElementId) -> GraphResult<Option<ElementId>> {
        let id = text_id(external)?;
        Ok(self
            .compression
            .compressed(id)
            .and_then(|key| self.map.get(&key).cloned()))
    }

    fn new_transaction(&mut self) {}

    fn len(&self) -> usize {
        self.map.len()
    }
}
