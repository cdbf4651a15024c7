//! Buffered bulk loading on top of a transactional store
//!
//! [`BatchGraph`] keeps one transaction open on its sink and commits it every
//! `buffer_size` inserts. It remembers vertices only through a
//! [`VertexIdCache`] and edges not at all, so an edge can be given properties
//! only until the next element is created.

use super::id_cache::{VertexIdCache, VertexIdType};
use crate::graph::{
    Conclusion, ElementId, ElementKind, Features, GraphError, GraphResult, Properties, PropertyValue,
    TransactionalGraph,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

pub const DEFAULT_BUFFER_SIZE: usize = 10_000;

static NEXT_LOADER: AtomicU64 = AtomicU64::new(1);

/// Configuration of a bulk load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Inserts per committed transaction
    pub buffer_size: usize,

    pub vertex_id_type: VertexIdType,

    /// Property that receives the caller's vertex id
    pub vertex_id_key: Option<String>,

    /// Property that receives the caller's edge id
    pub edge_id_key: Option<String>,

    /// Look vertices up in the sink when the cache misses
    ///
    /// With `vertex_id_key` set, every miss is a `vertex_ids_with` query on
    /// the sink. Without a key index on that key the query scans all
    /// vertices, which makes each new vertex cost O(vertices loaded).
    pub incremental: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            vertex_id_type: VertexIdType::Object,
            vertex_id_key: None,
            edge_id_key: None,
            incremental: false,
        }
    }
}

impl BatchConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    #[must_use]
    pub const fn vertex_id_type(mut self, id_type: VertexIdType) -> Self {
        self.vertex_id_type = id_type;
        self
    }

    #[must_use]
    pub fn vertex_id_key(mut self, key: impl Into<String>) -> Self {
        self.vertex_id_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn edge_id_key(mut self, key: impl Into<String>) -> Self {
        self.edge_id_key = Some(key.into());
        self
    }

    #[must_use]
    pub const fn incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn from_yaml_str(yaml: &str) -> GraphResult<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| GraphError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> GraphResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GraphError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> GraphResult<()> {
        if self.buffer_size == 0 {
            return Err(GraphError::InvalidBufferSize);
        }
        if let Some(key) = &self.vertex_id_key {
            Properties::validate_key(ElementKind::Vertex, key)?;
        }
        if let Some(key) = &self.edge_id_key {
            Properties::validate_key(ElementKind::Edge, key)?;
        }
        Ok(())
    }
}

/// A vertex created or found by one particular loader
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadedVertex {
    loader: u64,
    id: ElementId,
}

impl LoadedVertex {
    /// Id assigned by the sink
    pub fn id(&self) -> &ElementId {
        &self.id
    }
}

/// An edge created by one particular loader
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadedEdge {
    loader: u64,
    /// Creation position within the load
    sequence: u64,
    id: ElementId,
}

impl LoadedEdge {
    pub fn id(&self) -> &ElementId {
        &self.id
    }
}

/// Append-only loader over a [`TransactionalGraph`]
#[derive(Debug)]
pub struct BatchGraph<G: TransactionalGraph> {
    graph: G,
    config: BatchConfig,
    cache: Box<dyn VertexIdCache>,
    instance: u64,
    /// Inserts left before the open transaction is committed
    remaining: usize,
    /// Number of elements created so far; the last one has this sequence
    created: u64,
    commits: u64,
    vertices_added: u64,
    edges_added: u64,
    finished: bool,
}

impl<G: TransactionalGraph> BatchGraph<G> {
    /// Wrap `graph` and open the first transaction
    pub fn new(graph: G, config: BatchConfig) -> GraphResult<Self> {
        let cache = config.vertex_id_type.cache();
        Self::with_cache(graph, config, cache)
    }

    /// Like [`BatchGraph::new`] with a caller-supplied id cache
    pub fn with_cache(mut graph: G, config: BatchConfig, cache: Box<dyn VertexIdCache>) -> GraphResult<Self> {
        config.validate()?;
        if config.incremental && config.vertex_id_key.is_none() && graph.features().ignores_supplied_ids {
            return Err(GraphError::Config(
                "incremental loading into a store that ignores supplied ids needs a vertex_id_key".to_string(),
            ));
        }
        graph.start_transaction()?;
        info!(
            "Starting bulk load: buffer {} ids {:?} incremental {}",
            config.buffer_size, config.vertex_id_type, config.incremental
        );
        Ok(Self {
            graph,
            remaining: config.buffer_size,
            config,
            cache,
            instance: NEXT_LOADER.fetch_add(1, Ordering::Relaxed),
            created: 0,
            commits: 0,
            vertices_added: 0,
            edges_added: 0,
            finished: false,
        })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn features(&self) -> &Features {
        self.graph.features()
    }

    /// Committed transactions, including the final one
    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn vertices_added(&self) -> u64 {
        self.vertices_added
    }

    pub fn edges_added(&self) -> u64 {
        self.edges_added
    }

    pub fn cached_vertices(&self) -> usize {
        self.cache.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn check_open(&self) -> GraphResult<()> {
        if self.finished {
            Err(GraphError::LoaderFinished)
        } else {
            Ok(())
        }
    }

    fn check_vertex(&self, vertex: &LoadedVertex) -> GraphResult<()> {
        if vertex.loader == self.instance {
            Ok(())
        } else {
            Err(GraphError::ForeignVertex(vertex.id.clone()))
        }
    }

    fn commit_batch(&mut self) -> GraphResult<()> {
        self.graph.stop_transaction(Conclusion::Success)?;
        self.commits += 1;
        self.cache.new_transaction();
        self.graph.start_transaction()?;
        self.remaining = self.config.buffer_size;
        debug!(
            "Committed batch {} ({} vertices, {} edges so far)",
            self.commits, self.vertices_added, self.edges_added
        );
        Ok(())
    }

    /// Claim one insert from the buffer, committing first if it is full
    fn claim_slot(&mut self) -> GraphResult<()> {
        if self.remaining == 0 {
            self.commit_batch()?;
        }
        self.remaining -= 1;
        Ok(())
    }

    /// Reject an id-key write the sink would refuse, before anything is inserted
    fn check_id_key(&self, kind: ElementKind, external: &ElementId) -> GraphResult<()> {
        let key = match kind {
            ElementKind::Vertex => &self.config.vertex_id_key,
            ElementKind::Edge => &self.config.edge_id_key,
        };
        if key.is_none() {
            return Ok(());
        }
        let features = self.graph.features();
        let properties = match kind {
            ElementKind::Vertex => features.supports_vertex_properties,
            ElementKind::Edge => features.supports_edge_properties,
        };
        let value = match external {
            ElementId::Long(_) => features.supports_long_property,
            ElementId::Text(_) => features.supports_string_property,
        };
        if properties && value {
            Ok(())
        } else {
            Err(GraphError::Config(format!(
                "{} id {} cannot be stored as a property",
                kind, external
            )))
        }
    }

    fn token(&self, id: ElementId) -> LoadedVertex {
        LoadedVertex {
            loader: self.instance,
            id,
        }
    }

    /// Find a vertex by external id, in the cache and then (incrementally) in the sink
    fn lookup(&mut self, external: &ElementId) -> GraphResult<Option<ElementId>> {
        if let Some(found) = self.cache.get_vertex(external)? {
            return Ok(Some(found));
        }
        if !self.config.incremental {
            return Ok(None);
        }
        let found = match &self.config.vertex_id_key {
            Some(key) => self
                .graph
                .vertex_ids_with(key, &PropertyValue::from(external))
                .into_iter()
                .next(),
            None => self.graph.contains_vertex(external).then(|| external.clone()),
        };
        if let Some(found) = &found {
            self.cache.add(found.clone(), external)?;
        }
        Ok(found)
    }

    /// Create a vertex; a known external id is rejected
    ///
    /// The id shape and the id-key write are checked before the sink is
    /// touched. An error raised by the sink after the insert (while writing
    /// the id key) leaves the vertex in the sink but not in the cache.
    pub fn add_vertex(&mut self, id: Option<ElementId>) -> GraphResult<LoadedVertex> {
        self.check_open()?;
        let external = id.filter(|id| !id.is_empty());
        if let Some(external) = &external {
            if self.lookup(external)?.is_some() {
                return Err(GraphError::VertexAlreadyExists(external.clone()));
            }
            self.check_id_key(ElementKind::Vertex, external)?;
        }
        self.claim_slot()?;

        let vertex = self.graph.add_vertex(external.clone())?;
        self.created += 1;
        self.vertices_added += 1;
        if let Some(external) = &external {
            if let Some(key) = &self.config.vertex_id_key {
                self.graph
                    .set_vertex_property(&vertex, key, PropertyValue::from(external))?;
            }
            self.cache.add(vertex.clone(), external)?;
        }
        Ok(self.token(vertex))
    }

    /// Vertex previously loaded under `id`
    pub fn get_vertex(&mut self, id: &ElementId) -> GraphResult<Option<LoadedVertex>> {
        self.check_open()?;
        if id.is_empty() {
            return Err(GraphError::MissingId);
        }
        Ok(self.lookup(id)?.map(|vertex| self.token(vertex)))
    }

    /// Create an edge between two vertices of this load
    ///
    /// The returned edge stays in scope until the next vertex or edge is
    /// created. As with [`BatchGraph::add_vertex`], a sink error while writing
    /// the id key leaves the edge in the sink without a token.
    pub fn add_edge(
        &mut self,
        id: Option<ElementId>,
        tail: &LoadedVertex,
        head: &LoadedVertex,
        label: &str,
    ) -> GraphResult<LoadedEdge> {
        self.check_open()?;
        self.check_vertex(tail)?;
        self.check_vertex(head)?;
        let external = id.filter(|id| !id.is_empty());
        if let Some(external) = &external {
            self.check_id_key(ElementKind::Edge, external)?;
        }
        self.claim_slot()?;

        let edge = self.graph.add_edge(external.clone(), &tail.id, &head.id, label)?;
        self.created += 1;
        self.edges_added += 1;
        if let (Some(external), Some(key)) = (&external, &self.config.edge_id_key) {
            self.graph.set_edge_property(&edge, key, PropertyValue::from(external))?;
        }
        Ok(LoadedEdge {
            loader: self.instance,
            sequence: self.created,
            id: edge,
        })
    }

    pub fn set_vertex_property(
        &mut self,
        vertex: &LoadedVertex,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        self.check_open()?;
        self.check_vertex(vertex)?;
        self.graph.set_vertex_property(&vertex.id, key, value.into())
    }

    pub fn vertex_property(&self, vertex: &LoadedVertex, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.check_open()?;
        self.check_vertex(vertex)?;
        self.graph.vertex_property(&vertex.id, key)
    }

    /// Set a property on the most recently created edge
    pub fn set_edge_property(
        &mut self,
        edge: &LoadedEdge,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        self.check_open()?;
        if edge.loader != self.instance || edge.sequence != self.created {
            return Err(GraphError::EdgeOutOfScope(edge.id.clone()));
        }
        self.graph.set_edge_property(&edge.id, key, value.into())
    }

    /// `Success` commits the open batch early; `Failure` is rejected
    pub fn stop_transaction(&mut self, conclusion: Conclusion) -> GraphResult<()> {
        self.check_open()?;
        match conclusion {
            Conclusion::Success => self.commit_batch(),
            Conclusion::Failure => Err(GraphError::RollbackNotSupported),
        }
    }

    /// Commit the last batch and end the load
    ///
    /// A `Failure` conclusion is rejected and leaves the load open.
    pub fn finish(&mut self, conclusion: Conclusion) -> GraphResult<()> {
        self.check_open()?;
        if conclusion == Conclusion::Failure {
            return Err(GraphError::RollbackNotSupported);
        }
        self.graph.stop_transaction(Conclusion::Success)?;
        self.commits += 1;
        self.finished = true;
        info!(
            "Bulk load finished: {} vertices, {} edges in {} commits",
            self.vertices_added, self.edges_added, self.commits
        );
        Ok(())
    }

    /// Give back the sink
    ///
    /// Unless [`BatchGraph::finish`] was called, the sink still has the last
    /// batch open.
    pub fn into_inner(self) -> G {
        self.graph
    }

    fn unsupported<T>(&self, operation: &'static str) -> GraphResult<T> {
        self.check_open()?;
        Err(GraphError::UnsupportedDuringLoading(operation))
    }

    pub fn vertices(&self) -> GraphResult<Vec<LoadedVertex>> {
        self.unsupported("vertex iteration")
    }

    pub fn edges(&self) -> GraphResult<Vec<LoadedEdge>> {
        self.unsupported("edge iteration")
    }

    pub fn vertices_with(&self, _key: &str, _value: &PropertyValue) -> GraphResult<Vec<LoadedVertex>> {
        self.unsupported("vertex lookup")
    }

    pub fn edges_with(&self, _key: &str, _value: &PropertyValue) -> GraphResult<Vec<LoadedEdge>> {
        self.unsupported("edge lookup")
    }

    pub fn remove_vertex(&mut self, _vertex: &LoadedVertex) -> GraphResult<()> {
        self.unsupported("vertex removal")
    }

    pub fn remove_edge(&mut self, _edge: &LoadedEdge) -> GraphResult<()> {
        self.unsupported("edge removal")
    }

    /// Transactions are managed by the loader itself
    pub fn start_transaction(&mut self) -> GraphResult<()> {
        self.unsupported("starting a transaction")
    }
}
