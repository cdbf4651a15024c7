use anyhow::{Context, Result};
use propgraph::graph::{Conclusion, Direction, ElementId, ElementKind, GraphStore, PropertyValue, StoreConfig};
use propgraph::{BatchConfig, BatchGraph};
use rand::Rng;
use tracing_subscriber::EnvFilter;

const VERTICES: i64 = 2_000;
const EDGES: usize = 10_000;
const LABELS: [&str; 3] = ["knows", "follows", "likes"];

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("propgraph v{}", propgraph::version());
    println!("==========================================");
    println!();

    // Optional YAML store configuration
    let config = match std::env::args().nth(1) {
        Some(path) => StoreConfig::load(&path).with_context(|| format!("loading store config {}", path))?,
        None => StoreConfig::in_memory(),
    };

    let store = demo_bulk_load(GraphStore::with_config(config))?;
    demo_indices(store)?;
    Ok(())
}

fn demo_bulk_load(store: GraphStore) -> Result<GraphStore> {
    println!("=== Demo 1: Bulk Load ===");
    let mut rng = rand::thread_rng();
    let config = BatchConfig::new().buffer_size(1_000).vertex_id_key("external_id");
    let mut batch = BatchGraph::new(store, config)?;

    for i in 0..VERTICES {
        let vertex = batch.add_vertex(Some(ElementId::from(i)))?;
        batch.set_vertex_property(&vertex, "score", rng.gen_range(0..100i64))?;
    }
    for _ in 0..EDGES {
        let tail = batch
            .get_vertex(&ElementId::from(rng.gen_range(0..VERTICES)))?
            .context("tail vertex was loaded")?;
        let head = batch
            .get_vertex(&ElementId::from(rng.gen_range(0..VERTICES)))?
            .context("head vertex was loaded")?;
        let label = LABELS[rng.gen_range(0..LABELS.len())];
        let edge = batch.add_edge(None, &tail, &head, label)?;
        batch.set_edge_property(&edge, "weight", rng.gen::<f64>())?;
    }
    batch.finish(Conclusion::Success)?;
    println!(
        "✓ Loaded {} vertices and {} edges in {} commits",
        batch.vertices_added(),
        batch.edges_added(),
        batch.commits()
    );

    let store = batch.into_inner();
    let stats = store.statistics();
    println!("\nGraph Statistics:");
    println!("  Total vertices: {}", stats.vertex_count);
    println!("  Total edges: {}", stats.edge_count);
    for (label, count) in &stats.edge_labels {
        println!("  [{}]: {}", label, count);
    }
    Ok(store)
}

fn demo_indices(mut store: GraphStore) -> Result<()> {
    println!("\n=== Demo 2: Key Indices ===");
    store.create_key_index("score", ElementKind::Vertex)?;

    let top = PropertyValue::from(99i64);
    let hits = store.vertices_with("score", &top);
    println!("✓ {} vertices score {}", hits.len(), top);

    if let Some(vertex) = hits.first() {
        let id = vertex.id().clone();
        let out = store.edges_of(&id, Direction::Out, &[])?.len();
        store.set_vertex_property(&id, "score", 0i64)?;
        println!("✓ Vertex {} has {} outgoing edges, score reset to 0", id, out);
    }
    println!(
        "✓ {} vertices score {} after the update",
        store.vertices_with("score", &top).len(),
        top
    );

    if let Some(id) = store.vertex_ids().first().cloned() {
        let before = store.edge_count();
        store.remove_vertex(&id)?;
        println!(
            "✓ Removed vertex {} and {} incident edges",
            id,
            before - store.edge_count()
        );
    }
    Ok(())
}
