//! Smoke-test harness for the loader and the recommendation engine.
//!
//! Loads a CSV into an in-memory graph and asks for recommendations for
//! the first movie in the file. Useful to check a dataset before pointing
//! the CLI at a real Neo4j server.
//!
//! Usage: `server [path/to/crawled_movie.csv]` (or set `MOVIES_CSV`)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use data_loader::read_rows;
use graph_store::MemoryStore;
use server::{GraphLoader, LoaderConfig, RecommendationEngine};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,server=debug")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MOVIES_CSV").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/crawled_movie.csv"));

    info!("Reading {}", path.display());
    let rows = read_rows(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let first_title = rows.first().map(|row| row.title.clone());

    let store = Arc::new(MemoryStore::new());
    let config = LoaderConfig::default();
    let loader = GraphLoader::new(Arc::clone(&store), config.clone());
    let result = loader.load(rows).await.context("Load failed")?;

    info!(
        "Loaded {} rows: {} nodes, {} relationships, {} errors",
        result.rows,
        result.nodes_created,
        result.edges_created,
        result.errors.len()
    );
    for error in result.errors.iter().take(10) {
        warn!("{}", error);
    }

    let Some(title) = first_title else {
        info!("No rows, nothing to recommend");
        return Ok(());
    };

    let engine = RecommendationEngine::new(store).with_threshold(config.threshold);
    let recommendations = engine.recommend(&title).await?;

    info!("Received {} recommendations for {:?}:", recommendations.len(), title);
    for (i, rec) in recommendations.iter().enumerate() {
        info!(
            "{}. {} - people: {}, genres: {} (score {})",
            i + 1,
            rec.movie.title,
            rec.shared_people,
            rec.shared_genres,
            rec.score()
        );
    }

    Ok(())
}
