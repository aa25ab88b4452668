//! Server crate for the movie graph.
//!
//! This crate contains the loader that builds the graph from dataset rows
//! and the engine that answers recommendation queries against it.

pub mod config;
pub mod orchestrator;
pub mod recommend;

pub use config::LoaderConfig;
pub use orchestrator::{GraphLoader, LoadResult};
pub use recommend::{RecommendationEngine, DEFAULT_THRESHOLD};
