//! Graph construction pipeline.
//!
//! This crate provides the building blocks a load is made of:
//! - `NodeUpsertService` for idempotent node creation
//! - `RelationBuilder` for per-row relationship creation
//! - `WorkerPool` for bounded concurrent execution with a join barrier
//! - `LoadError`, the per-task error taxonomy
//!
//! ## Architecture
//! The loader (in the server crate) drives these in phases:
//! 1. Upsert every Movie and entity node through the pool
//! 2. Wait for the pool to drain
//! 3. Build every well-formed row's relationships through the pool
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{NodeUpsertService, RelationBuilder, WorkerPool};
//!
//! let pool = WorkerPool::new(8);
//! let upserts = NodeUpsertService::new(store.clone());
//! let results = pool
//!     .run_all(rows.clone(), move |row| {
//!         let upserts = upserts.clone();
//!         async move { upserts.upsert_movie(&row).await }
//!     })
//!     .await;
//! ```

pub mod error;
pub mod pool;
pub mod relations;
pub mod upsert;

// Re-export main types
pub use error::{LoadError, Result};
pub use pool::{WorkerPool, DEFAULT_WORKERS};
pub use relations::{target, RelationBuilder, RowReport};
pub use upsert::{entity_node, label_for, movie_node, NodeUpsertService};
