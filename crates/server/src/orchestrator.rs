//! # Graph Loader
//!
//! This module coordinates a full load of the dataset into the graph store:
//! 0. Read baseline counts (fails fast when the store is unreachable)
//! 1. Extract deduplicated entities on a blocking thread
//! 2. Declare a uniqueness constraint on every label's natural key
//! 3. Upsert every Movie, person and genre node through the worker pool
//! 4. Create natural-key indexes if the store was empty before the load
//! 5. Build every well-formed row's relationships through the worker pool
//! 6. Read counts again and report the deltas
//!
//! Each phase ends when the pool has drained, so no relationship is ever
//! attempted before both of its endpoints had a chance to be created.
//! The constraints go in before any MERGE: without them two sessions merging
//! the same key at once may both create the node.
//!
//! ## Learning Goals
//!
//! This component teaches you:
//! - Using spawn_blocking for CPU-bound work
//! - Phase barriers by awaiting a whole batch of tasks
//! - Collecting per-task errors instead of aborting
//! - Instrumentation and timing

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use data_loader::{extract_entities, Extraction, MovieRow};
use graph_store::{GraphStats, GraphStore, Label, NodeSpec};
use pipeline::{
    entity_node, movie_node, LoadError, NodeUpsertService, RelationBuilder, RowReport, WorkerPool,
};

use crate::config::LoaderConfig;

/// Summary of one load
#[derive(Debug, Default, Serialize)]
pub struct LoadResult {
    /// Rows handed to the loader
    pub rows: usize,
    /// Nodes in the store now minus nodes before the load
    pub nodes_created: u64,
    /// Relationships in the store now minus relationships before the load
    pub edges_created: u64,
    /// Relation upserts issued (including failed ones)
    pub relations_attempted: usize,
    /// Whether every label's key constraint is in place
    pub constraints_created: bool,
    /// Whether the index phase ran
    pub indexes_created: bool,
    /// Titles seen more than once; their first row's properties won
    pub duplicate_titles: Vec<String>,
    /// Every per-row and per-task failure, in phase order
    #[serde(skip)]
    pub errors: Vec<LoadError>,
}

impl LoadResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Loads dataset rows into a graph store
pub struct GraphLoader<S: GraphStore + ?Sized + 'static> {
    store: Arc<S>,
    config: LoaderConfig,
    pool: WorkerPool,
}

impl<S: GraphStore + ?Sized + 'static> GraphLoader<S> {
    /// Create a loader over a shared store
    ///
    /// # Arguments
    /// * `store` - The graph store to write to
    /// * `config` - Worker count, index switch and recommendation threshold
    pub fn new(store: Arc<S>, config: LoaderConfig) -> Self {
        let pool = WorkerPool::new(config.workers);
        Self {
            store,
            config,
            pool,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Run all load phases over `rows`
    ///
    /// Rows are told apart by their position in `rows`; `MovieRow::index`
    /// is only used in messages.
    ///
    /// # Returns
    /// * `Ok(LoadResult)` - the load ran to the end; per-row and per-task
    ///   failures are in `errors`
    /// * `Err(LoadError::Store)` - the store could not be reached at the
    ///   start or the end of the load
    /// * `Err(LoadError::TaskFailed)` - entity extraction panicked
    #[instrument(skip(self, rows), fields(store = self.store.name(), rows = rows.len()))]
    pub async fn load(&self, rows: Vec<MovieRow>) -> Result<LoadResult, LoadError> {
        let start_time = Instant::now();
        let mut result = LoadResult {
            rows: rows.len(),
            ..LoadResult::default()
        };

        // Phase 0: baseline
        let baseline = self.store.stats().await?;
        info!(
            nodes = baseline.nodes,
            relationships = baseline.relationships,
            "Baseline counts"
        );

        // Phase 1: extract
        let rows = Arc::new(rows);
        let extraction = self.extract(Arc::clone(&rows)).await?;
        info!(
            entities = extraction.entities.len(),
            malformed = extraction.malformed_positions.len(),
            "Extracted entities"
        );
        let Extraction {
            entities,
            malformed,
            duplicate_titles,
            malformed_positions,
        } = extraction;
        result.duplicate_titles = duplicate_titles;
        result
            .errors
            .extend(malformed.into_iter().map(LoadError::MalformedRow));

        // Phase 2: key constraints
        let constraint_errors = self.create_constraints().await;
        result.constraints_created = constraint_errors.is_empty();
        result.errors.extend(constraint_errors);

        // Phase 3: nodes
        let nodes: Vec<NodeSpec> = rows
            .iter()
            .map(movie_node)
            .chain(entities.iter().map(|(kind, name)| entity_node(kind, name)))
            .collect();
        let node_errors = self.create_nodes(nodes).await;
        result.errors.extend(node_errors);

        // Phase 4: indexes
        if self.should_create_indexes(&baseline) {
            let index_errors = self.create_indexes().await;
            result.indexes_created = index_errors.is_empty();
            result.errors.extend(index_errors);
        } else {
            debug!("Skipping index creation");
        }

        // Phase 5: relations
        let positions: Vec<usize> = (0..rows.len())
            .filter(|position| !malformed_positions.contains(position))
            .collect();
        let (attempted, relation_errors) = self.create_relations(rows, positions).await;
        result.relations_attempted = attempted;
        result.errors.extend(relation_errors);

        // Phase 6: report
        let after = self.store.stats().await?;
        result.nodes_created = after.nodes.saturating_sub(baseline.nodes);
        result.edges_created = after.relationships.saturating_sub(baseline.relationships);

        info!(
            nodes_created = result.nodes_created,
            edges_created = result.edges_created,
            relations_attempted = result.relations_attempted,
            errors = result.errors.len(),
            "Load finished in {:.2?}",
            start_time.elapsed()
        );
        Ok(result)
    }

    /// Entity extraction is CPU-bound (rayon inside), keep it off the runtime
    async fn extract(&self, rows: Arc<Vec<MovieRow>>) -> Result<Extraction, LoadError> {
        tokio::task::spawn_blocking(move || extract_entities(&rows))
            .await
            .map_err(|e| LoadError::TaskFailed(format!("entity extraction: {}", e)))
    }

    /// Indexes only go into a store that was empty before this load
    fn should_create_indexes(&self, baseline: &GraphStats) -> bool {
        self.config.create_indexes && baseline.nodes == 0
    }

    async fn create_nodes(&self, nodes: Vec<NodeSpec>) -> Vec<LoadError> {
        let phase_start = Instant::now();
        let count = nodes.len();
        let upserts = NodeUpsertService::new(Arc::clone(&self.store));

        let results = self
            .pool
            .run_all(nodes, move |node| {
                let upserts = upserts.clone();
                async move { upserts.upsert_node(&node).await }
            })
            .await;

        let errors = collect_errors(results);
        info!(
            nodes = count,
            failed = errors.len(),
            "Node phase finished in {:.2?}",
            phase_start.elapsed()
        );
        errors
    }

    /// Constraints are idempotent, so they are declared on every load
    async fn create_constraints(&self) -> Vec<LoadError> {
        let mut errors = Vec::new();
        for label in Label::ALL {
            if let Err(err) = self.store.create_unique_key(label).await {
                warn!(%label, error = %err, "Key constraint creation failed");
                errors.push(LoadError::from(err));
            }
        }
        info!(failed = errors.len(), "Constraint phase finished");
        errors
    }

    async fn create_indexes(&self) -> Vec<LoadError> {
        let mut errors = Vec::new();
        for label in Label::ALL {
            if let Err(err) = self.store.create_index(label).await {
                warn!(%label, error = %err, "Index creation failed");
                errors.push(LoadError::from(err));
            }
        }
        info!(failed = errors.len(), "Index phase finished");
        errors
    }

    /// One task per row position in `positions`
    ///
    /// # Returns
    /// Relation upserts attempted, and every failure
    async fn create_relations(
        &self,
        rows: Arc<Vec<MovieRow>>,
        positions: Vec<usize>,
    ) -> (usize, Vec<LoadError>) {
        let phase_start = Instant::now();
        let builder = RelationBuilder::new(Arc::clone(&self.store));

        let skipped = rows.len() - positions.len();
        if skipped > 0 {
            debug!(skipped, "Skipping malformed rows in relation phase");
        }

        let results = self
            .pool
            .run_all(positions, move |position| {
                let builder = builder.clone();
                let rows = Arc::clone(&rows);
                async move { Ok::<RowReport, LoadError>(builder.build_for_row(&rows[position]).await) }
            })
            .await;

        let mut attempted = 0;
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(report) => {
                    attempted += report.attempted;
                    errors.extend(report.errors);
                }
                Err(err) => errors.push(err),
            }
        }

        info!(
            attempted,
            failed = errors.len(),
            "Relation phase finished in {:.2?}",
            phase_start.elapsed()
        );
        (attempted, errors)
    }
}

fn collect_errors<T>(results: Vec<Result<T, LoadError>>) -> Vec<LoadError> {
    results.into_iter().filter_map(Result::err).collect()
}
