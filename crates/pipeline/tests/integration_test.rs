//! Integration tests for the pipeline.
//!
//! These tests drive node upserts and relation building against the
//! in-memory store, the way the loader does.

use data_loader::{Column, EntityKind, MovieRow};
use graph_store::{GraphStore, Label, MemoryStore, RelationSpec, RelationType};
use pipeline::{LoadError, NodeUpsertService, RelationBuilder, WorkerPool};
use std::sync::Arc;

fn heat() -> MovieRow {
    MovieRow::new("Heat")
        .with_list(Column::Cast, &["Al Pacino", "Robert De Niro"])
        .with_list(Column::PrincipleCast, &["Al Pacino"])
        .with_list(Column::Director, &["Michael Mann"])
        .with_list(Column::Writers, &["Michael Mann"])
        .with_list(Column::Genres, &["Crime", "Drama"])
}

async fn upsert_all(store: &Arc<MemoryStore>, row: &MovieRow) {
    let upserts = NodeUpsertService::new(Arc::clone(store));
    upserts.upsert_movie(row).await.unwrap();
    for entity in row.entities().unwrap() {
        upserts.upsert_entity(entity.kind, &entity.name).await.unwrap();
    }
}

#[tokio::test]
async fn test_row_relations_after_nodes() {
    let store = Arc::new(MemoryStore::new());
    let row = heat();
    upsert_all(&store, &row).await;

    let report = RelationBuilder::new(Arc::clone(&store)).build_for_row(&row).await;

    // 2 cast + 1 principal cast + 1 director + 1 writer + 2 genres
    assert_eq!(report.attempted, 7);
    assert!(report.errors.is_empty());
    // Al Pacino is listed twice but gets one edge
    assert_eq!(store.relation_count(RelationType::ActedIn).await, 2);
    assert!(
        store
            .has_relation(&RelationSpec::new(
                RelationType::Written,
                Label::Writer,
                "Michael Mann",
                "Heat"
            ))
            .await
    );
}

#[tokio::test]
async fn test_relations_without_nodes_report_missing_endpoints() {
    let store = Arc::new(MemoryStore::new());
    let report = RelationBuilder::new(Arc::clone(&store)).build_for_row(&heat()).await;

    assert_eq!(report.attempted, 7);
    assert_eq!(report.errors.len(), 7);
    assert!(
        report
            .errors
            .iter()
            .all(|err| matches!(err, LoadError::MissingEndpoint { .. }))
    );
    assert_eq!(store.stats().await.unwrap().relationships, 0);
}

#[tokio::test]
async fn test_malformed_row_yields_one_error_and_no_upserts() {
    let store = Arc::new(MemoryStore::new());
    let row = heat().with_raw(Column::Director, "Michael Mann");

    let report = RelationBuilder::new(Arc::clone(&store)).build_for_row(&row).await;

    assert_eq!(report.attempted, 0);
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(report.errors[0], LoadError::MalformedRow(_)));
}

#[tokio::test]
async fn test_quoted_title_survives_node_and_relation() {
    let store = Arc::new(MemoryStore::new());
    let row = MovieRow::new("Ocean's Eleven")
        .with_list(Column::Cast, &["George Clooney"])
        .with_list(Column::Genres, &["Crime"]);
    upsert_all(&store, &row).await;

    let report = RelationBuilder::new(Arc::clone(&store)).build_for_row(&row).await;

    assert!(report.errors.is_empty());
    assert!(store.has_node(Label::Movie, "Ocean's Eleven").await);
    assert!(
        store
            .has_relation(&RelationSpec::new(
                RelationType::ActedIn,
                Label::Actor,
                "George Clooney",
                "Ocean's Eleven"
            ))
            .await
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_through_the_pool() {
    let store = Arc::new(MemoryStore::new());
    let upserts = NodeUpsertService::new(Arc::clone(&store));

    // The same 5 actors, 10 times over
    let names: Vec<String> = (0..50).map(|i| format!("Actor {}", i % 5)).collect();
    let results = WorkerPool::new(8)
        .run_all(names, move |name| {
            let upserts = upserts.clone();
            async move { upserts.upsert_entity(EntityKind::Actor, &name).await }
        })
        .await;

    assert_eq!(results.len(), 50);
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(store.node_count(Label::Actor).await, 5);
}
