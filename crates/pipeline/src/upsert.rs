//! Node Upsert Service.
//!
//! Turns dataset rows and extracted entities into node upserts. Creation is
//! delegated to the store's merge primitive; this layer never checks for
//! existence first, so any number of concurrent callers converge on one node.

use crate::error::Result;
use data_loader::{EntityKind, MovieRow};
use graph_store::{movie_property, GraphStore, Label, NodeSpec};
use std::sync::Arc;
use tracing::trace;

/// Node label of an entity category
pub fn label_for(kind: EntityKind) -> Label {
    match kind {
        EntityKind::Actor => Label::Actor,
        EntityKind::Director => Label::Director,
        EntityKind::Writer => Label::Writer,
        EntityKind::Genre => Label::Genre,
    }
}

/// Upserts nodes into a shared store
pub struct NodeUpsertService<S: GraphStore + ?Sized> {
    store: Arc<S>,
}

// Manual impl: `derive(Clone)` would require `S: Clone`
impl<S: GraphStore + ?Sized> Clone for NodeUpsertService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: GraphStore + ?Sized> NodeUpsertService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Ensure the node exists; properties are only applied on creation
    ///
    /// # Returns
    /// * `Ok(())` - the node exists (created now or earlier)
    /// * `Err(LoadError::Store)` - the store failed the merge
    pub async fn upsert_node(&self, node: &NodeSpec) -> Result<()> {
        trace!(label = %node.label, key = %node.key, "Upserting node");
        self.store.merge_node(node).await?;
        Ok(())
    }

    /// Upsert the Movie node of a row
    pub async fn upsert_movie(&self, row: &MovieRow) -> Result<()> {
        self.upsert_node(&movie_node(row)).await
    }

    /// Upsert one deduplicated entity
    pub async fn upsert_entity(&self, kind: EntityKind, name: &str) -> Result<()> {
        self.upsert_node(&entity_node(kind, name)).await
    }
}

/// Movie node for a row, keyed by title
///
/// Numeric cells that were missing or unparseable are left out rather than
/// stored as null; list cells are decoded leniently.
pub fn movie_node(row: &MovieRow) -> NodeSpec {
    let mut node = NodeSpec::new(Label::Movie, row.title.as_str())
        .with_property(movie_property::LANGUAGES, row.language_list())
        .with_property(movie_property::GENRES, row.genre_list())
        .with_property(movie_property::COUNTRIES, row.country_list());

    if let Some(score) = row.user_score {
        node = node.with_property(movie_property::USER_SCORE, score);
    }
    if let Some(score) = row.metascore {
        node = node.with_property(movie_property::METASCORE, score);
    }
    if let Some(runtime) = row.runtime.as_deref().filter(|r| !r.trim().is_empty()) {
        node = node.with_property(movie_property::RUNTIME, runtime);
    }
    if let Some(url) = row.url.as_deref().filter(|u| !u.trim().is_empty()) {
        node = node.with_property(movie_property::URL, url);
    }
    node
}

/// Person or Genre node; `name` is its only property
pub fn entity_node(kind: EntityKind, name: &str) -> NodeSpec {
    NodeSpec::new(label_for(kind), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Column;
    use graph_store::PropertyValue;

    #[test]
    fn test_movie_node_properties() {
        let row = MovieRow::new("Heat")
            .with_user_score(8.3)
            .with_runtime("170")
            .with_url("https://example.org/heat")
            .with_list(Column::Languages, &["English", "Spanish"])
            .with_list(Column::Genres, &["Crime", "Drama"]);

        let node = movie_node(&row);

        assert_eq!(node.label, Label::Movie);
        assert_eq!(node.key, "Heat");
        assert_eq!(
            node.properties.get(movie_property::USER_SCORE),
            Some(&PropertyValue::Float(8.3))
        );
        assert_eq!(
            node.properties.get(movie_property::LANGUAGES),
            Some(&PropertyValue::TextList(vec!["English".into(), "Spanish".into()]))
        );
        assert_eq!(
            node.properties.get(movie_property::RUNTIME),
            Some(&PropertyValue::Text("170".into()))
        );
    }

    #[test]
    fn test_movie_node_omits_missing_numbers() {
        let node = movie_node(&MovieRow::new("Heat"));
        assert!(!node.properties.contains_key(movie_property::USER_SCORE));
        assert!(!node.properties.contains_key(movie_property::METASCORE));
        assert!(!node.properties.contains_key(movie_property::URL));
    }

    #[test]
    fn test_entity_node_labels() {
        assert_eq!(entity_node(EntityKind::Actor, "Al Pacino").label, Label::Actor);
        assert_eq!(entity_node(EntityKind::Writer, "Michael Mann").label, Label::Writer);
        let genre = entity_node(EntityKind::Genre, "Crime");
        assert_eq!(genre.label, Label::Genre);
        assert!(genre.properties.is_empty());
    }
}
