//! A store that records Cypher instead of executing it.
//!
//! `movie-graph export` drives the normal loader against a `ScriptStore` and
//! writes the recorded statements out as a script for `cypher-shell`. Values
//! are rendered as escaped literals because a script has no parameter
//! channel.

use crate::cypher;
use crate::error::{Result, StoreError};
use crate::model::{GraphStats, Label, NodeSpec, Recommendation, RelationSpec};
use crate::store::GraphStore;
use async_trait::async_trait;
use std::collections::BTreeSet;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Recorded {
    statements: Vec<String>,
    nodes: BTreeSet<(Label, String)>,
    relations: BTreeSet<RelationSpec>,
    unique_keys: BTreeSet<Label>,
}

/// Records one statement per write, in call order
///
/// Node and relationship identities are tracked so that `stats` reflects
/// what the script will create and `merge_relation` can report missing
/// endpoints exactly like a live store.
#[derive(Debug, Default)]
pub struct ScriptStore {
    recorded: Mutex<Recorded>,
}

impl ScriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements recorded so far
    pub async fn statements(&self) -> Vec<String> {
        self.recorded.lock().await.statements.clone()
    }

    /// The whole script, one `;`-terminated statement per line
    pub fn into_script(self) -> String {
        let recorded = self.recorded.into_inner();
        let mut script = String::new();
        for statement in recorded.statements {
            script.push_str(&statement);
            script.push_str(";\n");
        }
        script
    }
}

#[async_trait]
impl GraphStore for ScriptStore {
    fn name(&self) -> &str {
        "script"
    }

    async fn merge_node(&self, node: &NodeSpec) -> Result<()> {
        let rendered = cypher::merge_node(node).render_inline();
        let mut recorded = self.recorded.lock().await;
        if recorded.nodes.insert((node.label, node.key.clone())) {
            recorded.statements.push(rendered);
        }
        Ok(())
    }

    async fn merge_relation(&self, relation: &RelationSpec) -> Result<bool> {
        let mut recorded = self.recorded.lock().await;
        let tail = (relation.tail_label, relation.tail_key.clone());
        let head = (Label::Movie, relation.head_key.clone());
        if !recorded.nodes.contains(&tail) || !recorded.nodes.contains(&head) {
            return Ok(false);
        }
        if recorded.relations.insert(relation.clone()) {
            let rendered = cypher::merge_relation(relation).render_inline();
            recorded.statements.push(rendered);
        }
        Ok(true)
    }

    async fn create_unique_key(&self, label: Label) -> Result<()> {
        let mut recorded = self.recorded.lock().await;
        if recorded.unique_keys.insert(label) {
            let rendered = cypher::create_unique_key(label).render_inline();
            recorded.statements.push(rendered);
        }
        Ok(())
    }

    async fn create_index(&self, label: Label) -> Result<()> {
        let mut recorded = self.recorded.lock().await;
        // The constraint's own index covers the key
        if !recorded.unique_keys.contains(&label) {
            let rendered = cypher::create_index(label).render_inline();
            recorded.statements.push(rendered);
        }
        Ok(())
    }

    async fn stats(&self) -> Result<GraphStats> {
        let recorded = self.recorded.lock().await;
        Ok(GraphStats {
            nodes: recorded.nodes.len() as u64,
            relationships: recorded.relations.len() as u64,
        })
    }

    async fn co_occurring_movies(&self, _title: &str, _threshold: u32) -> Result<Vec<Recommendation>> {
        Err(StoreError::Unsupported("recommendations need a live graph"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RelationType;

    #[tokio::test]
    async fn test_records_each_identity_once() {
        let store = ScriptStore::new();
        store.merge_node(&NodeSpec::new(Label::Movie, "Heat")).await.unwrap();
        store.merge_node(&NodeSpec::new(Label::Movie, "Heat")).await.unwrap();
        store.merge_node(&NodeSpec::new(Label::Actor, "Al Pacino")).await.unwrap();

        let relation = RelationSpec::new(RelationType::ActedIn, Label::Actor, "Al Pacino", "Heat");
        assert!(store.merge_relation(&relation).await.unwrap());
        assert!(store.merge_relation(&relation).await.unwrap());

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.nodes, 2);
        assert_eq!(stats.relationships, 1);
        assert_eq!(store.statements().await.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_not_recorded() {
        let store = ScriptStore::new();
        let relation = RelationSpec::new(RelationType::Genre, Label::Genre, "Crime", "Heat");
        assert!(!store.merge_relation(&relation).await.unwrap());
        assert!(store.statements().await.is_empty());
    }

    #[tokio::test]
    async fn test_script_escapes_titles() {
        let store = ScriptStore::new();
        store.merge_node(&NodeSpec::new(Label::Movie, "Ocean's Eleven")).await.unwrap();

        let script = store.into_script();
        assert_eq!(script, "MERGE (n:Movie {Title: 'Ocean\\'s Eleven'});\n");
    }

    #[tokio::test]
    async fn test_unique_key_replaces_index() {
        let store = ScriptStore::new();
        store.create_unique_key(Label::Movie).await.unwrap();
        store.create_unique_key(Label::Movie).await.unwrap();
        store.create_index(Label::Movie).await.unwrap();
        store.create_index(Label::Genre).await.unwrap();

        assert_eq!(
            store.statements().await,
            vec![
                "CREATE CONSTRAINT movie_title_unique IF NOT EXISTS FOR (n:Movie) REQUIRE n.Title IS UNIQUE"
                    .to_string(),
                "CREATE INDEX genre_name_index IF NOT EXISTS FOR (n:Genre) ON (n.name)".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_recommendations_unsupported() {
        let store = ScriptStore::new();
        let err = store.co_occurring_movies("Heat", 4).await.unwrap_err();
        assert!(matches!(err, StoreError::Unsupported(_)));
    }
}
