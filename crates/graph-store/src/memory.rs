//! In-process graph store.
//!
//! Used as the test double for everything above the store, and by the CLI's
//! `--in-memory` mode. All state sits behind one `RwLock`, so each merge is
//! a single critical section and concurrent merges of the same key converge
//! on one node.

use crate::error::Result;
use crate::model::{
    GraphStats, Label, MovieNode, NodeSpec, Properties, PropertyValue, Recommendation,
    RelationSpec, RelationType,
};
use crate::store::GraphStore;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;
use tracing::trace;

type NodeKey = (Label, String);

#[derive(Debug, Default)]
struct State {
    nodes: BTreeMap<NodeKey, Properties>,
    relations: BTreeSet<RelationSpec>,
    indexes: BTreeSet<Label>,
    unique_keys: BTreeSet<Label>,
}

impl State {
    /// Nodes holding any of `relations` towards the movie `title`
    fn tails_of(&self, title: &str, relations: &[RelationType]) -> BTreeSet<NodeKey> {
        self.relations
            .iter()
            .filter(|rel| rel.head_key == title && relations.contains(&rel.relation))
            .map(|rel| (rel.tail_label, rel.tail_key.clone()))
            .collect()
    }
}

/// Graph store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes carrying `label`
    pub async fn node_count(&self, label: Label) -> usize {
        let state = self.state.read().await;
        state.nodes.keys().filter(|(l, _)| *l == label).count()
    }

    pub async fn has_node(&self, label: Label, key: &str) -> bool {
        let state = self.state.read().await;
        state.nodes.contains_key(&(label, key.to_string()))
    }

    pub async fn has_relation(&self, relation: &RelationSpec) -> bool {
        self.state.read().await.relations.contains(relation)
    }

    /// Number of relationships of one type
    pub async fn relation_count(&self, relation: RelationType) -> usize {
        let state = self.state.read().await;
        state
            .relations
            .iter()
            .filter(|rel| rel.relation == relation)
            .count()
    }

    /// Properties stored on a node, if it exists
    pub async fn node_properties(&self, label: Label, key: &str) -> Option<Properties> {
        let state = self.state.read().await;
        state.nodes.get(&(label, key.to_string())).cloned()
    }

    /// Convenience for tests: the text value of a node property
    pub async fn text_property(&self, label: Label, key: &str, property: &str) -> Option<String> {
        match self.node_properties(label, key).await?.get(property) {
            Some(PropertyValue::Text(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Labels with an index on their natural key
    pub async fn indexes(&self) -> Vec<Label> {
        self.state.read().await.indexes.iter().copied().collect()
    }

    /// Labels whose natural key is declared unique
    pub async fn unique_keys(&self) -> Vec<Label> {
        self.state.read().await.unique_keys.iter().copied().collect()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn merge_node(&self, node: &NodeSpec) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .nodes
            .entry((node.label, node.key.clone()))
            .or_insert_with(|| {
                trace!(label = %node.label, key = %node.key, "Created node");
                node.properties.clone()
            });
        Ok(())
    }

    async fn merge_relation(&self, relation: &RelationSpec) -> Result<bool> {
        let mut state = self.state.write().await;

        let tail = (relation.tail_label, relation.tail_key.clone());
        let head = (Label::Movie, relation.head_key.clone());
        if !state.nodes.contains_key(&tail) || !state.nodes.contains_key(&head) {
            return Ok(false);
        }

        if state.relations.insert(relation.clone()) {
            trace!(
                relation = %relation.relation,
                tail = %relation.tail_key,
                head = %relation.head_key,
                "Created relationship"
            );
        }
        Ok(true)
    }

    async fn create_unique_key(&self, label: Label) -> Result<()> {
        // Keys are already unique here: nodes are a map keyed by (label, key)
        self.state.write().await.unique_keys.insert(label);
        Ok(())
    }

    async fn create_index(&self, label: Label) -> Result<()> {
        self.state.write().await.indexes.insert(label);
        Ok(())
    }

    async fn stats(&self) -> Result<GraphStats> {
        let state = self.state.read().await;
        Ok(GraphStats {
            nodes: state.nodes.len() as u64,
            relationships: state.relations.len() as u64,
        })
    }

    async fn co_occurring_movies(&self, title: &str, threshold: u32) -> Result<Vec<Recommendation>> {
        let state = self.state.read().await;

        if !state.nodes.contains_key(&(Label::Movie, title.to_string())) {
            return Ok(Vec::new());
        }

        let people = state.tails_of(title, &RelationType::COLLABORATION);
        let genres = state.tails_of(title, &[RelationType::Genre]);

        // candidate title -> (distinct shared people, distinct shared genres)
        let mut shared: HashMap<&str, (BTreeSet<&NodeKey>, BTreeSet<&NodeKey>)> = HashMap::new();
        for rel in state.relations.iter().filter(|rel| rel.head_key != title) {
            let tail = (rel.tail_label, rel.tail_key.clone());
            if rel.relation.is_collaboration() {
                if let Some(person) = people.get(&tail) {
                    shared.entry(rel.head_key.as_str()).or_default().0.insert(person);
                }
            } else if let Some(genre) = genres.get(&tail) {
                shared.entry(rel.head_key.as_str()).or_default().1.insert(genre);
            }
        }

        let mut recommendations: Vec<Recommendation> = shared
            .into_iter()
            .filter(|(_, (p, g))| !p.is_empty() && !g.is_empty())
            .map(|(candidate, (p, g))| {
                let properties = state
                    .nodes
                    .get(&(Label::Movie, candidate.to_string()))
                    .cloned()
                    .unwrap_or_default();
                Recommendation {
                    movie: MovieNode::from_properties(candidate, &properties),
                    shared_people: p.len() as u32,
                    shared_genres: g.len() as u32,
                }
            })
            .filter(|rec| rec.score() > threshold)
            .collect();

        recommendations.sort_by(|a, b| {
            b.score()
                .cmp(&a.score())
                .then_with(|| a.movie.title.cmp(&b.movie.title))
        });
        Ok(recommendations)
    }
}
