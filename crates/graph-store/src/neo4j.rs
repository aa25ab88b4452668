//! Neo4j-backed store speaking Bolt through `neo4rs`.

use crate::cypher::{self, Statement};
use crate::error::{Result, StoreError};
use crate::model::{
    movie_property, GraphStats, Label, MovieNode, NodeSpec, PropertyValue, Recommendation,
    RelationSpec,
};
use crate::store::GraphStore;
use async_trait::async_trait;
use neo4rs::{query, BoltType, ConfigBuilder, Graph, Node, Query, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Connection settings for the Neo4j server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Size of the Bolt connection pool; should be at least the worker count
    pub max_connections: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            max_connections: 16,
        }
    }
}

impl StoreConfig {
    pub fn new(uri: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            user: user.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Set the pool size (builder pattern)
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }
}

/// Graph store backed by a Neo4j server
///
/// `neo4rs::Graph` is a cheap handle over a connection pool; each call
/// borrows one connection for the duration of a single auto-commit
/// statement.
pub struct Neo4jStore {
    graph: Graph,
    uri: String,
}

impl Neo4jStore {
    /// Open the connection pool
    ///
    /// # Errors
    /// `StoreError::Unavailable` when the server cannot be reached or
    /// rejects the credentials.
    #[instrument(skip(config), fields(uri = %config.uri))]
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let bolt_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .max_connections(config.max_connections)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let graph = Graph::connect(bolt_config)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", config.uri, e)))?;

        info!("Connected to Neo4j");
        Ok(Self {
            graph,
            uri: config.uri.clone(),
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Run a statement, discarding any result rows
    async fn run(&self, statement: &Statement) -> Result<()> {
        self.graph
            .run(to_query(statement))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    /// Run a statement and collect every result row
    async fn fetch(&self, statement: &Statement) -> Result<Vec<Row>> {
        let mut stream = self
            .graph
            .execute(to_query(statement))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut rows = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
        {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Single integer column from the first row
    async fn fetch_count(&self, statement: &Statement, column: &str) -> Result<i64> {
        let rows = self.fetch(statement).await?;
        let row = rows
            .first()
            .ok_or_else(|| StoreError::InvalidResponse(format!("no row for {}", column)))?;
        row.get::<i64>(column)
            .map_err(|e| StoreError::InvalidResponse(format!("{}: {}", column, e)))
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    fn name(&self) -> &str {
        "neo4j"
    }

    async fn merge_node(&self, node: &NodeSpec) -> Result<()> {
        self.run(&cypher::merge_node(node)).await
    }

    async fn merge_relation(&self, relation: &RelationSpec) -> Result<bool> {
        let matched = self
            .fetch_count(&cypher::merge_relation(relation), "matched")
            .await?;
        Ok(matched > 0)
    }

    async fn create_unique_key(&self, label: Label) -> Result<()> {
        debug!(%label, "Creating key constraint");
        self.run(&cypher::create_unique_key(label)).await
    }

    async fn create_index(&self, label: Label) -> Result<()> {
        // Neo4j rejects a plain index on a property a constraint already indexes
        let existing = self
            .fetch_count(&cypher::key_index_count(label), "existing")
            .await?;
        if existing > 0 {
            debug!(%label, "Key already indexed");
            return Ok(());
        }
        debug!(%label, "Creating index");
        self.run(&cypher::create_index(label)).await
    }

    async fn stats(&self) -> Result<GraphStats> {
        let nodes = self.fetch_count(&cypher::count_nodes(), "nodes").await?;
        let relationships = self
            .fetch_count(&cypher::count_relationships(), "relationships")
            .await?;
        Ok(GraphStats {
            nodes: nodes.max(0) as u64,
            relationships: relationships.max(0) as u64,
        })
    }

    async fn co_occurring_movies(&self, title: &str, threshold: u32) -> Result<Vec<Recommendation>> {
        let rows = self
            .fetch(&cypher::co_occurring_movies(title, threshold))
            .await?;

        rows.iter()
            .map(|row| {
                let node: Node = row
                    .get("rec")
                    .map_err(|e| StoreError::InvalidResponse(format!("rec: {}", e)))?;
                let people: i64 = row
                    .get("people")
                    .map_err(|e| StoreError::InvalidResponse(format!("people: {}", e)))?;
                let genres: i64 = row
                    .get("genres")
                    .map_err(|e| StoreError::InvalidResponse(format!("genres: {}", e)))?;

                Ok(Recommendation {
                    movie: movie_from_node(&node)?,
                    shared_people: people.max(0) as u32,
                    shared_genres: genres.max(0) as u32,
                })
            })
            .collect()
    }
}

// =============================================================================
// Conversions
// =============================================================================

fn to_query(statement: &Statement) -> Query {
    statement
        .params()
        .iter()
        .fold(query(statement.text()), |q, (name, value)| {
            q.param(name.as_str(), to_bolt(value))
        })
}

fn to_bolt(value: &PropertyValue) -> BoltType {
    match value {
        PropertyValue::Text(text) => BoltType::from(text.clone()),
        PropertyValue::Integer(number) => BoltType::from(*number),
        PropertyValue::Float(number) => BoltType::from(*number),
        PropertyValue::TextList(items) => BoltType::from(items.clone()),
    }
}

/// Read a Movie node; only the title is mandatory
fn movie_from_node(node: &Node) -> Result<MovieNode> {
    let title = node
        .get::<String>(movie_property::TITLE)
        .map_err(|e| StoreError::InvalidResponse(format!("movie without title: {}", e)))?;

    Ok(MovieNode {
        title,
        user_score: node.get::<f64>(movie_property::USER_SCORE).ok(),
        runtime: node.get::<String>(movie_property::RUNTIME).ok(),
        languages: node
            .get::<Vec<String>>(movie_property::LANGUAGES)
            .unwrap_or_default(),
        metascore: node.get::<f64>(movie_property::METASCORE).ok(),
        genres: node
            .get::<Vec<String>>(movie_property::GENRES)
            .unwrap_or_default(),
        countries: node
            .get::<Vec<String>>(movie_property::COUNTRIES)
            .unwrap_or_default(),
        url: node.get::<String>(movie_property::URL).ok(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.uri, "bolt://localhost:7687");
        assert_eq!(config.user, "neo4j");
        assert_eq!(config.max_connections, 16);
    }

    #[test]
    fn test_store_config_builder() {
        let config = StoreConfig::new("bolt://db:7687", "reader", "secret").with_max_connections(0);
        assert_eq!(config.uri, "bolt://db:7687");
        assert_eq!(config.password, "secret");
        assert_eq!(config.max_connections, 1);
    }

    #[test]
    fn test_store_config_partial_deserialize() {
        let config: StoreConfig = serde_json::from_str(r#"{"uri": "bolt://graph:7687"}"#).unwrap();
        assert_eq!(config.uri, "bolt://graph:7687");
        assert_eq!(config.user, "neo4j");
    }
}
