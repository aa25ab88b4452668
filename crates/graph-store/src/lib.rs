//! # Graph Store Crate
//!
//! Persistence seam for the movie graph.
//!
//! ## Main Components
//!
//! - **store**: The `GraphStore` trait the loader and recommender are written against
//! - **model**: Labels, relationship types, property values, read results
//! - **cypher**: Parameterized Cypher builders and literal escaping
//! - **neo4j**: `Neo4jStore`, the production implementation over Bolt
//! - **memory**: `MemoryStore`, an in-process implementation for tests and dry runs
//! - **script**: `ScriptStore`, records statements for export to a `.cypher` file
//!
//! ## Example Usage
//!
//! ```ignore
//! use graph_store::{GraphStore, Label, MemoryStore, NodeSpec};
//!
//! let store = MemoryStore::new();
//! store.merge_node(&NodeSpec::new(Label::Movie, "Heat")).await?;
//! assert_eq!(store.stats().await?.nodes, 1);
//! ```

pub mod cypher;
pub mod error;
pub mod memory;
pub mod model;
pub mod neo4j;
pub mod script;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use model::{
    movie_property, GraphStats, Label, MovieNode, NodeSpec, Properties, PropertyValue,
    Recommendation, RelationSpec, RelationType, NAME_PROPERTY,
};
pub use neo4j::{Neo4jStore, StoreConfig};
pub use script::ScriptStore;
pub use store::GraphStore;
