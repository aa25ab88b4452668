//! The `GraphStore` trait: everything the loader and the recommender need
//! from a property-graph database.

use crate::error::Result;
use crate::model::{GraphStats, Label, NodeSpec, Recommendation, RelationSpec};
use async_trait::async_trait;

/// Property-graph store driven by the loader and the recommendation engine.
///
/// ## Design Note
/// - Every method is one atomic unit at the store level; nothing spans calls
/// - `merge_node` and `merge_relation` must be create-if-absent primitives,
///   never a read followed by a write, so concurrent callers converge
/// - `Send + Sync` lets one store be shared by every worker task
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Ensure a node with this (label, key) exists.
    ///
    /// Properties are only written when the node is created; calling again
    /// with the same key is a no-op.
    async fn merge_node(&self, node: &NodeSpec) -> Result<()>;

    /// Ensure the relationship exists between two existing nodes.
    ///
    /// # Returns
    /// * `Ok(true)` - both endpoints matched; the relationship now exists
    /// * `Ok(false)` - an endpoint is missing; nothing was written
    async fn merge_relation(&self, relation: &RelationSpec) -> Result<bool>;

    /// Declare a label's natural key unique (idempotent)
    ///
    /// Called before any node of the label is merged. On a store where
    /// `MERGE` is not atomic across sessions this is what keeps two
    /// concurrent merges of one key from creating two nodes.
    async fn create_unique_key(&self, label: Label) -> Result<()>;

    /// Create the secondary index on a label's natural key (idempotent)
    ///
    /// A no-op where the key is already covered by a unique key.
    async fn create_index(&self, label: Label) -> Result<()>;

    /// Total node and relationship counts
    async fn stats(&self) -> Result<GraphStats>;

    /// Movies sharing collaborators and genres with `title`.
    ///
    /// Returns every movie M (other than `title`) with at least one person
    /// credited on both movies and at least one genre attached to both, whose
    /// `distinct people + distinct genres` is strictly above `threshold`.
    /// An unknown title yields an empty list.
    async fn co_occurring_movies(&self, title: &str, threshold: u32) -> Result<Vec<Recommendation>>;
}
