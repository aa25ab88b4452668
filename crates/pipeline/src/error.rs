//! Error taxonomy of a graph load.
//!
//! None of these abort a load by themselves: every failed task turns into
//! one `LoadError` value collected into the load result.

use data_loader::DataLoadError;
use graph_store::{Label, RelationType, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    /// A row had a multi-valued cell that is not a list literal
    #[error(transparent)]
    MalformedRow(DataLoadError),

    /// The store rejected a statement or could not be reached
    #[error("Graph store error: {0}")]
    Store(#[from] StoreError),

    /// Relation upsert found no tail or no head node to connect
    #[error("Cannot create {relation}: no {tail_label} {tail_key:?} or Movie {head_key:?}")]
    MissingEndpoint {
        relation: RelationType,
        tail_label: Label,
        tail_key: String,
        head_key: String,
    },

    /// A worker task panicked or the pool was shut down
    #[error("Worker task failed: {0}")]
    TaskFailed(String),
}

impl LoadError {
    /// True when the error means the store itself is gone
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, LoadError::Store(err) if err.is_unavailable())
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, LoadError>;
