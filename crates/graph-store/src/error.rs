//! Errors raised while talking to the graph store.

use thiserror::Error;

/// Errors that can occur when interacting with the graph store
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Connection could not be opened or was lost mid-session
    #[error("Graph store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected or failed a statement
    #[error("Query failed: {0}")]
    Query(String),

    /// A result row did not have the expected shape
    #[error("Invalid response from graph store: {0}")]
    InvalidResponse(String),

    /// The operation makes no sense for this store implementation
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl StoreError {
    /// True when the failure is about reaching the store at all
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, StoreError>;
