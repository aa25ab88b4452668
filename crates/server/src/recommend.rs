//! Recommendation Engine.
//!
//! A movie is recommended for X when it shares at least one collaborator
//! (actor, director or writer) and at least one genre with X, and the
//! number of distinct shared people plus distinct shared genres is strictly
//! greater than the threshold.

use graph_store::{GraphStore, Recommendation, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Score a candidate must exceed to be recommended
pub const DEFAULT_THRESHOLD: u32 = 4;

pub struct RecommendationEngine<S: GraphStore + ?Sized> {
    store: Arc<S>,
    threshold: u32,
}

impl<S: GraphStore + ?Sized> Clone for RecommendationEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            threshold: self.threshold,
        }
    }
}

impl<S: GraphStore + ?Sized> RecommendationEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Override the score threshold (builder pattern)
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Movies related to `title`, best first
    ///
    /// # Returns
    /// * `Ok(vec)` - ordered by score descending, then title; empty when the
    ///   title is unknown or nothing clears the threshold
    /// * `Err(StoreError)` - the store could not answer
    #[instrument(skip(self), fields(store = self.store.name(), threshold = self.threshold))]
    pub async fn recommend(&self, title: &str) -> Result<Vec<Recommendation>> {
        let start = Instant::now();

        let mut recommendations = self.store.co_occurring_movies(title, self.threshold).await?;
        recommendations.retain(|rec| rec.movie.title != title);

        info!(
            count = recommendations.len(),
            elapsed = ?start.elapsed(),
            "Recommendations ready"
        );
        Ok(recommendations)
    }
}
