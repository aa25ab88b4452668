//! Relation Builder.
//!
//! Connects each row's people and genres to its Movie node. Both endpoints
//! must already exist; the loader only runs this after the node phase.

use crate::error::{LoadError, Result};
use crate::upsert::label_for;
use data_loader::{EntityKind, MovieRow};
use graph_store::{GraphStore, Label, RelationSpec, RelationType};
use std::sync::Arc;
use tracing::{debug, warn};

/// Node label and relationship type used to attach an entity to a movie
pub fn target(kind: EntityKind) -> (Label, RelationType) {
    let relation = match kind {
        EntityKind::Actor => RelationType::ActedIn,
        EntityKind::Director => RelationType::Directed,
        EntityKind::Writer => RelationType::Written,
        EntityKind::Genre => RelationType::Genre,
    };
    (label_for(kind), relation)
}

/// Outcome of building every relationship of one row
#[derive(Debug, Default)]
pub struct RowReport {
    /// Relation upserts issued
    pub attempted: usize,
    pub errors: Vec<LoadError>,
}

pub struct RelationBuilder<S: GraphStore + ?Sized> {
    store: Arc<S>,
}

impl<S: GraphStore + ?Sized> Clone for RelationBuilder<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: GraphStore + ?Sized> RelationBuilder<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Ensure exactly one `tail -[relation]-> Movie(head_key)` edge exists
    ///
    /// # Returns
    /// * `Ok(())` - the edge exists
    /// * `Err(LoadError::MissingEndpoint)` - the tail or the movie is absent
    /// * `Err(LoadError::Store)` - the store failed the statement
    pub async fn ensure_relation(
        &self,
        relation: RelationType,
        tail_label: Label,
        tail_key: &str,
        head_key: &str,
    ) -> Result<()> {
        let spec = RelationSpec::new(relation, tail_label, tail_key, head_key);
        if self.store.merge_relation(&spec).await? {
            Ok(())
        } else {
            Err(LoadError::MissingEndpoint {
                relation,
                tail_label,
                tail_key: tail_key.to_string(),
                head_key: head_key.to_string(),
            })
        }
    }

    /// Build every relationship of one row, collecting failures
    ///
    /// ## Algorithm
    /// 1. Decode the row's entity columns (a malformed row yields one
    ///    `MalformedRow` error and no upserts)
    /// 2. For each cast, principal cast, director, writer and genre entry,
    ///    issue one relation upsert
    /// 3. Keep going after a failed upsert; every failure is reported
    pub async fn build_for_row(&self, row: &MovieRow) -> RowReport {
        let mut report = RowReport::default();

        let entities = match row.entities() {
            Ok(entities) => entities,
            Err(err) => {
                report.errors.push(LoadError::MalformedRow(err));
                return report;
            }
        };

        for entity in entities {
            let (label, relation) = target(entity.kind);
            report.attempted += 1;
            if let Err(err) = self
                .ensure_relation(relation, label, &entity.name, &row.title)
                .await
            {
                warn!(title = %row.title, error = %err, "Relation upsert failed");
                report.errors.push(err);
            }
        }

        debug!(
            title = %row.title,
            attempted = report.attempted,
            failed = report.errors.len(),
            "Row relations built"
        );
        report
    }
}
