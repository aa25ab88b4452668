//! # Data Loader Crate
//!
//! This crate reads the crawled movie dataset and prepares it for the graph.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (MovieRow, Column, EntityKind, Genre)
//! - **parser**: CSV reading and list-literal cell decoding
//! - **entities**: Deduplicated entity sets across the whole dataset
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{extract_entities, read_rows, EntityKind};
//! use std::path::Path;
//!
//! let rows = read_rows(Path::new("crawled_movie.csv"))?;
//! let extraction = extract_entities(&rows);
//!
//! println!("{} actors", extraction.entities.count(EntityKind::Actor));
//! for error in &extraction.malformed {
//!     eprintln!("{}", error);
//! }
//! ```

// Public modules
pub mod entities;
pub mod error;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use entities::{extract_entities, EntitySets, Extraction};
pub use error::{DataLoadError, Result};
pub use parser::{read_rows, read_rows_from_reader};
pub use types::{
    // Type aliases
    RowId,
    // Core types
    Column,
    EntityKind,
    EntityRef,
    Genre,
    MovieRow,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_entities_in_column_order() {
        let row = MovieRow::new("Heat")
            .with_list(Column::Cast, &["Al Pacino"])
            .with_list(Column::PrincipleCast, &["Al Pacino"])
            .with_list(Column::Director, &["Michael Mann"])
            .with_list(Column::Writers, &["Michael Mann"])
            .with_list(Column::Genres, &["Crime"]);

        let kinds: Vec<EntityKind> = row.entities().unwrap().into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntityKind::Actor,
                EntityKind::Actor,
                EntityKind::Director,
                EntityKind::Writer,
                EntityKind::Genre,
            ]
        );
    }

    #[test]
    fn test_names_are_trimmed_and_blank_names_dropped() {
        let row = MovieRow::new("Heat").with_raw(Column::Cast, "[' Al Pacino ', '', '  ']");
        assert_eq!(row.names(Column::Cast).unwrap(), vec!["Al Pacino"]);
    }

    #[test]
    fn test_malformed_cell_reports_context() {
        let row = MovieRow::new("Heat").at(7).with_raw(Column::Writers, "Michael Mann");
        match row.entities() {
            Err(DataLoadError::MalformedCell { row, title, column, .. }) => {
                assert_eq!(row, 7);
                assert_eq!(title, "Heat");
                assert_eq!(column, Column::Writers);
            }
            other => panic!("expected a malformed cell error, got {:?}", other),
        }
    }

    #[test]
    fn test_genre_vocabulary_lookup() {
        assert_eq!(Genre::from_name("Film-Noir"), Some(Genre::FilmNoir));
        assert_eq!(Genre::from_name("Genre"), Some(Genre::Placeholder));
        assert_eq!(Genre::from_name("Heist"), None);
        assert_eq!(Genre::vocabulary().count(), Genre::ALL.len());
    }
}
