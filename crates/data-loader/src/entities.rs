//! Entity extraction: deduplicated people and genres across the whole dataset.
//!
//! Every row is decoded independently, so the work is split across Rayon
//! workers. Each worker folds its share of rows into a private `Partial`
//! and the partials are merged at the end; no set is ever shared between
//! threads while it is being written.

use crate::error::DataLoadError;
use crate::types::{EntityKind, Genre, MovieRow};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, instrument, warn};

/// One deduplicated name set per entity category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySets {
    sets: BTreeMap<EntityKind, BTreeSet<String>>,
}

impl EntitySets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name; returns false if it was already present
    pub fn insert(&mut self, kind: EntityKind, name: impl Into<String>) -> bool {
        self.sets.entry(kind).or_default().insert(name.into())
    }

    /// Names of one category, sorted
    pub fn get(&self, kind: EntityKind) -> impl Iterator<Item = &str> + '_ {
        self.sets
            .get(&kind)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn contains(&self, kind: EntityKind, name: &str) -> bool {
        self.sets.get(&kind).is_some_and(|set| set.contains(name))
    }

    /// Number of names in one category
    pub fn count(&self, kind: EntityKind) -> usize {
        self.sets.get(&kind).map_or(0, BTreeSet::len)
    }

    /// Total number of entities over all categories
    pub fn len(&self) -> usize {
        self.sets.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every (category, name) pair
    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &str)> + '_ {
        self.sets
            .iter()
            .flat_map(|(kind, set)| set.iter().map(move |name| (*kind, name.as_str())))
    }

    /// Make sure every vocabulary genre is present, including the placeholder
    pub fn with_genre_vocabulary(mut self) -> Self {
        for genre in Genre::vocabulary() {
            self.insert(EntityKind::Genre, genre);
        }
        self
    }

    fn merge(&mut self, other: EntitySets) {
        for (kind, names) in other.sets {
            self.sets.entry(kind).or_default().extend(names);
        }
    }
}

/// Result of scanning the dataset
#[derive(Debug, Default)]
pub struct Extraction {
    /// Deduplicated entities of every well-formed row, plus the genre vocabulary
    pub entities: EntitySets,
    /// One error per row whose multi-valued cells could not be decoded
    pub malformed: Vec<DataLoadError>,
    /// Titles used by more than one row
    pub duplicate_titles: Vec<String>,
    /// Positions in the input slice of the rows that contributed nothing
    ///
    /// Kept apart from the errors because `MovieRow::index` is only the
    /// CSV line number when the rows came from `read_rows`.
    pub malformed_positions: BTreeSet<usize>,
}

impl Extraction {
    /// Whether the row at `position` of the scanned slice was malformed
    pub fn is_malformed(&self, position: usize) -> bool {
        self.malformed_positions.contains(&position)
    }
}

/// Per-worker accumulator
#[derive(Default)]
struct Partial {
    entities: EntitySets,
    malformed: Vec<DataLoadError>,
    malformed_positions: BTreeSet<usize>,
    titles: HashMap<String, usize>,
}

impl Partial {
    fn merge(mut self, other: Partial) -> Partial {
        self.entities.merge(other.entities);
        self.malformed.extend(other.malformed);
        self.malformed_positions.extend(other.malformed_positions);
        for (title, count) in other.titles {
            *self.titles.entry(title).or_insert(0) += count;
        }
        self
    }
}

/// Build the deduplicated entity sets for a whole dataset
///
/// ## Algorithm
/// 1. Split rows across Rayon workers
/// 2. Each worker decodes its rows' entity columns into a private `Partial`
///    (a malformed row adds an error and no entities)
/// 3. Reduce the partials pairwise into one
/// 4. Add the genre vocabulary and report duplicate titles
#[instrument(skip(rows), fields(rows = rows.len()))]
pub fn extract_entities(rows: &[MovieRow]) -> Extraction {
    let partial = rows
        .par_iter()
        .enumerate()
        .fold(Partial::default, |mut acc, (position, row)| {
            *acc.titles.entry(row.title.clone()).or_insert(0) += 1;
            match row.entities() {
                Ok(entities) => {
                    for entity in entities {
                        acc.entities.insert(entity.kind, entity.name);
                    }
                }
                Err(error) => {
                    warn!("Skipping entities of row {}: {}", row.index, error);
                    acc.malformed.push(error);
                    acc.malformed_positions.insert(position);
                }
            }
            acc
        })
        .reduce(Partial::default, Partial::merge);

    let mut duplicate_titles: Vec<String> = partial
        .titles
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(title, _)| title)
        .collect();
    duplicate_titles.sort();
    if !duplicate_titles.is_empty() {
        // Merge-on-key keeps whichever row creates the node first.
        warn!(
            "{} titles appear on more than one row; their movie nodes are shared",
            duplicate_titles.len()
        );
    }

    let mut malformed = partial.malformed;
    malformed.sort_by_key(|error| match error {
        DataLoadError::MalformedCell { row, .. } => *row,
        _ => usize::MAX,
    });

    let entities = partial.entities.with_genre_vocabulary();
    debug!(
        "Extracted {} actors, {} directors, {} writers, {} genres",
        entities.count(EntityKind::Actor),
        entities.count(EntityKind::Director),
        entities.count(EntityKind::Writer),
        entities.count(EntityKind::Genre)
    );

    Extraction {
        entities,
        malformed,
        duplicate_titles,
        malformed_positions: partial.malformed_positions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;

    fn sample_rows() -> Vec<MovieRow> {
        vec![
            MovieRow::new("Heat")
                .at(0)
                .with_list(Column::Cast, &["Al Pacino", "Robert De Niro", "Val Kilmer"])
                .with_list(Column::PrincipleCast, &["Al Pacino", "Robert De Niro"])
                .with_list(Column::Director, &["Michael Mann"])
                .with_list(Column::Writers, &["Michael Mann"])
                .with_list(Column::Genres, &["Crime", "Drama"]),
            MovieRow::new("Ronin")
                .at(1)
                .with_list(Column::Cast, &["Robert De Niro", "Jean Reno"])
                .with_list(Column::Director, &["John Frankenheimer"])
                .with_list(Column::Genres, &["Action", "Heist"]),
        ]
    }

    #[test]
    fn test_entities_are_deduplicated_per_category() {
        let extraction = extract_entities(&sample_rows());
        let entities = &extraction.entities;

        // Cast and PrincipleCast both feed actors, without duplicates
        let actors: Vec<&str> = entities.get(EntityKind::Actor).collect();
        assert_eq!(actors, vec!["Al Pacino", "Jean Reno", "Robert De Niro", "Val Kilmer"]);

        // Same person as director and writer is kept in both categories
        assert!(entities.contains(EntityKind::Director, "Michael Mann"));
        assert!(entities.contains(EntityKind::Writer, "Michael Mann"));
        assert_eq!(entities.count(EntityKind::Director), 2);
        assert!(extraction.malformed.is_empty());
    }

    #[test]
    fn test_genre_vocabulary_always_present() {
        let extraction = extract_entities(&[]);
        assert_eq!(extraction.entities.count(EntityKind::Genre), Genre::ALL.len());
        assert!(extraction.entities.contains(EntityKind::Genre, "Genre"));
        assert!(extraction.entities.contains(EntityKind::Genre, "Sci-Fi"));
    }

    #[test]
    fn test_out_of_vocabulary_genre_is_kept() {
        let extraction = extract_entities(&sample_rows());
        assert!(extraction.entities.contains(EntityKind::Genre, "Heist"));
        assert_eq!(extraction.entities.count(EntityKind::Genre), Genre::ALL.len() + 1);
    }

    #[test]
    fn test_malformed_row_contributes_nothing() {
        let mut rows = sample_rows();
        rows.push(
            MovieRow::new("Broken")
                .at(2)
                .with_list(Column::Director, &["Nobody Else"])
                .with_raw(Column::Cast, "Tom Hanks, Meg Ryan"),
        );

        let extraction = extract_entities(&rows);
        assert_eq!(extraction.malformed.len(), 1);
        assert!(matches!(
            &extraction.malformed[0],
            DataLoadError::MalformedCell { row: 2, column: Column::Cast, .. }
        ));
        assert!(!extraction.entities.contains(EntityKind::Director, "Nobody Else"));
        assert!(extraction.is_malformed(2));
        assert!(!extraction.is_malformed(0));
    }

    #[test]
    fn test_malformed_position_ignores_row_index() {
        // Rows built in code all carry index 0
        let rows = vec![
            MovieRow::new("Heat").with_list(Column::Director, &["Michael Mann"]),
            MovieRow::new("Collateral").with_list(Column::Director, &["Michael Mann"]),
            MovieRow::new("Broken").with_raw(Column::Writers, "not a list"),
        ];

        let extraction = extract_entities(&rows);
        assert_eq!(extraction.malformed.len(), 1);
        assert_eq!(extraction.malformed_positions.iter().copied().collect::<Vec<_>>(), vec![2]);
        assert!(!extraction.is_malformed(0));
        assert!(extraction.entities.contains(EntityKind::Director, "Michael Mann"));
    }

    #[test]
    fn test_duplicate_titles_are_reported() {
        let mut rows = sample_rows();
        rows.push(MovieRow::new("Heat").at(2));

        let extraction = extract_entities(&rows);
        assert_eq!(extraction.duplicate_titles, vec!["Heat".to_string()]);
    }

    #[test]
    fn test_parallel_extraction_matches_sequential() {
        let rows: Vec<MovieRow> = (0..500)
            .map(|i| {
                let actor = format!("Actor {}", i % 37);
                let director = format!("Director {}", i % 11);
                MovieRow::new(format!("Movie {}", i))
                    .at(i)
                    .with_list(Column::Cast, &[actor.as_str()])
                    .with_list(Column::Director, &[director.as_str()])
            })
            .collect();

        let extraction = extract_entities(&rows);

        let mut expected = EntitySets::new();
        for row in &rows {
            for entity in row.entities().unwrap() {
                expected.insert(entity.kind, entity.name);
            }
        }
        assert_eq!(extraction.entities, expected.with_genre_vocabulary());
        assert_eq!(extraction.entities.count(EntityKind::Actor), 37);
        assert_eq!(extraction.entities.count(EntityKind::Director), 11);
    }
}
