//! Core domain types for the crawled movie dataset.
//!
//! One CSV row describes one movie. Several columns hold multi-valued cells
//! (cast, writers, genres, ...) stored as list literals such as
//! `['Tom Hanks', 'Robin Wright']`; those stay as raw text on the row and are
//! decoded on demand, so every consumer sees the same decoding errors.

use crate::error::{DataLoadError, Result};
use crate::parser;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================

/// Zero-based position of a row in the source file
pub type RowId = usize;

// =============================================================================
// Columns and entity categories
// =============================================================================

/// Columns of the dataset that hold list literals (plus the title, for error context)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Title,
    Languages,
    Genres,
    Countries,
    Writers,
    Cast,
    PrincipleCast,
    Director,
}

impl Column {
    /// Columns whose values become entity nodes
    pub const ENTITY_COLUMNS: [Column; 5] = [
        Column::Cast,
        Column::PrincipleCast,
        Column::Director,
        Column::Writers,
        Column::Genres,
    ];

    /// Header of this column in the CSV file
    pub fn header(&self) -> &'static str {
        match self {
            Column::Title => "Title",
            Column::Languages => "Languages",
            // The crawler spelled it this way; the header is kept verbatim.
            Column::Genres => "Genrs",
            Column::Countries => "Countries",
            Column::Writers => "Writers",
            Column::Cast => "Cast",
            Column::PrincipleCast => "PrincipleCast",
            Column::Director => "Director",
        }
    }

    /// The entity category fed by this column, if any
    ///
    /// Cast and PrincipleCast both feed the Actor category.
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            Column::Cast | Column::PrincipleCast => Some(EntityKind::Actor),
            Column::Director => Some(EntityKind::Director),
            Column::Writers => Some(EntityKind::Writer),
            Column::Genres => Some(EntityKind::Genre),
            Column::Title | Column::Languages | Column::Countries => None,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Category of a deduplicated entity
///
/// A person appearing as both actor and director is two entities, one per
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Actor,
    Director,
    Writer,
    Genre,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Actor,
        EntityKind::Director,
        EntityKind::Writer,
        EntityKind::Genre,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Actor => "Actor",
            EntityKind::Director => "Director",
            EntityKind::Writer => "Writer",
            EntityKind::Genre => "Genre",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entity mentioned by a row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub name: String,
}

// =============================================================================
// Genre vocabulary
// =============================================================================

/// Fixed genre vocabulary of the crawled dataset
///
/// `Placeholder` is the generic "Genre" node the graph always carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Biography,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Family,
    Fantasy,
    FilmNoir,
    History,
    Horror,
    Music,
    Musical,
    Mystery,
    Romance,
    SciFi,
    Sport,
    Thriller,
    War,
    Western,
    Placeholder,
}

impl Genre {
    pub const ALL: [Genre; 23] = [
        Genre::Action,
        Genre::Adventure,
        Genre::Animation,
        Genre::Biography,
        Genre::Comedy,
        Genre::Crime,
        Genre::Documentary,
        Genre::Drama,
        Genre::Family,
        Genre::Fantasy,
        Genre::FilmNoir,
        Genre::History,
        Genre::Horror,
        Genre::Music,
        Genre::Musical,
        Genre::Mystery,
        Genre::Romance,
        Genre::SciFi,
        Genre::Sport,
        Genre::Thriller,
        Genre::War,
        Genre::Western,
        Genre::Placeholder,
    ];

    /// Name as it appears in the dataset and on the Genre node
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Animation => "Animation",
            Genre::Biography => "Biography",
            Genre::Comedy => "Comedy",
            Genre::Crime => "Crime",
            Genre::Documentary => "Documentary",
            Genre::Drama => "Drama",
            Genre::Family => "Family",
            Genre::Fantasy => "Fantasy",
            Genre::FilmNoir => "Film-Noir",
            Genre::History => "History",
            Genre::Horror => "Horror",
            Genre::Music => "Music",
            Genre::Musical => "Musical",
            Genre::Mystery => "Mystery",
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci-Fi",
            Genre::Sport => "Sport",
            Genre::Thriller => "Thriller",
            Genre::War => "War",
            Genre::Western => "Western",
            Genre::Placeholder => "Genre",
        }
    }

    /// Look a genre up by its dataset name
    pub fn from_name(name: &str) -> Option<Genre> {
        Genre::ALL.into_iter().find(|genre| genre.as_str() == name)
    }

    /// Every vocabulary term, placeholder included
    pub fn vocabulary() -> impl Iterator<Item = &'static str> {
        Genre::ALL.into_iter().map(|genre| genre.as_str())
    }
}

// =============================================================================
// MovieRow
// =============================================================================

/// One row of the dataset
///
/// Field names follow the CSV headers. Numeric cells that are empty or not
/// numbers (e.g. "N/A") deserialize to `None` instead of failing the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieRow {
    /// Position in the source file, assigned by the reader
    #[serde(skip)]
    pub index: RowId,

    #[serde(rename = "Title")]
    pub title: String,

    #[serde(rename = "USER_SCORE", default, deserialize_with = "csv::invalid_option")]
    pub user_score: Option<f64>,

    #[serde(rename = "Runtime", default)]
    pub runtime: Option<String>,

    #[serde(rename = "Languages", default)]
    pub languages: String,

    #[serde(rename = "METASCORE", default, deserialize_with = "csv::invalid_option")]
    pub metascore: Option<f64>,

    #[serde(rename = "Genrs", default)]
    pub genres: String,

    #[serde(rename = "Countries", default)]
    pub countries: String,

    #[serde(rename = "Writers", default)]
    pub writers: String,

    #[serde(rename = "Cast", default)]
    pub cast: String,

    #[serde(rename = "PrincipleCast", default)]
    pub principle_cast: String,

    #[serde(rename = "Director", default)]
    pub director: String,

    #[serde(rename = "url", default)]
    pub url: Option<String>,
}

impl MovieRow {
    /// Create a row with only a title; the builder methods fill in the rest.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the row position (builder pattern)
    pub fn at(mut self, index: RowId) -> Self {
        self.index = index;
        self
    }

    /// Fill a multi-valued column from plain names, encoding it as a list literal
    pub fn with_list(mut self, column: Column, names: &[&str]) -> Self {
        *self.cell_mut(column) = parser::encode_list(names);
        self
    }

    /// Set a raw cell verbatim (useful to feed deliberately broken data)
    pub fn with_raw(mut self, column: Column, raw: impl Into<String>) -> Self {
        *self.cell_mut(column) = raw.into();
        self
    }

    pub fn with_user_score(mut self, score: f64) -> Self {
        self.user_score = Some(score);
        self
    }

    pub fn with_metascore(mut self, score: f64) -> Self {
        self.metascore = Some(score);
        self
    }

    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = Some(runtime.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Raw text of a column
    pub fn cell(&self, column: Column) -> &str {
        match column {
            Column::Title => &self.title,
            Column::Languages => &self.languages,
            Column::Genres => &self.genres,
            Column::Countries => &self.countries,
            Column::Writers => &self.writers,
            Column::Cast => &self.cast,
            Column::PrincipleCast => &self.principle_cast,
            Column::Director => &self.director,
        }
    }

    fn cell_mut(&mut self, column: Column) -> &mut String {
        match column {
            Column::Title => &mut self.title,
            Column::Languages => &mut self.languages,
            Column::Genres => &mut self.genres,
            Column::Countries => &mut self.countries,
            Column::Writers => &mut self.writers,
            Column::Cast => &mut self.cast,
            Column::PrincipleCast => &mut self.principle_cast,
            Column::Director => &mut self.director,
        }
    }

    /// Strictly decode a multi-valued column into trimmed, non-empty names
    ///
    /// A cell that is not a list literal is an error: dropping it silently
    /// would leave the movie without some of its relationships.
    pub fn names(&self, column: Column) -> Result<Vec<String>> {
        let items = parser::decode_list(self.cell(column)).map_err(|reason| {
            DataLoadError::MalformedCell {
                row: self.index,
                title: self.title.clone(),
                column,
                reason,
            }
        })?;

        Ok(items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect())
    }

    /// Every entity this row mentions, in column order
    ///
    /// Fails on the first malformed column; a row either contributes all of
    /// its entities or none.
    pub fn entities(&self) -> Result<Vec<EntityRef>> {
        let mut entities = Vec::new();
        for column in Column::ENTITY_COLUMNS {
            let Some(kind) = column.entity_kind() else {
                continue;
            };
            for name in self.names(column)? {
                entities.push(EntityRef { kind, name });
            }
        }
        Ok(entities)
    }

    /// Languages as stored on the Movie node (lenient decoding)
    pub fn language_list(&self) -> Vec<String> {
        parser::decode_list_lenient(&self.languages)
    }

    /// Countries as stored on the Movie node (lenient decoding)
    pub fn country_list(&self) -> Vec<String> {
        parser::decode_list_lenient(&self.countries)
    }

    /// Genres as stored on the Movie node (lenient decoding)
    pub fn genre_list(&self) -> Vec<String> {
        parser::decode_list_lenient(&self.genres)
    }
}
