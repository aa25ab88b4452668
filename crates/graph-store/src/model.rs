//! Graph vocabulary: labels, relationship types, property values and the
//! records the store hands back.
//!
//! Labels and relationship types are closed enums. They are the only parts
//! of a statement that cannot be bound as parameters, so keeping them out of
//! reach of dataset content is what makes query injection impossible.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Labels and relationship types
// =============================================================================

/// Node labels of the movie graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Label {
    Movie,
    Actor,
    Director,
    Writer,
    Genre,
}

impl Label {
    pub const ALL: [Label; 5] = [
        Label::Movie,
        Label::Actor,
        Label::Director,
        Label::Writer,
        Label::Genre,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Movie => "Movie",
            Label::Actor => "Actor",
            Label::Director => "Director",
            Label::Writer => "Writer",
            Label::Genre => "Genre",
        }
    }

    /// Property holding the natural key of nodes with this label
    pub fn key_property(&self) -> &'static str {
        match self {
            Label::Movie => movie_property::TITLE,
            _ => NAME_PROPERTY,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship types; every relationship points at a Movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RelationType {
    ActedIn,
    Directed,
    Written,
    Genre,
}

impl RelationType {
    /// Relationships that make a person a collaborator on a movie
    pub const COLLABORATION: [RelationType; 3] = [
        RelationType::ActedIn,
        RelationType::Directed,
        RelationType::Written,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::ActedIn => "ACTED_IN",
            RelationType::Directed => "DIRECTED",
            RelationType::Written => "WRITTEN",
            RelationType::Genre => "GENRE",
        }
    }

    pub fn is_collaboration(&self) -> bool {
        !matches!(self, RelationType::Genre)
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Properties
// =============================================================================

/// Key property of Person and Genre nodes
pub const NAME_PROPERTY: &str = "name";

/// Property names of Movie nodes (the CSV headers)
pub mod movie_property {
    pub const TITLE: &str = "Title";
    pub const USER_SCORE: &str = "USER_SCORE";
    pub const RUNTIME: &str = "Runtime";
    pub const LANGUAGES: &str = "Languages";
    pub const METASCORE: &str = "METASCORE";
    pub const GENRES: &str = "Genrs";
    pub const COUNTRIES: &str = "Countries";
    pub const URL: &str = "url";
}

/// A property (or statement parameter) value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Float(f64),
    TextList(Vec<String>),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        PropertyValue::TextList(value)
    }
}

/// Ordered property map (ordering keeps generated statements stable)
pub type Properties = BTreeMap<String, PropertyValue>;

// =============================================================================
// Write requests
// =============================================================================

/// A node identified by (label, natural key), with properties set on creation
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub label: Label,
    pub key: String,
    pub properties: Properties,
}

impl NodeSpec {
    pub fn new(label: Label, key: impl Into<String>) -> Self {
        Self {
            label,
            key: key.into(),
            properties: Properties::new(),
        }
    }

    /// Add a creation-time property (builder pattern)
    pub fn with_property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }
}

/// A directed relationship `tail -[relation]-> Movie(head_key)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationSpec {
    pub relation: RelationType,
    pub tail_label: Label,
    pub tail_key: String,
    pub head_key: String,
}

impl RelationSpec {
    pub fn new(
        relation: RelationType,
        tail_label: Label,
        tail_key: impl Into<String>,
        head_key: impl Into<String>,
    ) -> Self {
        Self {
            relation,
            tail_label,
            tail_key: tail_key.into(),
            head_key: head_key.into(),
        }
    }
}

// =============================================================================
// Read results
// =============================================================================

/// A Movie node as read back from the store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovieNode {
    pub title: String,
    pub user_score: Option<f64>,
    pub runtime: Option<String>,
    pub languages: Vec<String>,
    pub metascore: Option<f64>,
    pub genres: Vec<String>,
    pub countries: Vec<String>,
    pub url: Option<String>,
}

impl MovieNode {
    /// Rebuild a movie from its stored properties; missing ones stay empty
    pub fn from_properties(title: &str, properties: &Properties) -> Self {
        let text = |name: &str| match properties.get(name) {
            Some(PropertyValue::Text(value)) => Some(value.clone()),
            _ => None,
        };
        let float = |name: &str| match properties.get(name) {
            Some(PropertyValue::Float(value)) => Some(*value),
            Some(PropertyValue::Integer(value)) => Some(*value as f64),
            _ => None,
        };
        let list = |name: &str| match properties.get(name) {
            Some(PropertyValue::TextList(values)) => values.clone(),
            Some(PropertyValue::Text(value)) => vec![value.clone()],
            _ => Vec::new(),
        };

        Self {
            title: title.to_string(),
            user_score: float(movie_property::USER_SCORE),
            runtime: text(movie_property::RUNTIME),
            languages: list(movie_property::LANGUAGES),
            metascore: float(movie_property::METASCORE),
            genres: list(movie_property::GENRES),
            countries: list(movie_property::COUNTRIES),
            url: text(movie_property::URL),
        }
    }
}

/// A recommended movie with the counts that qualified it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub movie: MovieNode,
    /// Distinct people with a credit on both movies
    pub shared_people: u32,
    /// Distinct genres attached to both movies
    pub shared_genres: u32,
}

impl Recommendation {
    pub fn score(&self) -> u32 {
        self.shared_people + self.shared_genres
    }
}

/// Node and relationship totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: u64,
    pub relationships: u64,
}
