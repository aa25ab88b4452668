//! Cypher statements for the movie graph.
//!
//! Every value coming from the dataset is bound as a named parameter. The
//! statement text only ever contains labels, relationship types and property
//! names from the closed enums in `model`, quoted with `quote_identifier`.
//!
//! `Statement::render_inline` substitutes parameters with escaped literals.
//! That form is only used to write standalone scripts (e.g. for
//! `cypher-shell`), where there is no parameter channel.

use crate::model::{Label, NodeSpec, PropertyValue, RelationSpec, RelationType};
use std::collections::BTreeMap;

/// A statement text plus its named parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: String,
    params: BTreeMap<String, PropertyValue>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: BTreeMap::new(),
        }
    }

    /// Bind a parameter (builder pattern)
    pub fn param(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &BTreeMap<String, PropertyValue> {
        &self.params
    }

    /// Render the statement with every `$param` replaced by a literal
    ///
    /// Unknown parameters are left as written.
    pub fn render_inline(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut chars = self.text.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            let mut name = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    name.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            match self.params.get(&name) {
                Some(value) => out.push_str(&literal(value)),
                None => {
                    out.push('$');
                    out.push_str(&name);
                }
            }
        }
        out
    }
}

// =============================================================================
// Escaping
// =============================================================================

/// Quote a string as a single-quoted Cypher literal
///
/// Quotes and backslashes are escaped, never removed, so the stored value is
/// exactly the input.
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Quote a label, relationship type or property name
///
/// Plain identifiers are returned as-is; anything else is wrapped in
/// backticks with embedded backticks doubled.
pub fn quote_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

/// Render a value as a Cypher literal
pub fn literal(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Text(text) => quote_string(text),
        PropertyValue::Integer(number) => number.to_string(),
        // Cypher has no literal for NaN or infinity
        PropertyValue::Float(number) if !number.is_finite() => "null".to_string(),
        PropertyValue::Float(number) => format!("{:?}", number),
        PropertyValue::TextList(items) => {
            let quoted: Vec<String> = items.iter().map(|item| quote_string(item)).collect();
            format!("[{}]", quoted.join(", "))
        }
    }
}

// =============================================================================
// Statement builders
// =============================================================================

/// `MERGE` a node on its natural key; properties are set only on creation
pub fn merge_node(node: &NodeSpec) -> Statement {
    let mut text = format!(
        "MERGE (n:{} {{{}: $key}})",
        quote_identifier(node.label.as_str()),
        quote_identifier(node.label.key_property())
    );

    let mut statement_params = Vec::with_capacity(node.properties.len());
    let mut assignments = Vec::with_capacity(node.properties.len());
    for (position, (name, value)) in node.properties.iter().enumerate() {
        let param = format!("p{}", position);
        assignments.push(format!("n.{} = ${}", quote_identifier(name), param));
        statement_params.push((param, value.clone()));
    }
    if !assignments.is_empty() {
        text.push_str(" ON CREATE SET ");
        text.push_str(&assignments.join(", "));
    }

    let mut statement = Statement::new(text).param("key", node.key.as_str());
    for (param, value) in statement_params {
        statement = statement.param(&param, value);
    }
    statement
}

/// Match both endpoints by key, then `MERGE` the relationship
///
/// Returns one row with `matched = 0` when an endpoint does not exist.
pub fn merge_relation(relation: &RelationSpec) -> Statement {
    let text = format!(
        "MATCH (t:{} {{{}: $tail}}) MATCH (h:{} {{{}: $head}}) MERGE (t)-[:{}]->(h) RETURN count(*) AS matched",
        quote_identifier(relation.tail_label.as_str()),
        quote_identifier(relation.tail_label.key_property()),
        quote_identifier(Label::Movie.as_str()),
        quote_identifier(Label::Movie.key_property()),
        quote_identifier(relation.relation.as_str()),
    );
    Statement::new(text)
        .param("tail", relation.tail_key.as_str())
        .param("head", relation.head_key.as_str())
}

/// Index on a label's natural key
pub fn create_index(label: Label) -> Statement {
    let key = label.key_property();
    Statement::new(format!(
        "CREATE INDEX {}_{}_index IF NOT EXISTS FOR (n:{}) ON (n.{})",
        label.as_str().to_lowercase(),
        key.to_lowercase(),
        quote_identifier(label.as_str()),
        quote_identifier(key)
    ))
}

/// Uniqueness constraint on a label's natural key
///
/// The constraint is backed by its own index, so `create_index` is not
/// needed for a label that has one.
pub fn create_unique_key(label: Label) -> Statement {
    let key = label.key_property();
    Statement::new(format!(
        "CREATE CONSTRAINT {}_{}_unique IF NOT EXISTS FOR (n:{}) REQUIRE n.{} IS UNIQUE",
        label.as_str().to_lowercase(),
        key.to_lowercase(),
        quote_identifier(label.as_str()),
        quote_identifier(key)
    ))
}

/// Indexes of any kind over exactly the label's key. Column: `existing`.
pub fn key_index_count(label: Label) -> Statement {
    Statement::new(
        "SHOW INDEXES YIELD labelsOrTypes, properties \
         WHERE labelsOrTypes = [$label] AND properties = [$key] \
         RETURN count(*) AS existing",
    )
    .param("label", label.as_str())
    .param("key", label.key_property())
}

pub fn count_nodes() -> Statement {
    Statement::new("MATCH (n) RETURN count(n) AS nodes")
}

pub fn count_relationships() -> Statement {
    Statement::new("MATCH ()-[r]->() RETURN count(r) AS relationships")
}

/// Movies sharing people and genres with `$title`, scored by distinct counts
///
/// Columns: `rec` (Movie node), `people`, `genres`.
pub fn co_occurring_movies(title: &str, threshold: u32) -> Statement {
    let credits: Vec<String> = RelationType::COLLABORATION
        .iter()
        .map(|relation| quote_identifier(relation.as_str()))
        .collect();
    let credits = credits.join("|");
    let movie = quote_identifier(Label::Movie.as_str());
    let title_key = quote_identifier(Label::Movie.key_property());
    let genre = quote_identifier(Label::Genre.as_str());
    let genre_rel = quote_identifier(RelationType::Genre.as_str());

    let text = format!(
        "MATCH (m:{movie} {{{title_key}: $title}})<-[:{credits}]-(p)-[:{credits}]->(rec:{movie}) \
         WHERE rec <> m \
         WITH m, rec, count(DISTINCT p) AS people \
         MATCH (m)<-[:{genre_rel}]-(g:{genre})-[:{genre_rel}]->(rec) \
         WITH rec, people, count(DISTINCT g) AS genres \
         WHERE people + genres > $threshold \
         RETURN rec, people, genres \
         ORDER BY people + genres DESC, rec.{title_key} ASC"
    );
    Statement::new(text)
        .param("title", title)
        .param("threshold", i64::from(threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::movie_property;

    #[test]
    fn test_quote_string_escapes_quotes() {
        assert_eq!(quote_string("Ocean's Eleven"), r"'Ocean\'s Eleven'");
        assert_eq!(quote_string(r"back\slash"), r"'back\\slash'");
        assert_eq!(quote_string("line\nbreak"), r"'line\nbreak'");
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("Movie"), "Movie");
        assert_eq!(quote_identifier("USER_SCORE"), "USER_SCORE");
        assert_eq!(quote_identifier("odd name"), "`odd name`");
        assert_eq!(quote_identifier("a`b"), "`a``b`");
        assert_eq!(quote_identifier(""), "``");
    }

    #[test]
    fn test_merge_node_binds_values_as_parameters() {
        let node = NodeSpec::new(Label::Movie, "Ocean's Eleven")
            .with_property(movie_property::USER_SCORE, 7.7)
            .with_property(movie_property::LANGUAGES, vec!["English".to_string()]);

        let statement = merge_node(&node);

        assert!(statement.text().starts_with("MERGE (n:Movie {Title: $key})"));
        assert!(statement.text().contains("ON CREATE SET"));
        assert!(!statement.text().contains("Ocean"));
        assert_eq!(
            statement.params().get("key"),
            Some(&PropertyValue::Text("Ocean's Eleven".to_string()))
        );
        assert_eq!(statement.params().len(), 3);
    }

    #[test]
    fn test_merge_node_without_properties() {
        let statement = merge_node(&NodeSpec::new(Label::Actor, "Al Pacino"));
        assert_eq!(statement.text(), "MERGE (n:Actor {name: $key})");
    }

    #[test]
    fn test_merge_relation_statement() {
        let relation = RelationSpec::new(RelationType::ActedIn, Label::Actor, "Al Pacino", "Heat");
        let statement = merge_relation(&relation);

        assert!(statement.text().contains("MERGE (t)-[:ACTED_IN]->(h)"));
        assert!(statement.text().contains("MATCH (t:Actor {name: $tail})"));
        assert!(statement.text().contains("MATCH (h:Movie {Title: $head})"));
        assert!(!statement.text().contains("Pacino"));
    }

    #[test]
    fn test_render_inline_keeps_hostile_title_inside_literal() {
        let hostile = "x'}) DETACH DELETE n //";
        let rendered = merge_node(&NodeSpec::new(Label::Movie, hostile)).render_inline();

        assert_eq!(
            rendered,
            r"MERGE (n:Movie {Title: 'x\'}) DETACH DELETE n //'})"
        );
    }

    #[test]
    fn test_render_inline_literals() {
        let statement = Statement::new("RETURN $a, $b, $c, $d, $missing")
            .param("a", 7.0)
            .param("b", vec!["It's".to_string(), "ok".to_string()])
            .param("c", 4_i64)
            .param("d", f64::NAN);

        assert_eq!(
            statement.render_inline(),
            r"RETURN 7.0, ['It\'s', 'ok'], 4, null, $missing"
        );
    }

    #[test]
    fn test_create_index_statement() {
        assert_eq!(
            create_index(Label::Movie).text(),
            "CREATE INDEX movie_title_index IF NOT EXISTS FOR (n:Movie) ON (n.Title)"
        );
        assert_eq!(
            create_index(Label::Genre).text(),
            "CREATE INDEX genre_name_index IF NOT EXISTS FOR (n:Genre) ON (n.name)"
        );
    }

    #[test]
    fn test_create_unique_key_statement() {
        assert_eq!(
            create_unique_key(Label::Movie).text(),
            "CREATE CONSTRAINT movie_title_unique IF NOT EXISTS FOR (n:Movie) REQUIRE n.Title IS UNIQUE"
        );
        assert_eq!(
            create_unique_key(Label::Actor).text(),
            "CREATE CONSTRAINT actor_name_unique IF NOT EXISTS FOR (n:Actor) REQUIRE n.name IS UNIQUE"
        );
    }

    #[test]
    fn test_key_index_count_binds_label_and_key() {
        let statement = key_index_count(Label::Genre);
        assert_eq!(
            statement.params().get("label"),
            Some(&PropertyValue::Text("Genre".to_string()))
        );
        assert_eq!(
            statement.params().get("key"),
            Some(&PropertyValue::Text("name".to_string()))
        );
        assert!(statement.text().ends_with("RETURN count(*) AS existing"));
    }

    #[test]
    fn test_co_occurring_statement_uses_distinct_counts() {
        let statement = co_occurring_movies("Heat", 4);
        let text = statement.text();

        assert!(text.contains("[:ACTED_IN|DIRECTED|WRITTEN]"));
        assert!(text.contains("count(DISTINCT p)"));
        assert!(text.contains("count(DISTINCT g)"));
        assert!(text.contains("WHERE rec <> m"));
        assert!(text.contains("people + genres > $threshold"));
        assert_eq!(statement.params().get("threshold"), Some(&PropertyValue::Integer(4)));
    }
}
