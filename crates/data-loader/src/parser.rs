//! Parser for the crawled movie CSV.
//!
//! Two layers:
//! - record level: the `csv` crate turns each line into a `MovieRow`
//! - cell level: multi-valued cells are list literals written by the crawler,
//!   e.g. `['Tom Hanks', "Ocean's Crew"]`, decoded here into plain strings
//!
//! The cell decoder is strict on purpose. A cell that is not a list literal
//! is reported to the caller rather than treated as "no values".

use crate::error::{DataLoadError, Result};
use crate::types::MovieRow;
use std::fs::File;
use std::io::Read;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;
use tracing::debug;

/// Read every row of a CSV file with a header line
///
/// Rows get their zero-based position in `MovieRow::index`.
pub fn read_rows(path: &Path) -> Result<Vec<MovieRow>> {
    let file = File::open(path).map_err(|_| DataLoadError::FileNotFound {
        path: path.display().to_string(),
    })?;
    let rows = read_rows_from_reader(file)?;
    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read rows from any reader (a file, a byte slice in tests, ...)
pub fn read_rows_from_reader<R: Read>(reader: R) -> Result<Vec<MovieRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, record) in csv_reader.deserialize::<MovieRow>().enumerate() {
        let mut row = record?;
        row.index = index;
        rows.push(row);
    }
    Ok(rows)
}

/// Decode a list-literal cell into its string items
///
/// Accepts single- or double-quoted items separated by commas, optional
/// whitespace, an optional trailing comma and backslash escapes. An empty
/// cell decodes to an empty list.
///
/// Example: `['Action', "Sci-Fi"]` -> `vec!["Action", "Sci-Fi"]`
///
/// Returns the reason as a plain string; callers attach row context.
pub fn decode_list(cell: &str) -> std::result::Result<Vec<String>, String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| format!("expected a bracketed list, found {:?}", preview(trimmed)))?;

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        skip_whitespace(&mut chars);
        let Some(&quote) = chars.peek() else {
            break;
        };
        if quote != '\'' && quote != '"' {
            return Err(format!("expected a quoted string, found {:?}", quote));
        }
        chars.next();
        items.push(read_quoted(&mut chars, quote)?);

        skip_whitespace(&mut chars);
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(other) => return Err(format!("expected ',' between items, found {:?}", other)),
        }
    }
    Ok(items)
}

/// Decode a cell for display purposes
///
/// Movie properties (languages, countries) never fail a row: a cell that is
/// not a list literal is kept as a single value.
pub fn decode_list_lenient(cell: &str) -> Vec<String> {
    match decode_list(cell) {
        Ok(items) => items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        Err(_) => {
            let raw = cell.trim();
            if raw.is_empty() {
                Vec::new()
            } else {
                vec![raw.to_string()]
            }
        }
    }
}

/// Encode names as a list literal that `decode_list` reads back
pub fn encode_list(names: &[&str]) -> String {
    let quoted: Vec<String> = names
        .iter()
        .map(|name| {
            let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
            format!("'{}'", escaped)
        })
        .collect();
    format!("[{}]", quoted.join(", "))
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

/// Read the body of a quoted item; the opening quote is already consumed.
fn read_quoted(chars: &mut Peekable<Chars<'_>>, quote: char) -> std::result::Result<String, String> {
    let mut item = String::new();
    loop {
        match chars.next() {
            None => return Err("unterminated string".to_string()),
            Some(c) if c == quote => return Ok(item),
            Some('\\') => match chars.next() {
                None => return Err("dangling escape at end of cell".to_string()),
                Some('n') => item.push('\n'),
                Some('t') => item.push('\t'),
                Some('r') => item.push('\r'),
                Some(c @ ('\\' | '\'' | '"')) => item.push(c),
                // Unknown escapes are kept as written
                Some(c) => {
                    item.push('\\');
                    item.push(c);
                }
            },
            Some(c) => item.push(c),
        }
    }
}

fn preview(s: &str) -> String {
    const MAX: usize = 40;
    if s.chars().count() <= MAX {
        s.to_string()
    } else {
        let head: String = s.chars().take(MAX).collect();
        format!("{}...", head)
    }
}
