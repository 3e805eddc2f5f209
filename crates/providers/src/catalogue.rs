//! Model catalogue response parsing.

use serde_json::Value;

use ul_domain::error::{Error, Result};

use crate::util::snippet;

/// A parsed `/models` body.
#[derive(Debug, Clone, PartialEq)]
pub enum Catalogue {
    /// One of the accepted shapes; the raw model entries.
    Models(Vec<Value>),
    /// Valid JSON in a shape we do not know.
    Unrecognized,
}

/// Parse a catalogue body.
///
/// Accepted shapes: `{"data": [...]}` (which covers the OpenAI
/// `{"object": "list", "data": [...]}` form), `{"models": [...]}` and a bare
/// array. A body that is not JSON at all is a terminal network error.
pub fn parse_catalogue(body: &[u8]) -> Result<Catalogue> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        Error::TerminalNetwork(format!("malformed response ({e}): {}", snippet(body)))
    })?;

    let list = match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Some(items),
            _ => match map.remove("models") {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            },
        },
        _ => None,
    };

    Ok(match list {
        Some(items) => Catalogue::Models(items),
        None => Catalogue::Unrecognized,
    })
}

/// Extract the model identifier from one catalogue entry: a bare string, or
/// the first non-empty of `id`, `name`, `model`.
pub fn model_name(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(map) => ["id", "name", "model"].iter().find_map(|key| {
            map.get(*key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }),
        _ => None,
    }
}
