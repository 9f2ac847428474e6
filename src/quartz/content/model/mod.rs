pub mod document;
pub mod record;

pub use document::{Document, FrontmatterStatus, Patch};
pub use record::{BookRecord, TravelRecord};

use serde::{Deserialize, Serialize};

/// Placeholder older exports wrote into date fields that could not be
/// rendered. It counts as a missing value.
pub const INVALID_DATE_SENTINEL: &str = "Invalid date";

/// Latitude/longitude pair written as `coordinates: [lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Builds a pair rounded to four decimal places.
    pub fn rounded(lat: f64, lng: f64) -> Self {
        Self {
            lat: round4(lat),
            lng: round4(lng),
        }
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(value: Coordinates) -> Self {
        [value.lat, value.lng]
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Value held by a frontmatter key.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// `key:` with nothing after it.
    Empty,
    /// Plain scalar text.
    Text(String),
    /// `true` / `false`.
    Flag(bool),
    /// Block list, one `  - item` line per entry.
    List(Vec<String>),
    /// Flow list on a single line, `[a, b]`.
    InlineList(Vec<String>),
    /// Latitude/longitude pair.
    Coordinates(Coordinates),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// True when the value carries no usable data: empty, blank, an empty
    /// list, or the invalid-date sentinel.
    pub fn is_vacant(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(text) => {
                let text = text.trim();
                text.is_empty() || text == INVALID_DATE_SENTINEL
            }
            FieldValue::List(items) | FieldValue::InlineList(items) => items.is_empty(),
            FieldValue::Flag(_) | FieldValue::Coordinates(_) => false,
        }
    }

    /// Frontmatter lines for `key` holding this value.
    pub fn render(&self, key: &str) -> Vec<String> {
        match self {
            FieldValue::Empty => vec![format!("{key}:")],
            FieldValue::Text(text) => vec![format!("{key}: {text}")],
            FieldValue::Flag(flag) => vec![format!("{key}: {flag}")],
            FieldValue::List(items) => std::iter::once(format!("{key}:"))
                .chain(items.iter().map(|item| format!("  - {item}")))
                .collect(),
            FieldValue::InlineList(items) => vec![format!("{key}: [{}]", items.join(", "))],
            FieldValue::Coordinates(coords) => {
                vec![format!("{key}: [{:?}, {:?}]", coords.lat, coords.lng)]
            }
        }
    }
}

/// Ordered key/value view of a document's frontmatter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    fields: Vec<(String, FieldValue)>,
}

impl Frontmatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Missing keys are vacant too.
    pub fn is_vacant(&self, key: &str) -> bool {
        self.get(key).is_none_or(FieldValue::is_vacant)
    }

    /// Text of a scalar field, if any.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(FieldValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Replaces the value of `key` in place or appends it.
    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        match self.fields.iter_mut().find(|(name, _)| *name == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Builder-style variant of [`Frontmatter::set`].
    pub fn with(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.set(key, value);
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Frontmatter lines in field order.
    pub fn render(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|(key, value)| value.render(key))
            .collect()
    }
}
