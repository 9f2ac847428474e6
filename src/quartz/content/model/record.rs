use serde::Serialize;

/// Status written for books whose export row leaves the column blank.
pub const DEFAULT_BOOK_STATUS: &str = "Finished";

/// One row of the books export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRecord {
    pub title: String,
    pub author: Option<String>,
    pub status: Vec<String>,
    pub favorite: bool,
    /// Raw Notion timeline, a date or a range.
    pub timeline: Option<String>,
    /// Raw Notion entry date.
    pub entry_date: Option<String>,
}

impl BookRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            status: vec![DEFAULT_BOOK_STATUS.to_string()],
            favorite: false,
            timeline: None,
            entry_date: None,
        }
    }
}

/// One row of the travel export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TravelRecord {
    pub name: String,
    /// Raw Notion date, a date or a range.
    pub date: Option<String>,
    /// Free-form place hint used before the name when geocoding.
    pub place: Option<String>,
    pub tags: Vec<String>,
}

impl TravelRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            date: None,
            place: None,
            tags: Vec::new(),
        }
    }
}

/// Trims a cell and maps blank values to `None`.
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Splits a comma separated cell into trimmed, non-empty parts.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
