use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::quartz::content::error::{Result, SyncError};
use crate::quartz::content::model::record::{DEFAULT_BOOK_STATUS, non_blank, split_list};
use crate::quartz::content::model::{BookRecord, TravelRecord};

/// Column layout of the Notion books export. Missing columns read as blank.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BookRow {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Primary Author")]
    author: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Favorite")]
    favorite: String,
    #[serde(rename = "Timeline")]
    timeline: String,
    #[serde(rename = "Entry Date")]
    entry_date: String,
}

/// Column layout of the Notion travel log export.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TravelRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Place")]
    place: String,
    #[serde(rename = "Tags")]
    tags: String,
}

impl BookRow {
    fn into_record(self) -> Option<BookRecord> {
        let title = non_blank(&self.title)?;
        let status = match split_list(&self.status) {
            parts if parts.is_empty() => vec![DEFAULT_BOOK_STATUS.to_string()],
            parts => parts,
        };
        Some(BookRecord {
            title,
            author: non_blank(&self.author),
            status,
            favorite: self.favorite.trim().eq_ignore_ascii_case("yes"),
            timeline: non_blank(&self.timeline),
            entry_date: non_blank(&self.entry_date),
        })
    }
}

impl TravelRow {
    fn into_record(self) -> Option<TravelRecord> {
        let name = non_blank(&self.name)?;
        // Rows pasted from bookmarks carry a URL as their name.
        if name.starts_with("http") {
            return None;
        }
        Some(TravelRecord {
            name,
            date: non_blank(&self.date),
            place: non_blank(&self.place),
            tags: split_list(&self.tags),
        })
    }
}

/// Reads the books export, skipping rows without a title.
pub fn read_books(path: &Path) -> Result<Vec<BookRecord>> {
    Ok(read_rows::<BookRow>(path)?
        .into_iter()
        .filter_map(BookRow::into_record)
        .collect())
}

/// Reads the travel export, skipping rows without a usable name.
pub fn read_travel(path: &Path) -> Result<Vec<TravelRecord>> {
    Ok(read_rows::<TravelRow>(path)?
        .into_iter()
        .filter_map(TravelRow::into_record)
        .collect())
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(SyncError::MissingInput(path.to_path_buf()));
    }
    let source = fs::read_to_string(path)?;
    parse_rows(source.trim_start_matches('\u{feff}'))
}

fn parse_rows<T: DeserializeOwned>(source: &str) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(source.as_bytes());
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
