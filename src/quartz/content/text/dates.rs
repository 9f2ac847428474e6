use std::fmt;

use chrono::NaiveDate;

/// Separator Notion uses between the two ends of a date range.
pub const RANGE_SEPARATOR: &str = "→";

/// Layout of a single Notion date, e.g. `July 7, 2020`. `%B` also accepts the
/// abbreviated month name when parsing.
const NOTION_DATE_FORMAT: &str = "%B %d, %Y";

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// A date or date range as exported by Notion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotionDate {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl NotionDate {
    /// Parses `July 7, 2020` or `July 7, 2020 → August 1, 2020`.
    ///
    /// A range with an unreadable side is retried as a single date, which
    /// fails, so the whole value comes back as `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        if let Some((start, end)) = value.split_once(RANGE_SEPARATOR) {
            if let (Some(start), Some(end)) = (parse_single(start), parse_single(end)) {
                return Some(Self {
                    start,
                    end: Some(end),
                });
            }
        }

        parse_single(value).map(|start| Self { start, end: None })
    }

    /// Parses only the start of a value, ignoring whatever follows the range
    /// separator.
    pub fn parse_start(value: &str) -> Option<NaiveDate> {
        let start = value.split(RANGE_SEPARATOR).next().unwrap_or(value);
        parse_single(start)
    }
}

impl fmt::Display for NotionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start.format(ISO_DATE_FORMAT))?;
        if let Some(end) = self.end {
            write!(f, " {RANGE_SEPARATOR} {}", end.format(ISO_DATE_FORMAT))?;
        }
        Ok(())
    }
}

/// Timeline value for a book page: a single ISO date or an ISO range.
pub fn timeline_to_iso(value: &str) -> Option<String> {
    NotionDate::parse(value).map(|date| date.to_string())
}

/// Start date of a Notion value as `YYYY-MM-DD`.
pub fn start_date_to_iso(value: &str) -> Option<String> {
    NotionDate::parse_start(value).map(|date| date.format(ISO_DATE_FORMAT).to_string())
}

fn parse_single(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, NOTION_DATE_FORMAT).ok()
}
