//! Deterministic string transforms shared by every collection: file naming,
//! key normalisation, and Notion date parsing.

pub mod dates;
pub mod naming;

pub use dates::{NotionDate, start_date_to_iso, timeline_to_iso};
pub use naming::{normalize_key, title_to_cover_filename, title_to_filename};
