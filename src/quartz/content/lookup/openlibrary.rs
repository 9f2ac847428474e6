use serde::Deserialize;
use tracing::{debug, info};

use crate::quartz::content::error::Result;
use crate::quartz::content::lookup::CoverSource;
use crate::quartz::content::lookup::http::HttpClient;

/// Search results inspected for a cover id.
const SEARCH_LIMIT: usize = 3;

/// Covers smaller than this are Open Library's blank placeholder.
pub const MIN_COVER_BYTES: usize = 1000;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    #[serde(default)]
    cover_i: Option<i64>,
}

/// Cover lookup against the Open Library search and covers APIs.
#[derive(Debug)]
pub struct OpenLibrary {
    client: HttpClient,
    search_url: String,
    covers_url: String,
}

impl OpenLibrary {
    pub fn new(client: HttpClient, search_url: impl Into<String>, covers_url: impl Into<String>) -> Self {
        Self {
            client,
            search_url: search_url.into(),
            covers_url: covers_url.into(),
        }
    }

    fn cover_id(&self, title: &str) -> Result<Option<i64>> {
        let limit = SEARCH_LIMIT.to_string();
        let response: SearchResponse = self
            .client
            .get_json(&self.search_url, &[("title", title.trim()), ("limit", limit.as_str())])?;
        if response.docs.is_empty() {
            info!(title, "no Open Library results");
            return Ok(None);
        }
        let id = first_cover_id(&response.docs);
        if id.is_none() {
            info!(title, "Open Library results carry no cover");
        }
        Ok(id)
    }
}

impl CoverSource for OpenLibrary {
    fn find_cover(&self, title: &str) -> Result<Option<Vec<u8>>> {
        let Some(id) = self.cover_id(title)? else {
            return Ok(None);
        };
        let url = format!("{}/b/id/{id}-M.jpg", self.covers_url.trim_end_matches('/'));
        let bytes = self.client.get_bytes(&url)?;
        if bytes.len() < MIN_COVER_BYTES {
            info!(title, size = bytes.len(), "cover too small, likely a placeholder");
            return Ok(None);
        }
        debug!(title, size = bytes.len(), "downloaded cover");
        Ok(Some(bytes))
    }
}

fn first_cover_id(docs: &[SearchDoc]) -> Option<i64> {
    docs.iter()
        .take(SEARCH_LIMIT)
        .find_map(|doc| doc.cover_i.filter(|id| *id != 0))
}
