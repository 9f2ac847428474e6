use serde::Deserialize;

use crate::quartz::content::error::Result;
use crate::quartz::content::lookup::Geocoder;
use crate::quartz::content::lookup::http::HttpClient;
use crate::quartz::content::model::Coordinates;

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

/// Geocoding against a Nominatim `/search` endpoint.
#[derive(Debug)]
pub struct Nominatim {
    client: HttpClient,
    search_url: String,
}

impl Nominatim {
    pub fn new(client: HttpClient, search_url: impl Into<String>) -> Self {
        Self {
            client,
            search_url: search_url.into(),
        }
    }
}

impl Geocoder for Nominatim {
    fn locate(&self, query: &str) -> Result<Option<Coordinates>> {
        let hits: Vec<SearchHit> = self.client.get_json(
            &self.search_url,
            &[("q", query), ("format", "json"), ("limit", "1")],
        )?;
        Ok(hits.first().and_then(to_coordinates))
    }
}

fn to_coordinates(hit: &SearchHit) -> Option<Coordinates> {
    let lat = hit.lat.trim().parse::<f64>().ok()?;
    let lng = hit.lon.trim().parse::<f64>().ok()?;
    Some(Coordinates::rounded(lat, lng))
}
