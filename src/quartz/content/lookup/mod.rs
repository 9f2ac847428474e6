//! Best-effort remote lookups: cover images for book titles and coordinates
//! for place names.
//!
//! Both capabilities sit behind small traits so runs can be exercised with
//! in-process fakes. An `Err` from a lookup is a transport failure; `Ok(None)`
//! means the service had nothing usable. Callers log either case and move on.

pub mod http;
pub mod nominatim;
pub mod openlibrary;
pub mod places;

use std::cell::Cell;
use std::thread;
use std::time::Duration;

use crate::quartz::content::error::Result;
use crate::quartz::content::model::Coordinates;

pub use nominatim::Nominatim;
pub use openlibrary::OpenLibrary;
pub use places::{CoordinateOverrides, PlaceResolver, Resolution};

/// Resolves a cover image for a book title.
pub trait CoverSource {
    /// Image bytes for the best cover found, if any.
    fn find_cover(&self, title: &str) -> Result<Option<Vec<u8>>>;
}

/// Resolves coordinates for a free-form place query.
pub trait Geocoder {
    fn locate(&self, query: &str) -> Result<Option<Coordinates>>;
}

/// Lookup provider that never finds anything. Used for offline and dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl CoverSource for NoLookup {
    fn find_cover(&self, _title: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

impl Geocoder for NoLookup {
    fn locate(&self, _query: &str) -> Result<Option<Coordinates>> {
        Ok(None)
    }
}

/// Fixed pause inserted before every call after the first.
#[derive(Debug)]
pub struct Throttle {
    pause: Duration,
    started: Cell<bool>,
}

impl Throttle {
    pub fn new(pause: Duration) -> Self {
        Self {
            pause,
            started: Cell::new(false),
        }
    }

    pub fn wait(&self) {
        if self.started.replace(true) && !self.pause.is_zero() {
            thread::sleep(self.pause);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn first_call_is_not_delayed() {
        let throttle = Throttle::new(Duration::from_millis(200));
        let start = Instant::now();
        throttle.wait();
        assert!(start.elapsed() < Duration::from_millis(200));
        throttle.wait();
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
