//! Run configuration, read from a TOML file.
//!
//! ```toml
//! [books]
//! csv = "export/Books.csv"
//! content_dir = "content/My Library/Books"
//!
//! [travel]
//! csv = "export/Travel log.csv"
//! notion_dir = "export/Travel log"
//! content_dir = "content/Travel and Photography"
//! assets_dir = "content/assets"
//!
//! [lookup]
//! geocode_qualifiers = [", India"]
//!
//! [overrides]
//! "Bell Island" = [47.633, -52.942]
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::quartz::content::error::{Result, SyncError};
use crate::quartz::content::lookup::CoordinateOverrides;
use crate::quartz::content::model::Coordinates;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "quartz-sync.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncConfig {
    pub books: Option<BooksConfig>,
    pub travel: Option<TravelConfig>,
    #[serde(default)]
    pub lookup: LookupConfig,
    /// Page name → `[lat, lng]`, consulted before any geocoder.
    #[serde(default)]
    pub overrides: BTreeMap<String, Coordinates>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BooksConfig {
    /// Notion books export.
    pub csv: PathBuf,
    /// Folder holding one page per book.
    pub content_dir: PathBuf,
    /// Cover folder, relative to `content_dir`.
    #[serde(default = "default_covers_subdir")]
    pub covers_subdir: String,
    /// Site path of the cover folder, used in the cover link of new pages.
    #[serde(default = "default_cover_link_base")]
    pub cover_link_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TravelConfig {
    /// Notion travel log export.
    pub csv: PathBuf,
    /// Folder with the exported `<Name> <hash>.md` pages and image folders.
    pub notion_dir: PathBuf,
    /// Folder holding one page per trip.
    pub content_dir: PathBuf,
    /// Flat folder the site serves images from.
    pub assets_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub user_agent: String,
    pub cover_timeout_secs: u64,
    pub geocode_timeout_secs: u64,
    /// Fixed pause between cover requests.
    pub cover_pause_ms: u64,
    /// Fixed pause between geocoder requests. Nominatim allows one per second.
    pub geocode_pause_ms: u64,
    /// Suffixes appended to a name for the fallback geocoder queries.
    pub geocode_qualifiers: Vec<String>,
    pub open_library_search_url: String,
    pub open_library_covers_url: String,
    pub nominatim_url: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("quartz-sync/{}", env!("CARGO_PKG_VERSION")),
            cover_timeout_secs: 15,
            geocode_timeout_secs: 10,
            cover_pause_ms: 1000,
            geocode_pause_ms: 1100,
            geocode_qualifiers: Vec::new(),
            open_library_search_url: "https://openlibrary.org/search.json".to_string(),
            open_library_covers_url: "https://covers.openlibrary.org".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org/search".to_string(),
        }
    }
}

impl LookupConfig {
    pub fn cover_timeout(&self) -> Duration {
        Duration::from_secs(self.cover_timeout_secs)
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout_secs)
    }

    pub fn cover_pause(&self) -> Duration {
        Duration::from_millis(self.cover_pause_ms)
    }

    pub fn geocode_pause(&self) -> Duration {
        Duration::from_millis(self.geocode_pause_ms)
    }
}

fn default_covers_subdir() -> String {
    "covers".to_string()
}

fn default_cover_link_base() -> String {
    "My Library/Books/covers".to_string()
}

impl SyncConfig {
    /// Reads and parses `path`, resolving relative paths against its folder.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SyncError::MissingInput(path.to_path_buf()));
        }
        let source = fs::read_to_string(path)?;
        let mut config = Self::parse(&source)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn parse(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn books(&self) -> Result<&BooksConfig> {
        self.books.as_ref().ok_or(SyncError::MissingSection("books"))
    }

    pub fn travel(&self) -> Result<&TravelConfig> {
        self.travel.as_ref().ok_or(SyncError::MissingSection("travel"))
    }

    pub fn coordinate_overrides(&self) -> CoordinateOverrides {
        CoordinateOverrides::new(self.overrides.clone())
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(books) = &mut self.books {
            for path in [&mut books.csv, &mut books.content_dir] {
                rebase(path, base);
            }
        }
        if let Some(travel) = &mut self.travel {
            for path in [
                &mut travel.csv,
                &mut travel.notion_dir,
                &mut travel.content_dir,
                &mut travel.assets_dir,
            ] {
                rebase(path, base);
            }
        }
    }
}

fn rebase(path: &mut PathBuf, base: &Path) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}
