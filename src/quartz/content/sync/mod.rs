//! Orchestration of the three runs: books, travel, and the travel refresh
//! pass. Each run reads the current pages once, reconciles, patches, then
//! creates, and reports what it did.

pub mod books;
pub mod travel;

use std::fmt;

use serde::Serialize;

use crate::quartz::content::reconcile::Skipped;

pub use books::{BookLayout, Books, sync_books};
pub use travel::{Travel, TravelSources, refresh_travel, sync_travel};

/// Switches shared by every run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Plan and log only; nothing is written.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchedPage {
    pub file: String,
    pub fields: Vec<String>,
}

/// What a run did, or would have done in a dry run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub collection: &'static str,
    pub dry_run: bool,
    /// File names of new pages.
    pub created: Vec<String>,
    pub patched: Vec<PatchedPage>,
    pub unchanged: usize,
    pub skipped: Vec<Skipped>,
    /// Names whose cover or coordinates could not be found.
    pub lookup_misses: Vec<String>,
    pub assets_copied: usize,
}

impl SyncReport {
    pub fn new(collection: &'static str, options: RunOptions) -> Self {
        Self {
            collection,
            dry_run: options.dry_run,
            ..Self::default()
        }
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} created, {} patched, {} unchanged, {} skipped, {} lookup misses, {} assets copied",
            self.collection,
            self.created.len(),
            self.patched.len(),
            self.unchanged,
            self.skipped.len(),
            self.lookup_misses.len(),
            self.assets_copied
        )?;
        if self.dry_run {
            write!(f, " (dry run)")?;
        }
        Ok(())
    }
}
