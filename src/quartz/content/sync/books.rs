use tracing::{info, instrument, warn};

use crate::quartz::content::config::BooksConfig;
use crate::quartz::content::error::Result;
use crate::quartz::content::io::DocumentStore;
use crate::quartz::content::lookup::CoverSource;
use crate::quartz::content::model::{BookRecord, Document, FieldValue, Frontmatter};
use crate::quartz::content::reconcile::{Collection, Reconciler};
use crate::quartz::content::sync::{PatchedPage, RunOptions, SyncReport};
use crate::quartz::content::text::naming::{
    encode_link_path, simplified_title, title_to_cover_filename, title_to_filename, title_to_stem,
};
use crate::quartz::content::text::{start_date_to_iso, timeline_to_iso};

/// Frontmatter key order of a book page.
pub const BOOK_FIELD_ORDER: &[&str] = &[
    "image",
    "Entry Date",
    "Primary Author",
    "Status",
    "Timeline",
    "Favorite",
];

/// Where covers live relative to the book pages, and how pages link to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookLayout {
    pub covers_subdir: String,
    pub cover_link_base: String,
}

impl Default for BookLayout {
    fn default() -> Self {
        Self {
            covers_subdir: "covers".to_string(),
            cover_link_base: "My Library/Books/covers".to_string(),
        }
    }
}

impl From<&BooksConfig> for BookLayout {
    fn from(config: &BooksConfig) -> Self {
        Self {
            covers_subdir: config.covers_subdir.clone(),
            cover_link_base: config.cover_link_base.clone(),
        }
    }
}

impl BookLayout {
    fn cover_path(&self, cover_file: &str) -> String {
        format!("{}/{cover_file}", self.covers_subdir.trim_end_matches('/'))
    }

    fn cover_link(&self, cover_file: &str) -> String {
        encode_link_path(&format!(
            "{}/{cover_file}",
            self.cover_link_base.trim_end_matches('/')
        ))
    }
}

/// Book pages, one per title, named after the title.
#[derive(Debug, Clone, Copy, Default)]
pub struct Books;

impl Collection for Books {
    type Record = BookRecord;

    fn title<'r>(&self, record: &'r BookRecord) -> &'r str {
        &record.title
    }

    fn record_key(&self, record: &BookRecord) -> String {
        title_to_stem(&record.title)
    }

    fn document_key(&self, document: &Document) -> String {
        document.stem().to_string()
    }

    fn file_name(&self, record: &BookRecord) -> String {
        title_to_filename(&record.title)
    }

    fn supplied_fields(&self, record: &BookRecord) -> Vec<(&'static str, FieldValue)> {
        let mut fields = Vec::new();
        if let Some(timeline) = record.timeline.as_deref().and_then(timeline_to_iso) {
            fields.push(("Timeline", FieldValue::Text(timeline)));
        }
        if let Some(entry) = record.entry_date.as_deref().and_then(start_date_to_iso) {
            fields.push(("Entry Date", FieldValue::Text(entry)));
        }
        if let Some(author) = &record.author {
            fields.push(("Primary Author", FieldValue::text(author.clone())));
        }
        fields
    }

    fn field_order(&self) -> &'static [&'static str] {
        BOOK_FIELD_ORDER
    }

    fn prefix_fallback(&self) -> bool {
        true
    }
}

/// Builds the page for a book that has none yet.
pub fn book_page(record: &BookRecord, layout: &BookLayout) -> Document {
    let cover_file = title_to_cover_filename(&record.title);
    let mut frontmatter =
        Frontmatter::new().with("image", FieldValue::Text(layout.cover_path(&cover_file)));
    if let Some(entry) = record.entry_date.as_deref().and_then(start_date_to_iso) {
        frontmatter.set("Entry Date", FieldValue::Text(entry));
    }
    if let Some(author) = &record.author {
        frontmatter.set("Primary Author", FieldValue::text(author.clone()));
    }
    frontmatter.set("Status", FieldValue::List(record.status.clone()));
    if let Some(timeline) = record.timeline.as_deref().and_then(timeline_to_iso) {
        frontmatter.set("Timeline", FieldValue::Text(timeline));
    }
    frontmatter.set("Favorite", FieldValue::Flag(record.favorite));

    let body = format!("\n![cover]({})\n", layout.cover_link(&cover_file));
    Document::new(title_to_filename(&record.title), frontmatter, body)
}

/// Reconciles the books export against the pages in `store`.
///
/// Existing pages get missing dates and author filled in. New pages are
/// written with a cover fetched from `covers`; a missing cover is reported
/// and the page is written anyway.
#[instrument(level = "info", skip_all, fields(records = records.len(), dry_run = options.dry_run))]
pub fn sync_books<S: DocumentStore>(
    records: Vec<BookRecord>,
    store: &mut S,
    covers: &dyn CoverSource,
    layout: &BookLayout,
    options: RunOptions,
) -> Result<SyncReport> {
    let documents = store.load_all()?;
    info!(documents = documents.len(), "loaded book pages");

    let reconciler = Reconciler::new(Books);
    let plan = reconciler.reconcile(records, documents);
    let mut report = SyncReport::new("books", options);
    report.unchanged = plan.unchanged.len();
    report.skipped = plan.skipped;

    for (mut document, patch) in plan.to_patch {
        let fields: Vec<String> = patch.keys().map(str::to_string).collect();
        info!(page = %document.file_name, ?fields, "filling missing fields");
        if !options.dry_run {
            document.apply(&patch, BOOK_FIELD_ORDER);
            store.save(&document)?;
        }
        report.patched.push(PatchedPage {
            file: document.file_name,
            fields,
        });
    }

    for record in plan.to_create {
        let page = book_page(&record, layout);
        info!(title = %record.title, page = %page.file_name, "creating book page");

        let cover_path = layout.cover_path(&title_to_cover_filename(&record.title));
        if store.has_asset(&cover_path) {
            info!(cover = %cover_path, "cover already present");
        } else {
            match fetch_cover(covers, &record.title) {
                Some(bytes) => {
                    if !options.dry_run {
                        store.save_asset(&cover_path, &bytes)?;
                    }
                    report.assets_copied += 1;
                }
                None => report.lookup_misses.push(record.title.clone()),
            }
        }

        if !options.dry_run {
            store.save(&page)?;
        }
        report.created.push(page.file_name);
    }

    info!(%report, "books sync finished");
    Ok(report)
}

/// Looks the title up, then its simplified form when that differs.
fn fetch_cover(covers: &dyn CoverSource, title: &str) -> Option<Vec<u8>> {
    let simple = simplified_title(title);
    let queries = std::iter::once(title).chain((simple != title.trim()).then_some(simple));
    for query in queries {
        match covers.find_cover(query) {
            Ok(Some(bytes)) => return Some(bytes),
            Ok(None) => info!(title, query, "no cover found"),
            Err(error) => warn!(title, query, %error, "cover lookup failed"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quartz::content::io::MemoryStore;

    fn hail_mary() -> BookRecord {
        BookRecord {
            title: "Project Hail Mary: A Novel".to_string(),
            author: Some("Andy Weir".to_string()),
            status: vec!["Finished".to_string(), "Owned".to_string()],
            favorite: true,
            timeline: Some("July 7, 2020 → August 1, 2020".to_string()),
            entry_date: Some("June 1, 2020 → June 2, 2020".to_string()),
        }
    }

    #[test]
    fn new_page_layout() {
        let page = book_page(&hail_mary(), &BookLayout::default());
        assert_eq!(page.file_name, "Project Hail Mary- A Novel.md");
        assert_eq!(
            page.render(),
            "---\n\
             image: covers/Project_Hail_Mary-_A_Novel.jpg\n\
             Entry Date: 2020-06-01\n\
             Primary Author: Andy Weir\n\
             Status:\n  - Finished\n  - Owned\n\
             Timeline: 2020-07-07 → 2020-08-01\n\
             Favorite: true\n\
             ---\n\
             \n\
             ![cover](My%20Library/Books/covers/Project_Hail_Mary-_A_Novel.jpg)\n"
        );
    }

    #[test]
    fn unparseable_dates_are_left_out() {
        let mut record = BookRecord::new("Dune");
        record.timeline = Some("sometime".to_string());
        let page = book_page(&record, &BookLayout::default());
        assert!(page.frontmatter.get("Timeline").is_none());
        assert!(Books.supplied_fields(&record).is_empty());
    }

    struct OneCover;

    impl CoverSource for OneCover {
        fn find_cover(&self, title: &str) -> Result<Option<Vec<u8>>> {
            Ok((title == "Dune").then(|| vec![1; 1500]))
        }
    }

    #[test]
    fn existing_cover_is_not_refetched() {
        let mut store = MemoryStore::new();
        store.insert("Other.md", "---\nimage: covers/Other.jpg\n---\n");
        store
            .save_asset("covers/Foundation.jpg", b"old")
            .expect("asset stored");

        let records = vec![BookRecord::new("Dune"), BookRecord::new("Foundation")];
        let report = sync_books(records, &mut store, &OneCover, &BookLayout::default(), RunOptions::default())
            .expect("books synced");

        assert_eq!(report.created, vec!["Dune.md", "Foundation.md"]);
        assert_eq!(report.assets_copied, 1);
        assert!(report.lookup_misses.is_empty());
        assert_eq!(store.asset("covers/Dune.jpg").map(<[u8]>::len), Some(1500));
        assert_eq!(store.asset("covers/Foundation.jpg"), Some(&b"old"[..]));
        assert_eq!(
            store.page_names().collect::<Vec<_>>(),
            vec!["Dune.md", "Foundation.md", "Other.md"]
        );
    }

    #[test]
    fn supplies_only_usable_fields() {
        let keys: Vec<&str> = Books
            .supplied_fields(&hail_mary())
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, vec!["Timeline", "Entry Date", "Primary Author"]);
    }
}
