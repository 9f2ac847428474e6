use std::path::Path;

use tracing::{info, instrument, warn};

use crate::quartz::content::error::Result;
use crate::quartz::content::io::DocumentStore;
use crate::quartz::content::io::assets::{copy_all_media, copy_referenced};
use crate::quartz::content::io::notion::{NotionExport, read_page};
use crate::quartz::content::lookup::{PlaceResolver, Resolution};
use crate::quartz::content::model::{
    Document, FieldValue, Frontmatter, FrontmatterStatus, INVALID_DATE_SENTINEL, Patch, TravelRecord,
};
use crate::quartz::content::reconcile::{Collection, Reconciler, SkipReason, Skipped};
use crate::quartz::content::sync::{PatchedPage, RunOptions, SyncReport};
use crate::quartz::content::text::start_date_to_iso;

/// Frontmatter key order of a travel page.
pub const TRAVEL_FIELD_ORDER: &[&str] = &["title", "Date", "coordinates", "tags"];

/// Travel pages, identified by their `title` field or file stem.
#[derive(Debug, Clone, Copy, Default)]
pub struct Travel;

impl Collection for Travel {
    type Record = TravelRecord;

    fn title<'r>(&self, record: &'r TravelRecord) -> &'r str {
        &record.name
    }

    fn record_key(&self, record: &TravelRecord) -> String {
        record.name.trim().to_string()
    }

    fn document_key(&self, document: &Document) -> String {
        document
            .frontmatter
            .text("title")
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| document.stem())
            .to_string()
    }

    fn file_name(&self, record: &TravelRecord) -> String {
        travel_file_name(&record.name)
    }

    fn supplied_fields(&self, record: &TravelRecord) -> Vec<(&'static str, FieldValue)> {
        let mut fields = Vec::new();
        if let Some(date) = record.date.as_deref().and_then(start_date_to_iso) {
            fields.push(("Date", FieldValue::Text(date)));
        }
        if !record.tags.is_empty() {
            fields.push(("tags", FieldValue::InlineList(record.tags.clone())));
        }
        fields
    }

    fn field_order(&self) -> &'static [&'static str] {
        TRAVEL_FIELD_ORDER
    }
}

/// Where new travel pages pull their text and media from.
pub struct TravelSources<'a> {
    pub export: &'a NotionExport,
    pub assets_dir: &'a Path,
    pub places: &'a PlaceResolver<'a>,
}

/// File name for a new travel page. Path separators cannot appear in a file
/// name, so they become dashes; the `title` field keeps the real name.
pub fn travel_file_name(name: &str) -> String {
    format!("{}.md", name.trim().replace(['/', '\\'], "-"))
}

/// Builds the page for a trip that has none yet.
pub fn travel_page(record: &TravelRecord, coordinates: Option<FieldValue>, images: &[String], text: &str) -> Document {
    let date = record
        .date
        .as_deref()
        .and_then(start_date_to_iso)
        .map_or(FieldValue::Empty, FieldValue::Text);
    let mut frontmatter = Frontmatter::new()
        .with("title", FieldValue::text(record.name.trim()))
        .with("Date", date);
    if let Some(coordinates) = coordinates {
        frontmatter.set("coordinates", coordinates);
    }
    if !record.tags.is_empty() {
        frontmatter.set("tags", FieldValue::InlineList(record.tags.clone()));
    }

    let mut body_lines: Vec<String> = images.iter().map(|image| format!("![[{image}]]")).collect();
    if !text.is_empty() {
        if !body_lines.is_empty() {
            body_lines.push(String::new());
        }
        body_lines.push(text.to_string());
    }
    let body = format!("{}\n", body_lines.join("\n"));

    Document::new(travel_file_name(&record.name), frontmatter, body)
}

/// Reconciles the travel export against the pages in `store`.
///
/// Existing pages get a missing date or tags filled in. New pages are
/// geocoded, their exported images are copied into the assets folder, and
/// the exported text becomes the page body.
#[instrument(level = "info", skip_all, fields(records = records.len(), dry_run = options.dry_run))]
pub fn sync_travel<S: DocumentStore>(
    records: Vec<TravelRecord>,
    store: &mut S,
    sources: &TravelSources<'_>,
    options: RunOptions,
) -> Result<SyncReport> {
    let documents = store.load_all()?;
    info!(documents = documents.len(), "loaded travel pages");

    let plan = Reconciler::new(Travel).reconcile(records, documents);
    let mut report = SyncReport::new("travel", options);
    report.unchanged = plan.unchanged.len();
    report.skipped = plan.skipped;

    for (mut document, patch) in plan.to_patch {
        let fields: Vec<String> = patch.keys().map(str::to_string).collect();
        info!(page = %document.file_name, ?fields, "filling missing fields");
        if !options.dry_run {
            document.apply(&patch, TRAVEL_FIELD_ORDER);
            store.save(&document)?;
        }
        report.patched.push(PatchedPage {
            file: document.file_name,
            fields,
        });
    }

    for record in plan.to_create {
        info!(name = %record.name, "creating travel page");

        let resolution = sources.places.resolve(&record.name, record.place.as_deref());
        let coordinates = resolution.coordinates().map(FieldValue::Coordinates);
        if coordinates.is_none() {
            warn!(name = %record.name, "no coordinates for new page");
            report.lookup_misses.push(record.name.clone());
        }

        let (images, text) = gather_export(&record.name, sources, options, &mut report)?;
        let page = travel_page(&record, coordinates, &images, &text);
        if !options.dry_run {
            store.save(&page)?;
        }
        info!(page = %page.file_name, images = images.len(), "travel page ready");
        report.created.push(page.file_name);
    }

    info!(%report, "travel sync finished");
    Ok(report)
}

/// Text and copied image names from the Notion export for `name`.
fn gather_export(
    name: &str,
    sources: &TravelSources<'_>,
    options: RunOptions,
    report: &mut SyncReport,
) -> Result<(Vec<String>, String)> {
    let page = match sources.export.find_page(name)? {
        Some(path) => read_page(&path)?,
        None => {
            info!(name, "no exported page text");
            Default::default()
        }
    };

    let Some(images_dir) = sources.export.images_dir(name) else {
        return Ok((Vec::new(), page.text));
    };
    if options.dry_run {
        return Ok((Vec::new(), page.text));
    }

    let images = if page.images.is_empty() {
        copy_all_media(&images_dir, sources.assets_dir)?
    } else {
        copy_referenced(sources.export, &page.images, &images_dir, sources.assets_dir)?
    };
    report.assets_copied += images.len();
    Ok((images, page.text))
}

/// Cleans up every existing travel page: the invalid-date sentinel becomes an
/// empty `Date`, and missing `Date`, `coordinates`, and `title` fields are
/// added. Present values are left alone.
#[instrument(level = "info", skip_all, fields(dry_run = options.dry_run))]
pub fn refresh_travel<S: DocumentStore>(
    store: &mut S,
    places: &PlaceResolver<'_>,
    options: RunOptions,
) -> Result<SyncReport> {
    let documents = store.load_all()?;
    info!(documents = documents.len(), "refreshing travel pages");
    let mut report = SyncReport::new("travel-refresh", options);

    for mut document in documents {
        let name = document.stem().to_string();
        if document.status == FrontmatterStatus::Malformed {
            warn!(page = %document.file_name, "not refreshing page with unreadable frontmatter");
            report.skipped.push(Skipped {
                title: name,
                reason: SkipReason::MalformedFrontmatter,
            });
            continue;
        }

        let patch = refresh_patch(&document, &name, places, &mut report);
        if patch.is_empty() {
            report.unchanged += 1;
            continue;
        }

        let fields: Vec<String> = patch.keys().map(str::to_string).collect();
        info!(page = %document.file_name, ?fields, "refreshing fields");
        if !options.dry_run {
            document.apply(&patch, TRAVEL_FIELD_ORDER);
            store.save(&document)?;
        }
        report.patched.push(PatchedPage {
            file: document.file_name,
            fields,
        });
    }

    info!(%report, "travel refresh finished");
    Ok(report)
}

fn refresh_patch(document: &Document, name: &str, places: &PlaceResolver<'_>, report: &mut SyncReport) -> Patch {
    let frontmatter = &document.frontmatter;
    let mut patch = Patch::default();

    let needs_date = match frontmatter.get("Date") {
        None => true,
        Some(FieldValue::Text(text)) => text.trim() == INVALID_DATE_SENTINEL,
        Some(_) => false,
    };
    if needs_date {
        patch.push("Date", FieldValue::Empty);
    }

    if frontmatter.is_vacant("coordinates") {
        match places.resolve(name, None) {
            Resolution::Override(coords) | Resolution::Geocoded(coords) => {
                patch.push("coordinates", FieldValue::Coordinates(coords));
            }
            Resolution::NotFound | Resolution::Failed => report.lookup_misses.push(name.to_string()),
        }
    }

    if frontmatter.is_vacant("title") {
        patch.push("title", FieldValue::text(name));
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quartz::content::model::Coordinates;

    fn paris() -> TravelRecord {
        TravelRecord {
            name: "Paris".to_string(),
            date: Some("June 12, 2019 → June 15, 2019".to_string()),
            place: Some("Paris, France".to_string()),
            tags: vec!["europe".to_string(), "city".to_string()],
        }
    }

    #[test]
    fn new_page_layout() {
        let coords = Some(FieldValue::Coordinates(Coordinates { lat: 48.8566, lng: 2.3522 }));
        let images = vec!["eiffel.jpg".to_string(), "seine.jpg".to_string()];
        let page = travel_page(&paris(), coords, &images, "Walked along the Seine.");
        assert_eq!(page.file_name, "Paris.md");
        assert_eq!(
            page.render(),
            "---\ntitle: Paris\nDate: 2019-06-12\ncoordinates: [48.8566, 2.3522]\ntags: [europe, city]\n---\n\
             ![[eiffel.jpg]]\n![[seine.jpg]]\n\nWalked along the Seine.\n"
        );
    }

    #[test]
    fn bare_page_keeps_an_empty_date() {
        let page = travel_page(&TravelRecord::new("Goa"), None, &[], "");
        assert_eq!(page.render(), "---\ntitle: Goa\nDate:\n---\n\n");
    }

    #[test]
    fn document_key_prefers_title_field() {
        let titled = Document::new(
            "kufri.md",
            Frontmatter::new().with("title", FieldValue::text("Shimla + Kufri")),
            "",
        );
        assert_eq!(Travel.document_key(&titled), "Shimla + Kufri");
        let untitled = Document::new("Kufri.md", Frontmatter::new(), "");
        assert_eq!(Travel.document_key(&untitled), "Kufri");
    }

    #[test]
    fn file_names_never_contain_separators() {
        assert_eq!(travel_file_name("Delhi/Agra"), "Delhi-Agra.md");
    }
}
