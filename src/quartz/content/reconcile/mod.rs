//! Matching exported records against the pages already on disk.
//!
//! Every record is looked up with three rules, in order: exact key, normalised
//! key, and (when the collection enables it) a shared normalised prefix. The
//! first rule that finds a page wins. A page can be claimed by one record
//! only, and a matched page is only ever patched with fields it lacks.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::quartz::content::model::{Document, FieldValue, FrontmatterStatus, Patch};
use crate::quartz::content::text::naming::{normalize_key, shares_prefix};

/// Per-collection rules the reconciler needs.
pub trait Collection {
    type Record;

    /// Label used in logs and reports.
    fn title<'r>(&self, record: &'r Self::Record) -> &'r str;

    /// Canonical key for a record, comparable to [`Collection::document_key`].
    fn record_key(&self, record: &Self::Record) -> String;

    /// Identity key of an existing page.
    fn document_key(&self, document: &Document) -> String;

    /// File name a new page for this record would be written to.
    fn file_name(&self, record: &Self::Record) -> String;

    /// Fields the record can provide to an existing page.
    fn supplied_fields(&self, record: &Self::Record) -> Vec<(&'static str, FieldValue)>;

    /// Canonical frontmatter key order, used when inserting missing keys.
    fn field_order(&self) -> &'static [&'static str];

    /// Enables the shared-prefix fallback.
    fn prefix_fallback(&self) -> bool {
        false
    }
}

/// Which rule paired a record with a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    Exact,
    Normalized,
    Prefix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The record's page was already claimed, or another new record has the
    /// same normalised key or file name.
    Duplicate,
    /// The matched page has frontmatter that could not be parsed.
    MalformedFrontmatter,
    /// The record matched no page, but a page it does not match already uses
    /// the file name it would be created under.
    FileNameTaken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub title: String,
    pub reason: SkipReason,
}

/// Outcome of one reconciliation pass.
#[derive(Debug)]
pub struct ReconcilePlan<R> {
    /// Records with no page yet, in input order.
    pub to_create: Vec<R>,
    /// Matched pages with the fields they are missing, in input order.
    pub to_patch: Vec<(Document, Patch)>,
    /// Titles of records whose page needs nothing.
    pub unchanged: Vec<String>,
    pub skipped: Vec<Skipped>,
}

impl<R> Default for ReconcilePlan<R> {
    fn default() -> Self {
        Self {
            to_create: Vec::new(),
            to_patch: Vec::new(),
            unchanged: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

pub struct Reconciler<C> {
    collection: C,
}

impl<C: Collection> Reconciler<C> {
    pub fn new(collection: C) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }

    /// Classifies each record as new, patchable, unchanged, or skipped.
    ///
    /// Exact and normalised matches are assigned for every record before any
    /// prefix guess, so a page named exactly by one record is never taken by
    /// another record's prefix. Prefix guesses then go to unclaimed pages in
    /// record order. A new record whose file name is already used by a page it
    /// did not match is skipped rather than written over that page.
    pub fn reconcile(&self, records: Vec<C::Record>, documents: Vec<Document>) -> ReconcilePlan<C::Record> {
        let index = DocumentIndex::build(&self.collection, &documents);
        let keys: Vec<(String, String)> = records
            .iter()
            .map(|record| {
                let key = self.collection.record_key(record);
                let normalized = normalize_key(&key);
                (key, normalized)
            })
            .collect();

        let mut claimed = vec![false; documents.len()];
        let mut matches: Vec<Lookup> = vec![Lookup::Unmatched; records.len()];
        for ((key, normalized), lookup) in keys.iter().zip(matches.iter_mut()) {
            if let Some((slot, rule)) = index.find_direct(key, normalized) {
                *lookup = if claimed[slot] {
                    Lookup::Claimed(slot)
                } else {
                    claimed[slot] = true;
                    Lookup::Matched(slot, rule)
                };
            }
        }
        if self.collection.prefix_fallback() {
            for ((_, normalized), lookup) in keys.iter().zip(matches.iter_mut()) {
                if *lookup != Lookup::Unmatched {
                    continue;
                }
                if let Some(slot) = index.find_prefix(normalized, &claimed) {
                    claimed[slot] = true;
                    *lookup = Lookup::Matched(slot, MatchRule::Prefix);
                }
            }
        }

        let mut queued_keys: HashSet<String> = HashSet::new();
        let mut queued_files: HashSet<String> = HashSet::new();
        let mut patches: Vec<(usize, Patch)> = Vec::new();
        let mut plan = ReconcilePlan::default();

        for ((record, (_, normalized)), lookup) in records.into_iter().zip(keys).zip(matches) {
            let title = self.collection.title(&record).to_string();
            let (slot, rule) = match lookup {
                Lookup::Matched(slot, rule) => (slot, rule),
                Lookup::Claimed(slot) => {
                    let page = &documents[slot].file_name;
                    warn!(title = %title, page = %page, "page already matched by another record; skipping");
                    plan.skipped.push(Skipped { title, reason: SkipReason::Duplicate });
                    continue;
                }
                Lookup::Unmatched => {
                    let file_name = self.collection.file_name(&record);
                    if index.has_file(&file_name) {
                        warn!(title = %title, page = %file_name, "file name belongs to another page; skipping");
                        plan.skipped.push(Skipped { title, reason: SkipReason::FileNameTaken });
                        continue;
                    }
                    let fresh_key = queued_keys.insert(normalized);
                    let fresh_file = queued_files.insert(file_name);
                    if fresh_key && fresh_file {
                        debug!(title = %title, "no existing page");
                        plan.to_create.push(record);
                    } else {
                        warn!(title = %title, "duplicate record in export; skipping");
                        plan.skipped.push(Skipped { title, reason: SkipReason::Duplicate });
                    }
                    continue;
                }
            };

            let document = &documents[slot];
            debug!(title = %title, page = %document.file_name, ?rule, "matched existing page");
            if document.status == FrontmatterStatus::Malformed {
                warn!(page = %document.file_name, "not patching page with unreadable frontmatter");
                plan.skipped.push(Skipped { title, reason: SkipReason::MalformedFrontmatter });
                continue;
            }

            let patch = self.patch_for(&record, document);
            if patch.is_empty() {
                plan.unchanged.push(title);
            } else {
                patches.push((slot, patch));
            }
        }

        let mut slots: Vec<Option<Document>> = documents.into_iter().map(Some).collect();
        plan.to_patch = patches
            .into_iter()
            .filter_map(|(slot, patch)| slots[slot].take().map(|document| (document, patch)))
            .collect();
        plan
    }

    /// Fields the record supplies that the page lacks or holds as a sentinel.
    pub fn patch_for(&self, record: &C::Record, document: &Document) -> Patch {
        let mut patch = Patch::default();
        for (key, value) in self.collection.supplied_fields(record) {
            if !value.is_vacant() && document.frontmatter.is_vacant(key) {
                patch.push(key, value);
            }
        }
        patch
    }
}

/// Lookup tables over the existing pages, in listing order.
struct DocumentIndex {
    exact: HashMap<String, usize>,
    normalized: HashMap<String, usize>,
    listing: Vec<String>,
    files: HashSet<String>,
}

/// Where a record landed after the matching passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Unmatched,
    Matched(usize, MatchRule),
    /// Its page was taken by an earlier record.
    Claimed(usize),
}

impl DocumentIndex {
    fn build<C: Collection>(collection: &C, documents: &[Document]) -> Self {
        let mut exact = HashMap::new();
        let mut normalized = HashMap::new();
        let mut listing = Vec::with_capacity(documents.len());
        let mut files = HashSet::with_capacity(documents.len());
        for (slot, document) in documents.iter().enumerate() {
            files.insert(document.file_name.clone());
            let key = collection.document_key(document);
            let norm = normalize_key(&key);
            exact.entry(key).or_insert(slot);
            normalized.entry(norm.clone()).or_insert(slot);
            listing.push(norm);
        }
        Self {
            exact,
            normalized,
            listing,
            files,
        }
    }

    fn find_direct(&self, key: &str, normalized: &str) -> Option<(usize, MatchRule)> {
        if let Some(&slot) = self.exact.get(key) {
            return Some((slot, MatchRule::Exact));
        }
        self.normalized
            .get(normalized)
            .map(|&slot| (slot, MatchRule::Normalized))
    }

    /// First unclaimed page, in listing order, sharing the key's prefix.
    fn find_prefix(&self, normalized: &str, claimed: &[bool]) -> Option<usize> {
        self.listing
            .iter()
            .enumerate()
            .find(|(slot, candidate)| !claimed[*slot] && shares_prefix(normalized, candidate))
            .map(|(slot, _)| slot)
    }

    fn has_file(&self, file_name: &str) -> bool {
        self.files.contains(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quartz::content::io::frontmatter::parse_document;

    /// Pages keyed by file stem that can receive a `Date`.
    struct Pages {
        prefix: bool,
    }

    struct Entry {
        name: &'static str,
        date: Option<&'static str>,
    }

    fn entry(name: &'static str, date: Option<&'static str>) -> Entry {
        Entry { name, date }
    }

    impl Collection for Pages {
        type Record = Entry;

        fn title<'r>(&self, record: &'r Entry) -> &'r str {
            record.name
        }

        fn record_key(&self, record: &Entry) -> String {
            record.name.to_string()
        }

        fn document_key(&self, document: &Document) -> String {
            document.stem().to_string()
        }

        fn file_name(&self, record: &Entry) -> String {
            format!("{}.md", record.name)
        }

        fn supplied_fields(&self, record: &Entry) -> Vec<(&'static str, FieldValue)> {
            record
                .date
                .map(|date| vec![("Date", FieldValue::text(date))])
                .unwrap_or_default()
        }

        fn field_order(&self) -> &'static [&'static str] {
            &["Date"]
        }

        fn prefix_fallback(&self) -> bool {
            self.prefix
        }
    }

    fn page(name: &str, content: &str) -> Document {
        parse_document(name, content)
    }

    #[test]
    fn classifies_new_patch_and_unchanged() {
        let reconciler = Reconciler::new(Pages { prefix: false });
        let documents = vec![
            page("Goa.md", "---\nDate:\n---\n"),
            page("Paris.md", "---\nDate: 2019-06-12\n---\n"),
        ];
        let plan = reconciler.reconcile(
            vec![
                entry("Goa", Some("2020-01-01")),
                entry("Paris", Some("2021-01-01")),
                entry("Rome", None),
            ],
            documents,
        );

        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.to_create[0].name, "Rome");
        assert_eq!(plan.to_patch.len(), 1);
        let (doc, patch) = &plan.to_patch[0];
        assert_eq!(doc.file_name, "Goa.md");
        assert_eq!(patch.fields, vec![("Date".to_string(), FieldValue::text("2020-01-01"))]);
        assert_eq!(plan.unchanged, vec!["Paris"]);
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn normalized_match_ignores_case_and_punctuation() {
        let reconciler = Reconciler::new(Pages { prefix: false });
        let plan = reconciler.reconcile(
            vec![entry("Fort Amherst, St. John's", None)],
            vec![page("fort amherst st johns.md", "---\ntitle: x\n---\n")],
        );
        assert!(plan.to_create.is_empty());
        assert_eq!(plan.unchanged.len(), 1);
    }

    #[test]
    fn prefix_fallback_only_when_enabled() {
        let documents = || vec![page("Project Hail Mary.md", "---\nDate:\n---\n")];
        let records = || vec![entry("Project Hail Mary - A Novel", Some("2021-05-04"))];

        let strict = Reconciler::new(Pages { prefix: false }).reconcile(records(), documents());
        assert_eq!(strict.to_create.len(), 1);

        let fuzzy = Reconciler::new(Pages { prefix: true }).reconcile(records(), documents());
        assert!(fuzzy.to_create.is_empty());
        assert_eq!(fuzzy.to_patch.len(), 1);
    }

    #[test]
    fn prefix_ties_resolve_to_first_listed() {
        let plan = Reconciler::new(Pages { prefix: true }).reconcile(
            vec![entry("Foundation and Empire", Some("2020-02-02"))],
            vec![
                page("Foundation Trilogy.md", "---\nDate:\n---\n"),
                page("Foundation Series.md", "---\nDate:\n---\n"),
            ],
        );
        assert_eq!(plan.to_patch[0].0.file_name, "Foundation Trilogy.md");
    }

    #[test]
    fn prefix_guess_skips_claimed_pages() {
        let plan = Reconciler::new(Pages { prefix: true }).reconcile(
            vec![
                entry("Foundation Trilogy", Some("2020-01-01")),
                entry("Foundation and Empire", Some("2020-02-02")),
            ],
            vec![
                page("Foundation Trilogy.md", "---\nDate:\n---\n"),
                page("Foundation Series.md", "---\nDate:\n---\n"),
            ],
        );
        assert!(plan.skipped.is_empty());
        let patched: Vec<&str> = plan.to_patch.iter().map(|(doc, _)| doc.file_name.as_str()).collect();
        assert_eq!(patched, vec!["Foundation Trilogy.md", "Foundation Series.md"]);
    }

    #[test]
    fn exact_match_beats_an_earlier_prefix_guess() {
        let plan = Reconciler::new(Pages { prefix: true }).reconcile(
            vec![
                entry("Foundation and Empire", Some("2020-02-02")),
                entry("Foundation Trilogy", Some("2020-01-01")),
            ],
            vec![page("Foundation Trilogy.md", "---\nDate:\n---\n")],
        );
        assert_eq!(plan.to_patch.len(), 1);
        let (doc, patch) = &plan.to_patch[0];
        assert_eq!(doc.file_name, "Foundation Trilogy.md");
        assert_eq!(patch.fields, vec![("Date".to_string(), FieldValue::text("2020-01-01"))]);
        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.to_create[0].name, "Foundation and Empire");
    }

    #[test]
    fn taken_file_name_is_never_created() {
        struct Titled;

        impl Collection for Titled {
            type Record = Entry;

            fn title<'r>(&self, record: &'r Entry) -> &'r str {
                record.name
            }

            fn record_key(&self, record: &Entry) -> String {
                record.name.to_string()
            }

            fn document_key(&self, document: &Document) -> String {
                document.frontmatter.text("title").unwrap_or_default().to_string()
            }

            fn file_name(&self, record: &Entry) -> String {
                format!("{}.md", record.name)
            }

            fn supplied_fields(&self, _record: &Entry) -> Vec<(&'static str, FieldValue)> {
                Vec::new()
            }

            fn field_order(&self) -> &'static [&'static str] {
                &["title"]
            }
        }

        let plan = Reconciler::new(Titled).reconcile(
            vec![entry("Goa", None)],
            vec![page("Goa.md", "---\ntitle: Goa Beach Holiday\n---\n")],
        );
        assert!(plan.to_create.is_empty());
        assert_eq!(
            plan.skipped,
            vec![Skipped { title: "Goa".into(), reason: SkipReason::FileNameTaken }]
        );
    }

    #[test]
    fn a_page_is_claimed_once() {
        let plan = Reconciler::new(Pages { prefix: false }).reconcile(
            vec![entry("Goa", Some("2020-01-01")), entry("goa", Some("2022-01-01"))],
            vec![page("Goa.md", "---\nDate:\n---\n")],
        );
        assert_eq!(plan.to_patch.len(), 1);
        assert_eq!(
            plan.skipped,
            vec![Skipped { title: "goa".into(), reason: SkipReason::Duplicate }]
        );
    }

    #[test]
    fn duplicate_new_records_create_once() {
        let plan = Reconciler::new(Pages { prefix: false })
            .reconcile(vec![entry("Rome", None), entry("ROME!", None)], Vec::new());
        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.skipped.len(), 1);
    }

    #[test]
    fn malformed_pages_are_never_patched() {
        let plan = Reconciler::new(Pages { prefix: false }).reconcile(
            vec![entry("Goa", Some("2020-01-01"))],
            vec![page("Goa.md", "---\nDate: [broken\n---\n")],
        );
        assert!(plan.to_patch.is_empty());
        assert!(plan.to_create.is_empty());
        assert_eq!(plan.skipped[0].reason, SkipReason::MalformedFrontmatter);
    }

    #[test]
    fn present_values_are_never_patched() {
        let reconciler = Reconciler::new(Pages { prefix: false });
        let document = page("Goa.md", "---\nDate: 2019-01-01\n---\n");
        let patch = reconciler.patch_for(&entry("Goa", Some("2020-01-01")), &document);
        assert!(patch.is_empty());
    }
}
