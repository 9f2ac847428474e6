//! Reader for the markdown side of a Notion database export.
//!
//! Notion writes each database page as `<Name> <hash>.md` next to a folder
//! named `<Name>` that holds the page's images.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::quartz::content::error::Result;

static METADATA_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Date|Place|Tags|Database):").expect("static regex is valid")
});

static IMAGE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!\[.*?\]\((.+?)\)").expect("static regex is valid"));

/// Text and image references pulled from one exported page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotionPage {
    pub text: String,
    /// Image references exactly as written in the page, relative to the
    /// export root.
    pub images: Vec<String>,
}

/// Root directory of a Notion export.
#[derive(Debug, Clone)]
pub struct NotionExport {
    root: PathBuf,
}

impl NotionExport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The exported page for `name`, if any. Several matches resolve to the
    /// first in path order.
    pub fn find_page(&self, name: &str) -> Result<Option<PathBuf>> {
        let pattern = format!(
            "{}/{} *.md",
            glob::Pattern::escape(&self.root.to_string_lossy()),
            glob::Pattern::escape(name)
        );
        let mut matches: Vec<PathBuf> = glob::glob(&pattern)?
            .filter_map(|entry| entry.ok())
            .collect();
        matches.sort();
        Ok(matches.into_iter().next())
    }

    /// The image folder exported for `name`, if it exists.
    pub fn images_dir(&self, name: &str) -> Option<PathBuf> {
        let dir = self.root.join(name);
        dir.is_dir().then_some(dir)
    }

    /// Resolves an image reference to a file on disk. The reference is tried
    /// as written, then percent-decoded, then by file name inside
    /// `images_dir`.
    pub fn resolve_image(&self, reference: &str, images_dir: &Path) -> Option<PathBuf> {
        let decoded = percent_decode_str(reference).decode_utf8_lossy();
        let by_name = Path::new(decoded.as_ref())
            .file_name()
            .map(|name| images_dir.join(name));
        [
            Some(self.root.join(reference)),
            Some(self.root.join(decoded.as_ref())),
            by_name,
        ]
        .into_iter()
        .flatten()
        .find(|candidate| candidate.is_file())
    }
}

/// Reads an exported page.
pub fn read_page(path: &Path) -> Result<NotionPage> {
    Ok(extract_page(&fs::read_to_string(path)?))
}

/// Splits exported markdown into body text and image references.
///
/// The leading `# Title` line and the property lines Notion prints under it
/// are dropped, as are blank lines.
pub fn extract_page(content: &str) -> NotionPage {
    let mut page = NotionPage::default();
    let mut text_lines = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let stripped = line.trim();
        if index == 0 && stripped.starts_with("# ") {
            continue;
        }
        if METADATA_LINE.is_match(stripped) {
            continue;
        }
        if let Some(captures) = IMAGE_REF.captures(stripped) {
            page.images.push(captures[1].to_string());
            continue;
        }
        if !stripped.is_empty() {
            text_lines.push(line.trim_end());
        }
    }

    page.text = text_lines.join("\n").trim().to_string();
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn extracts_text_and_images() {
        let content = "# Paris\n\nDate: June 12, 2019\nPlace: Paris\nTags: europe\n\n\
                       ![IMG_1.jpg](Paris/IMG_1.jpg)\nWalked along the Seine.\n\n  Ate crepes.\n";
        let page = extract_page(content);
        assert_eq!(page.images, vec!["Paris/IMG_1.jpg"]);
        assert_eq!(page.text, "Walked along the Seine.\n  Ate crepes.");
    }

    #[test]
    fn heading_later_in_page_is_kept() {
        let page = extract_page("Intro\n# Day two\n");
        assert_eq!(page.text, "Intro\n# Day two");
    }

    #[test]
    fn finds_page_by_name_prefix() {
        let dir = tempdir().expect("temporary directory");
        fs::write(dir.path().join("Paris 4afded99.md"), "# Paris\n").expect("page written");
        fs::write(dir.path().join("Paris Trip 1234.md"), "# Paris Trip\n").expect("page written");
        fs::create_dir(dir.path().join("Paris")).expect("image dir created");

        let export = NotionExport::new(dir.path());
        let found = export.find_page("Paris").expect("glob ran");
        assert_eq!(found, Some(dir.path().join("Paris 4afded99.md")));
        assert!(export.images_dir("Paris").is_some());
        assert!(export.find_page("Rome").expect("glob ran").is_none());
    }

    #[test]
    fn special_characters_in_names_are_literal() {
        let dir = tempdir().expect("temporary directory");
        fs::write(dir.path().join("Shimla [old] abc.md"), "x\n").expect("page written");
        let export = NotionExport::new(dir.path());
        assert!(export.find_page("Shimla [old]").expect("glob ran").is_some());
    }

    #[test]
    fn resolves_encoded_image_reference() {
        let dir = tempdir().expect("temporary directory");
        let images = dir.path().join("Bell Island");
        fs::create_dir(&images).expect("image dir created");
        fs::write(images.join("IMG 1.jpg"), b"jpg").expect("image written");

        let export = NotionExport::new(dir.path());
        assert_eq!(
            export.resolve_image("Bell%20Island/IMG%201.jpg", &images),
            Some(dir.path().join("Bell Island/IMG 1.jpg"))
        );
        assert_eq!(
            export.resolve_image("elsewhere/IMG%201.jpg", &images),
            Some(images.join("IMG 1.jpg"))
        );
        assert_eq!(export.resolve_image("missing.png", &images), None);
    }
}
