use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::quartz::content::error::{Result, SyncError};
use crate::quartz::content::io::frontmatter::parse_document;
use crate::quartz::content::model::Document;

/// Folder listing page that never corresponds to an exported record.
pub const INDEX_PAGE: &str = "index.md";

/// Read/write access to one collection's pages and the assets stored next to
/// them.
pub trait DocumentStore {
    /// Every page in the collection, sorted by file name.
    fn load_all(&self) -> Result<Vec<Document>>;

    /// Creates or overwrites a page.
    fn save(&mut self, document: &Document) -> Result<()>;

    /// True when an asset exists at `relative` (e.g. `covers/Dune.jpg`).
    fn has_asset(&self, relative: &str) -> bool;

    /// Stores an asset at `relative`, creating parent directories.
    fn save_asset(&mut self, relative: &str, bytes: &[u8]) -> Result<()>;
}

/// Pages stored as `*.md` files in a single directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Opens an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SyncError::MissingInput(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DocumentStore for DirectoryStore {
    fn load_all(&self) -> Result<Vec<Document>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.ends_with(".md") && name != INDEX_PAGE {
                names.push(name);
            }
        }
        names.sort();

        let mut documents = Vec::with_capacity(names.len());
        for name in names {
            let content = fs::read_to_string(self.root.join(&name))?;
            documents.push(parse_document(&name, &content));
        }
        debug!(root = %self.root.display(), count = documents.len(), "loaded documents");
        Ok(documents)
    }

    fn save(&mut self, document: &Document) -> Result<()> {
        fs::write(self.root.join(&document.file_name), document.render())?;
        Ok(())
    }

    fn has_asset(&self, relative: &str) -> bool {
        self.root.join(relative).exists()
    }

    fn save_asset(&mut self, relative: &str, bytes: &[u8]) -> Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }
}

/// In-memory store keyed by file name. Listing order is file name order,
/// matching [`DirectoryStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pages: BTreeMap<String, String>,
    assets: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a page with raw file contents.
    pub fn insert(&mut self, file_name: impl Into<String>, content: impl Into<String>) {
        self.pages.insert(file_name.into(), content.into());
    }

    /// Raw contents of a page.
    pub fn page(&self, file_name: &str) -> Option<&str> {
        self.pages.get(file_name).map(String::as_str)
    }

    pub fn asset(&self, relative: &str) -> Option<&[u8]> {
        self.assets.get(relative).map(Vec::as_slice)
    }

    pub fn page_names(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }
}

impl DocumentStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<Document>> {
        Ok(self
            .pages
            .iter()
            .filter(|(name, _)| name.ends_with(".md") && name.as_str() != INDEX_PAGE)
            .map(|(name, content)| parse_document(name, content))
            .collect())
    }

    fn save(&mut self, document: &Document) -> Result<()> {
        self.pages
            .insert(document.file_name.clone(), document.render());
        Ok(())
    }

    fn has_asset(&self, relative: &str) -> bool {
        self.assets.contains_key(relative)
    }

    fn save_asset(&mut self, relative: &str, bytes: &[u8]) -> Result<()> {
        self.assets.insert(relative.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn directory_store_lists_pages_sorted_without_index() {
        let dir = tempdir().expect("temporary directory");
        fs::write(dir.path().join("b.md"), "---\ntitle: B\n---\n").expect("page written");
        fs::write(dir.path().join("a.md"), "A\n").expect("page written");
        fs::write(dir.path().join("index.md"), "index\n").expect("index written");
        fs::write(dir.path().join("notes.txt"), "skip\n").expect("text written");
        fs::create_dir(dir.path().join("covers.md")).expect("dir created");

        let store = DirectoryStore::open(dir.path()).expect("store opened");
        let names: Vec<String> = store
            .load_all()
            .expect("documents loaded")
            .into_iter()
            .map(|doc| doc.file_name)
            .collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
    }

    #[test]
    fn directory_store_writes_assets_into_subdirectories() {
        let dir = tempdir().expect("temporary directory");
        let mut store = DirectoryStore::open(dir.path()).expect("store opened");
        assert!(!store.has_asset("covers/x.jpg"));
        store.save_asset("covers/x.jpg", b"jpeg").expect("asset saved");
        assert!(store.has_asset("covers/x.jpg"));
        assert_eq!(fs::read(dir.path().join("covers/x.jpg")).expect("asset read"), b"jpeg");
    }

    #[test]
    fn opening_missing_directory_fails() {
        let dir = tempdir().expect("temporary directory");
        let missing = dir.path().join("nope");
        assert!(matches!(
            DirectoryStore::open(&missing),
            Err(SyncError::MissingInput(path)) if path == missing
        ));
    }
}
