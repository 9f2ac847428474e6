use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::quartz::content::error::Result;
use crate::quartz::content::io::notion::NotionExport;

/// Extensions copied when a page has no explicit image references.
pub const MEDIA_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "mp4", "mov"];

/// Copies `source` into the flat `assets_dir` under its file name unless a
/// file of that name already exists. Returns the file name either way.
pub fn copy_flat(source: &Path, assets_dir: &Path) -> Result<Option<String>> {
    let Some(file_name) = source.file_name().and_then(|name| name.to_str()) else {
        return Ok(None);
    };
    let dest = assets_dir.join(file_name);
    if dest.exists() {
        debug!(file = file_name, "asset already present");
    } else {
        fs::create_dir_all(assets_dir)?;
        fs::copy(source, &dest)?;
        debug!(file = file_name, "copied asset");
    }
    Ok(Some(file_name.to_string()))
}

/// Copies the images a page references. References that cannot be found on
/// disk are logged and left out.
pub fn copy_referenced(
    export: &NotionExport,
    references: &[String],
    images_dir: &Path,
    assets_dir: &Path,
) -> Result<Vec<String>> {
    let mut copied = Vec::new();
    for reference in references {
        match export.resolve_image(reference, images_dir) {
            Some(source) => copied.extend(copy_flat(&source, assets_dir)?),
            None => warn!(reference = %reference, "referenced image not found in export"),
        }
    }
    Ok(copied)
}

/// Copies every media file in `images_dir`, in file name order.
pub fn copy_all_media(images_dir: &Path, assets_dir: &Path) -> Result<Vec<String>> {
    let mut sources = Vec::new();
    for entry in fs::read_dir(images_dir)? {
        let path = entry?.path();
        if path.is_file() && is_media(&path) {
            sources.push(path);
        }
    }
    sources.sort();

    let mut copied = Vec::new();
    for source in sources {
        copied.extend(copy_flat(&source, assets_dir)?);
    }
    Ok(copied)
}

fn is_media(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MEDIA_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}
