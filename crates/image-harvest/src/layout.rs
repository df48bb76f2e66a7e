//! Category directory layout and image file discovery.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use walkdir::WalkDir;

use crate::types::{CategoryPaths, HarvestError, HarvestResult};

/// Extensions that mark a category directory as already populated.
const SETUP_EXTENSIONS: &[&str] = &["jpg", "png", "jpeg", "gif", "bmp"];

/// Extensions treated as image files when scanning a dataset.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jpe", "jfif", "png", "gif", "bmp", "webp", "tif", "tiff", "ico", "pbm", "pgm",
    "ppm", "pnm", "tga", "avif",
];

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Check if a file path has one of the known image extensions.
pub fn has_image_extension(path: &Path) -> bool {
    lowercase_extension(path).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Create `base/<category>` for every category and return the mapping.
///
/// Existing directories are reused. A permission failure on any directory
/// aborts with [`HarvestError::PermissionDenied`].
pub fn create_category_directories<S: AsRef<str>>(
    categories: &[S],
    base: &Path,
) -> HarvestResult<CategoryPaths> {
    let mut paths = CategoryPaths::new();
    for category in categories {
        let category = category.as_ref();
        let category_path = base.join(category);
        std::fs::create_dir_all(&category_path)
            .map_err(|e| HarvestError::io_at(e, &category_path))?;
        tracing::debug!("Category directory ready: {}", category_path.display());
        paths.insert(category, category_path);
    }
    Ok(paths)
}

/// True when a direct child of `path` looks like an image (.jpg, .png, .jpeg, .gif, .bmp).
///
/// A missing path or a path that is not a directory yields `false`.
pub fn path_contains_images(path: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(path) else {
        return false;
    };

    entries.flatten().any(|entry| {
        lowercase_extension(&entry.path())
            .is_some_and(|ext| SETUP_EXTENSIONS.contains(&ext.as_str()))
    })
}

/// True when every directory already contains images. Vacuously true for no paths.
pub fn is_images_setup<I, P>(paths: I) -> bool
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths
        .into_iter()
        .all(|path| path_contains_images(path.as_ref()))
}

/// Recursively collect image files under `path`, sorted.
///
/// Hidden files and directories are ignored. A missing path yields an empty list.
pub fn get_image_files(path: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with('.'))
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| has_image_extension(p))
        .collect();
    files.sort();
    files
}

/// Pick one image file directly inside `dir` at random.
pub fn random_image<R: Rng + ?Sized>(dir: &Path, rng: &mut R) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && has_image_extension(p))
        .collect();
    candidates.sort();
    candidates.choose(rng).cloned()
}
