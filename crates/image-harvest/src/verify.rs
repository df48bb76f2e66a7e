//! Image verification and pruning of files that fail to decode.

use std::path::{Path, PathBuf};

use image::ImageReader;
use rayon::prelude::*;

use crate::layout::get_image_files;
use crate::types::{HarvestError, HarvestResult};

/// True when the file opens and decodes as an image.
pub fn verify_image(path: &Path) -> bool {
    let reader = match ImageReader::open(path).and_then(|r| r.with_guessed_format()) {
        Ok(reader) => reader,
        Err(e) => {
            tracing::debug!("Cannot open {}: {e}", path.display());
            return false;
        }
    };
    match reader.decode() {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("Cannot decode {}: {e}", path.display());
            false
        }
    }
}

/// Return the paths that fail [`verify_image`], in input order.
pub fn verify_images<P: AsRef<Path> + Sync>(paths: &[P]) -> Vec<PathBuf> {
    let verdicts: Vec<bool> = paths.par_iter().map(|p| verify_image(p.as_ref())).collect();
    paths
        .iter()
        .zip(verdicts)
        .filter(|(_, ok)| !ok)
        .map(|(p, _)| p.as_ref().to_path_buf())
        .collect()
}

/// Delete every image under `dir` that fails to decode and return how many failed.
///
/// Files that disappear before deletion are not an error.
pub fn delete_failed_images(dir: &Path) -> HarvestResult<usize> {
    let files = get_image_files(dir);
    let failed = verify_images(&files);

    for path in &failed {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!("Deleted unreadable image {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(HarvestError::io_at(e, path)),
        }
    }

    tracing::info!("Failed images: {}", failed.len());
    Ok(failed.len())
}
