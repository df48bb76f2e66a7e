//! Seeded train/valid split of a category-per-directory dataset.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::layout::get_image_files;
use crate::types::{HarvestError, HarvestResult};

pub const DEFAULT_VALID_PCT: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

/// Which subset an image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subset {
    Train,
    Valid,
}

/// An image path (relative to the dataset root) with its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledImage {
    pub path: PathBuf,
    pub label: String,
    pub subset: Subset,
}

/// A labeled dataset split into train and valid subsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSplit {
    pub root: PathBuf,
    pub seed: u64,
    pub valid_pct: f64,
    pub labels: Vec<String>,
    pub items: Vec<LabeledImage>,
    pub created_at: DateTime<Utc>,
}

impl DatasetSplit {
    pub fn train(&self) -> impl Iterator<Item = &LabeledImage> {
        self.items.iter().filter(|i| i.subset == Subset::Train)
    }

    pub fn valid(&self) -> impl Iterator<Item = &LabeledImage> {
        self.items.iter().filter(|i| i.subset == Subset::Valid)
    }

    /// Number of images carrying `label`.
    pub fn count_label(&self, label: &str) -> usize {
        self.items.iter().filter(|i| i.label == label).count()
    }

    /// Write the split as pretty-printed JSON.
    pub fn write_manifest(&self, path: &Path) -> HarvestResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| HarvestError::io_at(e, parent))?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json).map_err(|e| HarvestError::io_at(e, path))?;
        Ok(())
    }

    /// Read a manifest previously written by [`DatasetSplit::write_manifest`].
    pub fn read_manifest(path: &Path) -> HarvestResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| HarvestError::io_at(e, path))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Label an image by the name of the directory containing it.
pub fn parent_label(path: &Path) -> Option<String> {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

/// Split every image under `root` into train and valid subsets.
///
/// Indices are shuffled with a seeded RNG; the first `floor(valid_pct * n)`
/// land in the valid subset.
pub fn split_dataset(root: &Path, valid_pct: f64, seed: u64) -> HarvestResult<DatasetSplit> {
    if !(0.0..1.0).contains(&valid_pct) {
        return Err(HarvestError::InvalidInput(format!(
            "valid_pct must be in [0, 1), got {valid_pct}"
        )));
    }

    let files = get_image_files(root);
    let mut order: Vec<usize> = (0..files.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let cut = (valid_pct * files.len() as f64) as usize;
    let mut subsets = vec![Subset::Train; files.len()];
    for &idx in &order[..cut] {
        subsets[idx] = Subset::Valid;
    }

    let mut labels: Vec<String> = Vec::new();
    let mut items = Vec::with_capacity(files.len());
    for (file, subset) in files.iter().zip(subsets) {
        let label = parent_label(file).unwrap_or_default();
        if !labels.contains(&label) {
            labels.push(label.clone());
        }
        items.push(LabeledImage {
            path: file.strip_prefix(root).unwrap_or(file).to_path_buf(),
            label,
            subset,
        });
    }
    labels.sort();

    tracing::info!(
        "Split {} images under {} into {} train / {} valid ({} labels)",
        items.len(),
        root.display(),
        items.len() - cut,
        cut,
        labels.len()
    );

    Ok(DatasetSplit {
        root: root.to_path_buf(),
        seed,
        valid_pct,
        labels,
        items,
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populate(root: &Path, label: &str, n: usize) {
        let dir = root.join(label);
        std::fs::create_dir_all(&dir).unwrap();
        for i in 0..n {
            std::fs::write(dir.join(format!("{i}.jpg")), b"").unwrap();
        }
    }

    #[test]
    fn test_parent_label() {
        assert_eq!(
            parent_label(Path::new("images/bird/x.jpg")),
            Some("bird".to_string())
        );
        assert_eq!(parent_label(Path::new("x.jpg")), None);
    }

    #[test]
    fn test_split_sizes_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path(), "bird", 6);
        populate(dir.path(), "forest", 4);

        let split = split_dataset(dir.path(), 0.2, DEFAULT_SEED).unwrap();
        assert_eq!(split.items.len(), 10);
        assert_eq!(split.valid().count(), 2);
        assert_eq!(split.train().count(), 8);
        assert_eq!(split.labels, vec!["bird".to_string(), "forest".to_string()]);
        assert_eq!(split.count_label("bird"), 6);
        assert!(split.items.iter().all(|i| i.path.is_relative()));
    }

    #[test]
    fn test_split_is_deterministic_for_seed() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path(), "a", 10);
        populate(dir.path(), "b", 10);

        let first = split_dataset(dir.path(), 0.25, 7).unwrap();
        let second = split_dataset(dir.path(), 0.25, 7).unwrap();
        assert_eq!(first.items, second.items);
    }

    #[test]
    fn test_split_rejects_bad_pct() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            split_dataset(dir.path(), 1.0, 1),
            Err(HarvestError::InvalidInput(_))
        ));
        assert!(split_dataset(dir.path(), -0.1, 1).is_err());
    }

    #[test]
    fn test_manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path(), "bird", 3);
        let split = split_dataset(dir.path(), 0.0, 1).unwrap();
        let manifest = dir.path().join("out").join("split.json");
        split.write_manifest(&manifest).unwrap();

        let loaded = DatasetSplit::read_manifest(&manifest).unwrap();
        assert_eq!(loaded.items, split.items);
        assert_eq!(loaded.valid().count(), 0);
    }
}
