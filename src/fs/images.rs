use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::constants::{IMAGES_DIR, IMAGE_EXTENSIONS, LABELS_DIR, LABEL_EXTENSION};

/// Whether a path has one of the recognised image extensions.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Image files directly inside `dir`, in directory-listing order.
///
/// Not sorted; partition assignment follows the filesystem's order.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    let mut images = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() && is_image_file(&path) {
            images.push(path);
        }
    }
    Ok(images)
}

/// Folder holding a dataset's images: `dataset/images` if present, else the
/// dataset folder itself.
pub fn dataset_images_dir(dataset: &Path) -> PathBuf {
    let nested = dataset.join(IMAGES_DIR);
    if nested.is_dir() {
        nested
    } else {
        dataset.to_path_buf()
    }
}

/// Image file names of a dataset.
pub fn list_dataset_images(dataset: &Path) -> Result<Vec<String>> {
    let images = list_images(&dataset_images_dir(dataset))?;
    Ok(images
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
        .collect())
}

/// Number of label files in `dataset/labels`; zero if the folder is absent.
pub fn count_label_files(dataset: &Path) -> Result<usize> {
    let labels_dir = dataset.join(LABELS_DIR);
    if !labels_dir.is_dir() {
        return Ok(0);
    }

    let entries = fs::read_dir(&labels_dir)
        .with_context(|| format!("Failed to read directory: {}", labels_dir.display()))?;
    let mut count = 0;
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read entry in {}", labels_dir.display()))?
            .path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(LABEL_EXTENSION) {
            count += 1;
        }
    }
    Ok(count)
}
