//! Dataset partitioner.
//!
//! `split` distributes a flat folder of downloaded images into the
//! `{class}_15`, `{class}_35` and `{class}_50` slices of a class folder;
//! `merge` gathers the three slices (images and labels) into one dataset for
//! the final training run.
//!
//! Both are sequential and non-transactional. A failure leaves whatever was
//! already copied in place; source images are removed only after every copy
//! has succeeded.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::constants::{
    IMAGES_DIR, LABELS_DIR, LABEL_EXTENSION, SLICE_15_FRACTION, SLICE_35_FRACTION,
    TEST_IMAGES_DIR,
};
use crate::models::stage::{Slice, PARTITION_SLICES};

use super::images::list_images;

/// Number of images assigned to each partition slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SplitPlan {
    pub p15: usize,
    pub p35: usize,
    pub p50: usize,
}

impl SplitPlan {
    pub fn total(&self) -> usize {
        self.p15 + self.p35 + self.p50
    }

    pub fn count(&self, slice: Slice) -> usize {
        match slice {
            Slice::P15 => self.p15,
            Slice::P35 => self.p35,
            Slice::P50 => self.p50,
            Slice::Full => self.total(),
        }
    }
}

/// Compute slice quotas for `available` images.
///
/// Quotas are taken against `min(requested, available)`, or `available` when
/// no positive count was requested, so the three buckets always add up to the
/// number of images actually present.
pub fn plan_split(available: usize, requested: Option<usize>) -> SplitPlan {
    let n = match requested {
        Some(requested) if requested > 0 => requested.min(available),
        _ => available,
    };

    let p15 = (n as f64 * SLICE_15_FRACTION).floor() as usize;
    let p35 = (n as f64 * SLICE_35_FRACTION).floor() as usize;
    let p50 = available.saturating_sub(p15 + p35);

    SplitPlan { p15, p35, p50 }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitOutcome {
    /// The class folder holding the slices (`{dest_base}/{class}`).
    pub base_path: PathBuf,
    pub counts: SplitPlan,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub total_images: usize,
    pub total_labels: usize,
}

/// Create `images/` and `labels/` under a slice folder.
pub fn ensure_slice_dirs(slice_dir: &Path) -> Result<()> {
    for sub in [IMAGES_DIR, LABELS_DIR] {
        let dir = slice_dir.join(sub);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    Ok(())
}

fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    fs::copy(src, dest).with_context(|| {
        format!("Failed to copy {} to {}", src.display(), dest.display())
    })?;
    Ok(())
}

/// Distribute the images of `source_dir` into the 15/35/50 slices under
/// `{dest_base}/{class_name}` and remove them from `source_dir`.
///
/// Files are assigned in directory-listing order: the first `p15` go to the
/// 15% slice, the next `p35` to the 35% slice, the rest to the 50% slice.
pub fn split(
    source_dir: &Path,
    dest_base: &Path,
    class_name: &str,
    requested: Option<usize>,
) -> Result<SplitOutcome> {
    let base_path = dest_base.join(class_name);
    for slice in PARTITION_SLICES {
        ensure_slice_dirs(&slice.dir(&base_path, class_name))?;
    }

    let images = list_images(source_dir)?;
    let plan = plan_split(images.len(), requested);
    tracing::info!(
        source = %source_dir.display(),
        available = images.len(),
        p15 = plan.p15,
        p35 = plan.p35,
        p50 = plan.p50,
        "Splitting images into slices"
    );

    let mut remaining = images.iter();
    for slice in PARTITION_SLICES {
        let target = slice.dir(&base_path, class_name).join(IMAGES_DIR);
        for src in remaining.by_ref().take(plan.count(slice)) {
            let Some(file_name) = src.file_name() else {
                continue;
            };
            copy_file(src, &target.join(file_name))?;
            tracing::debug!(file = ?file_name, slice = %slice, "Copied image");
        }
    }

    for src in &images {
        fs::remove_file(src)
            .with_context(|| format!("Failed to remove source image: {}", src.display()))?;
    }

    Ok(SplitOutcome {
        base_path,
        counts: plan,
    })
}

/// Copy the images and labels of the 15/35/50 slices into `output_dir`.
///
/// Slices whose `images/` folder is missing are skipped. Same-named files
/// from a later slice overwrite earlier ones.
pub fn merge(base_path: &Path, class_name: &str, output_dir: &Path) -> Result<MergeOutcome> {
    let out_images = output_dir.join(IMAGES_DIR);
    let out_labels = output_dir.join(LABELS_DIR);
    ensure_slice_dirs(output_dir)?;

    let mut outcome = MergeOutcome::default();
    for slice in PARTITION_SLICES {
        let slice_dir = slice.dir(base_path, class_name);
        let images_dir = slice_dir.join(IMAGES_DIR);
        if !images_dir.is_dir() {
            tracing::debug!(slice = %slice, path = %images_dir.display(), "Slice missing, skipped");
            continue;
        }

        let labels_dir = slice_dir.join(LABELS_DIR);
        for image in list_images(&images_dir)? {
            let Some(file_name) = image.file_name() else {
                continue;
            };
            copy_file(&image, &out_images.join(file_name))?;
            outcome.total_images += 1;

            let Some(stem) = image.file_stem() else {
                continue;
            };
            let label_name = format!("{}.{}", stem.to_string_lossy(), LABEL_EXTENSION);
            let label = labels_dir.join(&label_name);
            if label.is_file() {
                copy_file(&label, &out_labels.join(&label_name))?;
                outcome.total_labels += 1;
            }
        }
        tracing::debug!(
            slice = %slice,
            images = outcome.total_images,
            labels = outcome.total_labels,
            "Merged slice"
        );
    }

    tracing::info!(
        output = %output_dir.display(),
        images = outcome.total_images,
        labels = outcome.total_labels,
        "Merged slices"
    );
    Ok(outcome)
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create directory: {}", dest.display()))?;
    for entry in
        fs::read_dir(src).with_context(|| format!("Failed to read directory: {}", src.display()))?
    {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", src.display()))?;
        let path = entry.path();
        let target = dest.join(entry.file_name());
        if path.is_dir() {
            copy_dir_recursive(&path, &target)?;
        } else {
            copy_file(&path, &target)?;
        }
    }
    Ok(())
}

/// Move the downloader's held-out test images from the temp class folder to
/// `{base_path}/FOR_TESTS`, then delete the temp class folder.
///
/// Returns the new test folder, or `None` if the download produced none.
pub fn relocate_test_images(temp_class_dir: &Path, base_path: &Path) -> Result<Option<PathBuf>> {
    let source = temp_class_dir.join(TEST_IMAGES_DIR);
    let relocated = if source.is_dir() {
        let target = base_path.join(TEST_IMAGES_DIR);
        copy_dir_recursive(&source, &target)?;
        Some(target)
    } else {
        None
    };

    if temp_class_dir.exists() {
        fs::remove_dir_all(temp_class_dir).with_context(|| {
            format!("Failed to remove temp folder: {}", temp_class_dir.display())
        })?;
    }

    Ok(relocated)
}
