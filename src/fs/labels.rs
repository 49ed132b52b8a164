//! Label store.
//!
//! One `.txt` file per image, same basename, in a `labels/` folder beside the
//! image's `images/` folder. Each line is `classId cx cy w h`, normalized,
//! space separated, lines joined by `\n` with no trailing newline.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::constants::{IMAGES_DIR, LABELS_DIR, LABEL_EXTENSION};
use crate::models::{Annotation, ClassList};

/// Root of the dataset an image belongs to.
///
/// For `root/images/a.jpg` this is `root`; for an image not under an
/// `images/` folder it is the image's own directory.
pub fn dataset_root_for(image_path: &Path) -> PathBuf {
    let parent = image_path.parent().unwrap_or_else(|| Path::new(""));
    let in_images_dir = parent
        .file_name()
        .map(|name| name == IMAGES_DIR)
        .unwrap_or(false);

    if in_images_dir {
        parent
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| parent.to_path_buf())
    } else {
        parent.to_path_buf()
    }
}

/// Label file path for an image.
pub fn label_path_for(image_path: &Path) -> PathBuf {
    let stem = image_path.file_stem().unwrap_or_default();
    let mut file_name = stem.to_os_string();
    file_name.push(".");
    file_name.push(LABEL_EXTENSION);
    dataset_root_for(image_path).join(LABELS_DIR).join(file_name)
}

/// Render one annotation as a label line. Unknown classes get id `-1`.
pub fn format_label_line(annotation: &Annotation, classes: &ClassList) -> String {
    let class_id = match classes.index_of(&annotation.class_name) {
        Some(idx) => idx as i64,
        None => {
            tracing::warn!(
                class = %annotation.class_name,
                "Class not in class list, writing id -1"
            );
            -1
        }
    };
    format!(
        "{} {} {} {} {}",
        class_id, annotation.center_x, annotation.center_y, annotation.width, annotation.height
    )
}

/// Parse one label line. Blank lines, lines with fewer than five tokens, and
/// lines with unparsable numbers yield `None`.
pub fn parse_label_line(line: &str, classes: &ClassList) -> Option<Annotation> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 5 {
        return None;
    }

    let class_id: i64 = tokens[0].parse().ok()?;
    let mut coords = [0.0f64; 4];
    for (slot, token) in coords.iter_mut().zip(&tokens[1..5]) {
        *slot = token.parse().ok()?;
    }

    Some(Annotation::new(
        classes.name_for(class_id),
        coords[0],
        coords[1],
        coords[2],
        coords[3],
    ))
}

/// Replace the label file of an image with the given annotations.
///
/// Every annotation is validated before anything touches the disk, so an
/// invalid box leaves the previous label file intact.
pub fn save_labels(
    image_path: &Path,
    annotations: &[Annotation],
    classes: &ClassList,
) -> Result<PathBuf> {
    for annotation in annotations {
        annotation
            .validate()
            .with_context(|| format!("Invalid annotation for {}", image_path.display()))?;
    }

    let label_path = label_path_for(image_path);
    if let Some(labels_dir) = label_path.parent() {
        fs::create_dir_all(labels_dir).with_context(|| {
            format!("Failed to create labels directory: {}", labels_dir.display())
        })?;
    }

    let content = annotations
        .iter()
        .map(|a| format_label_line(a, classes))
        .collect::<Vec<_>>()
        .join("\n");

    fs::write(&label_path, content)
        .with_context(|| format!("Failed to write label file: {}", label_path.display()))?;

    tracing::debug!(
        path = %label_path.display(),
        boxes = annotations.len(),
        "Saved labels"
    );
    Ok(label_path)
}

/// Annotations stored for an image. A missing label file is an empty list.
pub fn load_labels(image_path: &Path, classes: &ClassList) -> Result<Vec<Annotation>> {
    let label_path = label_path_for(image_path);
    if !label_path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&label_path)
        .with_context(|| format!("Failed to read label file: {}", label_path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| parse_label_line(line, classes))
        .collect())
}
