//! `tristep label`: read and write an image's label file.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::fs::labels::label_path_for;

use super::common::{absolute, open_orchestrator, parse_box, user_error};

pub fn show(image: PathBuf) -> Result<()> {
    let orchestrator = open_orchestrator()?;
    let image = absolute(image)?;
    let annotations = orchestrator.load_annotations(&image).map_err(user_error)?;

    println!(
        "{} {}",
        "Labels".bold(),
        label_path_for(&image).display().to_string().dimmed()
    );
    if annotations.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for a in &annotations {
        println!(
            "  {:<12} center ({:.4}, {:.4})  size {:.4} x {:.4}",
            a.class_name, a.center_x, a.center_y, a.width, a.height
        );
    }
    Ok(())
}

/// Replace an image's labels with `boxes` (`class cx cy w h` each).
/// No boxes writes an empty label file.
pub fn save(image: PathBuf, boxes: Vec<String>) -> Result<()> {
    let orchestrator = open_orchestrator()?;
    let image = absolute(image)?;
    let annotations = boxes
        .iter()
        .map(|spec| parse_box(spec))
        .collect::<Result<Vec<_>>>()?;

    let path = orchestrator
        .save_annotations(&image, &annotations)
        .map_err(user_error)?;
    println!(
        "{} Saved {} box(es) to {}",
        "✓".green().bold(),
        annotations.len(),
        path.display()
    );
    Ok(())
}
