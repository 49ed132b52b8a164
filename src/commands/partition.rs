//! `tristep split` and `tristep merge`: run the partitioner by hand.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::fs::{merge, split};
use crate::models::stage::PARTITION_SLICES;
use crate::models::Slice;

use super::common::absolute;

pub fn split_images(
    source: PathBuf,
    dest: PathBuf,
    class_name: String,
    count: Option<usize>,
) -> Result<()> {
    let source = absolute(source)?;
    let dest = absolute(dest)?;
    let outcome = split(&source, &dest, &class_name, count)?;

    println!(
        "{} Split into {}",
        "✓".green().bold(),
        outcome.base_path.display()
    );
    for slice in PARTITION_SLICES {
        println!(
            "  {:>4}  {} images  {}",
            slice.to_string(),
            outcome.counts.count(slice),
            slice.folder_name(&class_name).dimmed()
        );
    }
    Ok(())
}

pub fn merge_slices(base: PathBuf, class_name: String, output: Option<PathBuf>) -> Result<()> {
    let base = absolute(base)?;
    let output = match output {
        Some(output) => absolute(output)?,
        None => Slice::Full.dir(&base, &class_name),
    };
    let outcome = merge(&base, &class_name, &output)?;

    println!(
        "{} Merged {} images and {} label files into {}",
        "✓".green().bold(),
        outcome.total_images,
        outcome.total_labels,
        output.display()
    );
    Ok(())
}
