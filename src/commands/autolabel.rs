//! `tristep autolabel`: pre-label images with the latest trained model.

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::fs::images::{dataset_images_dir, list_images};
use crate::gateway::Completion;

use super::common::{absolute, install_stop_handler, open_orchestrator, user_error};

pub fn execute(
    images: Vec<PathBuf>,
    dataset: Option<PathBuf>,
    model: Option<PathBuf>,
    replace: bool,
) -> Result<()> {
    let orchestrator = open_orchestrator()?;
    let model = model.map(absolute).transpose()?;

    let mut targets = images
        .into_iter()
        .map(absolute)
        .collect::<Result<Vec<_>>>()?;
    if targets.is_empty() {
        let dataset = match dataset {
            Some(dataset) => absolute(dataset)?,
            None => match orchestrator.current_dataset() {
                Some(dataset) => dataset,
                None => bail!("Give an image, --dataset, or enter a three-step annotate stage"),
            },
        };
        targets = list_images(&dataset_images_dir(&dataset))?;
    }

    println!(
        "{} Auto-labeling {} image(s) at confidence {:.2}",
        "→".cyan().bold(),
        targets.len(),
        orchestrator.auto_label_confidence()
    );
    install_stop_handler(orchestrator.slots())?;

    let mut labeled = 0;
    for image in &targets {
        let name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match orchestrator
            .auto_label(image, model.as_deref(), replace, |_| {})
            .map_err(user_error)?
        {
            Completion::Finished(result) if result.saved => {
                labeled += 1;
                println!(
                    "  {} {name}: {} box(es)",
                    "✓".green().bold(),
                    result.annotations.len()
                );
            }
            Completion::Finished(result) if result.annotations.is_empty() => {
                println!("  {} {name}: no objects", "─".dimmed());
            }
            Completion::Finished(_) => {
                println!("  {} {name}: kept existing labels", "─".dimmed());
            }
            Completion::Stopped => {
                println!("{} Auto-labeling stopped", "─".dimmed());
                break;
            }
        }
    }

    println!(
        "{} Labeled {labeled} of {} image(s)",
        "✓".green().bold(),
        targets.len()
    );
    Ok(())
}
