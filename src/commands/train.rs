//! `tristep train`: run the trainer and move the workflow on.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::gateway::Completion;

use super::common::{
    absolute, install_stop_handler, open_orchestrator, print_progress, print_step, user_error,
};

pub fn execute(
    dataset: Option<PathBuf>,
    epochs: Option<u32>,
    batch_size: Option<u32>,
    image_size: Option<u32>,
) -> Result<()> {
    let mut orchestrator = open_orchestrator()?;
    let dataset = dataset.map(absolute).transpose()?;
    let request = orchestrator
        .training_request(dataset, epochs, batch_size, image_size)
        .map_err(user_error)?;

    println!(
        "{} Training on {} ({} epochs, batch {}, image {})",
        "→".cyan().bold(),
        request.dataset.display(),
        request.epochs,
        request.batch_size,
        request.image_size
    );
    install_stop_handler(orchestrator.slots())?;

    match orchestrator
        .train(&request, print_progress)
        .map_err(user_error)?
    {
        Completion::Finished(step) => {
            println!("{} Training complete", "✓".green().bold());
            if let Some(model) = &orchestrator.session().model_path {
                println!("  Model: {}", model.display());
            }
            print_step(&step);
        }
        Completion::Stopped => println!("{} Training stopped", "─".dimmed()),
    }
    Ok(())
}
