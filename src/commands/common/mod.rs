//! Helpers shared by the command implementations.

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::fs::WorkDir;
use crate::process::{ProgressLine, Stream, TaskSlot};
use crate::workflow::{Orchestrator, StageEntry, WorkflowError, WorkflowStep};

/// Find `.tristep/` by walking up from the current directory.
pub fn find_work_dir() -> Result<WorkDir> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    WorkDir::discover(&cwd).ok_or_else(|| {
        anyhow!("Could not find .tristep directory. Run 'tristep init' first.")
    })
}

pub fn open_orchestrator() -> Result<Orchestrator> {
    Orchestrator::open(find_work_dir()?)
}

/// Convert a workflow failure into its user-facing message.
pub fn user_error(error: WorkflowError) -> anyhow::Error {
    tracing::debug!(error = ?error, "Workflow error");
    anyhow!(error.user_message())
}

/// Stop running child processes on Ctrl+C instead of exiting.
pub fn install_stop_handler(slots: &TaskSlot) -> Result<()> {
    let slots = slots.clone();
    ctrlc::set_handler(move || {
        let stopped = slots.stop_all();
        eprintln!("{} Stopping {stopped} running task(s)...", "→".cyan().bold());
    })
    .context("Failed to set Ctrl+C handler")
}

/// Progress sink printing child output as it arrives.
pub fn print_progress(line: &ProgressLine) {
    match line.stream {
        Stream::Stdout => println!("  {}", line.text),
        Stream::Stderr => eprintln!("  {}", line.text.dimmed()),
    }
}

pub fn print_entry(entry: &StageEntry) {
    match entry {
        StageEntry::Annotate(setup) => {
            println!(
                "{} Stage {}: annotate {} ({} images)",
                "→".cyan().bold(),
                setup.stage,
                setup.dataset.display(),
                setup.images.len()
            );
            let auto = if setup.auto_label { "on" } else { "off" };
            println!(
                "  Auto-label: {auto} (confidence {:.2})",
                setup.confidence
            );
            if let Some(model) = &setup.model_path {
                println!("  Model: {}", model.display());
            }
        }
        StageEntry::Train(setup) => {
            println!(
                "{} Stage {}: train on {}",
                "→".cyan().bold(),
                setup.stage,
                setup.dataset.display()
            );
            let lock = if setup.epochs_locked { " (fixed)" } else { " (1-100)" };
            println!(
                "  Epochs: {}{lock}  Batch: {}  Image size: {}",
                setup.epochs, setup.batch_size, setup.image_size
            );
        }
    }
}

pub fn print_step(step: &WorkflowStep) {
    match step {
        WorkflowStep::Entered(entry) => print_entry(entry),
        WorkflowStep::Completed => {
            println!("{} Three-step workflow complete", "✓".green().bold());
        }
        WorkflowStep::Free(view) => {
            println!("{} Next: {view}", "→".cyan().bold());
        }
    }
}

/// Parse `class cx cy w h` into an annotation.
pub fn parse_box(spec: &str) -> Result<crate::models::Annotation> {
    let parts: Vec<&str> = spec.split_whitespace().collect();
    let [class_name, rest @ ..] = parts.as_slice() else {
        return Err(anyhow!("Empty box specification"));
    };
    let values = rest
        .iter()
        .map(|v| {
            v.parse::<f64>()
                .with_context(|| format!("Invalid number '{v}' in box '{spec}'"))
        })
        .collect::<Result<Vec<f64>>>()?;
    let [cx, cy, w, h] = values.as_slice() else {
        return Err(anyhow!(
            "Box '{spec}' must be 'class center_x center_y width height'"
        ));
    };
    Ok(crate::models::Annotation::new(*class_name, *cx, *cy, *w, *h))
}

/// Paths given on the command line are relative to the current directory.
pub fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Ok(cwd.join(path))
}
