//! `tristep three-step`: toggle and drive the progressive workflow.

use anyhow::Result;
use colored::Colorize;

use super::common::{open_orchestrator, print_entry, print_step, user_error};
use super::status::print_session;

pub fn enable() -> Result<()> {
    let mut orchestrator = open_orchestrator()?;
    orchestrator.set_enabled(true).map_err(user_error)?;
    println!("{} Three-step mode enabled", "✓".green().bold());
    println!(
        "{} Download a dataset to start at stage 1",
        "→".cyan().bold()
    );
    Ok(())
}

pub fn disable() -> Result<()> {
    let mut orchestrator = open_orchestrator()?;
    orchestrator.set_enabled(false).map_err(user_error)?;
    println!("{} Three-step mode disabled", "✓".green().bold());
    Ok(())
}

pub fn status() -> Result<()> {
    let orchestrator = open_orchestrator()?;
    print_session(orchestrator.session(), orchestrator.settings().admin_mode);
    if orchestrator.session().is_active() {
        match orchestrator.enter() {
            Ok(entry) => print_entry(&entry),
            Err(e) => println!("  {} {}", "!".yellow().bold(), e.user_message()),
        }
    }
    Ok(())
}

/// Finish the current annotate stage.
pub fn advance() -> Result<()> {
    let mut orchestrator = open_orchestrator()?;
    let step = orchestrator.on_annotation_finished().map_err(user_error)?;
    print_step(&step);
    Ok(())
}

/// Re-enter the persisted stage, e.g. after a restart or a fixed folder.
pub fn resume() -> Result<()> {
    let orchestrator = open_orchestrator()?;
    match orchestrator.restore().map_err(user_error)? {
        Some(entry) => print_entry(&entry),
        None => println!("{} Three-step mode is not enabled", "─".dimmed()),
    }
    Ok(())
}
