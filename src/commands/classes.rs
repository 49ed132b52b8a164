//! `tristep classes`: manage the class list.
//!
//! Class ids in label files are list positions, so removing or reordering
//! classes changes the meaning of existing labels.

use anyhow::Result;
use colored::Colorize;

use super::common::{open_orchestrator, user_error};

pub fn list() -> Result<()> {
    let orchestrator = open_orchestrator()?;
    let settings = orchestrator.settings();
    if settings.classes.is_empty() {
        println!("{} No classes defined", "─".dimmed());
        return Ok(());
    }
    let selected = settings.selected_class();
    for (i, name) in settings.classes.names().iter().enumerate() {
        if selected == Some(name.as_str()) {
            println!("{} {i} {}", "*".green().bold(), name.bold());
        } else {
            println!("  {i} {name}");
        }
    }
    Ok(())
}

pub fn add(name: String) -> Result<()> {
    let mut orchestrator = open_orchestrator()?;
    if orchestrator.add_class(&name).map_err(user_error)? {
        println!("{} Added class {}", "✓".green().bold(), name.trim().bold());
    } else {
        println!("{} Class {} already exists", "─".dimmed(), name.trim());
    }
    Ok(())
}

pub fn remove(name: String) -> Result<()> {
    let mut orchestrator = open_orchestrator()?;
    if orchestrator.remove_class(&name).map_err(user_error)? {
        println!("{} Removed class {}", "✓".green().bold(), name.bold());
        println!(
            "  {} Existing label files still use the old class ids",
            "!".yellow().bold()
        );
    } else {
        println!("{} No class named {name}", "─".dimmed());
    }
    Ok(())
}

pub fn select(name: String) -> Result<()> {
    let mut orchestrator = open_orchestrator()?;
    orchestrator.select_class(&name).map_err(user_error)?;
    println!("{} Selected class {}", "✓".green().bold(), name.bold());
    Ok(())
}
