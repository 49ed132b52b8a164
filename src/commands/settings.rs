//! `tristep settings`: admin mode and language.

use anyhow::Result;
use colored::Colorize;

use super::common::{open_orchestrator, user_error};

pub fn execute(admin: Option<bool>, language: Option<String>) -> Result<()> {
    let mut orchestrator = open_orchestrator()?;

    if let Some(admin) = admin {
        orchestrator.set_admin_mode(admin).map_err(user_error)?;
    }
    if let Some(language) = language {
        orchestrator.set_language(language.trim()).map_err(user_error)?;
    }

    let settings = orchestrator.settings();
    let admin = if settings.admin_mode { "on" } else { "off" };
    println!("{} Admin mode: {admin}", "✓".green().bold());
    println!("{} Language:   {}", "✓".green().bold(), settings.language);
    Ok(())
}
