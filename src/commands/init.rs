//! `tristep init`: create `.tristep/` with a default config and empty state.

use anyhow::Result;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use crate::config::Config;
use crate::fs::{StateStore, WorkDir};
use crate::models::PersistedState;

pub fn execute(path: Option<PathBuf>) -> Result<()> {
    let project_root = match path {
        Some(path) => super::common::absolute(path)?,
        None => std::env::current_dir()?,
    };
    let work_dir = WorkDir::new(&project_root);

    println!("\n{}", "Initialize".bold());
    println!("{}", "─".repeat(40).dimmed());

    work_dir.initialize()?;
    println!("  {} Created {}", "✓".green().bold(), work_dir.root().display());

    Config::write_default(&work_dir)?;
    println!("  {} Wrote {}", "✓".green().bold(), "config.toml".dimmed());

    StateStore::new(work_dir.state_path()).save(&PersistedState::default())?;
    println!("  {} Wrote {}", "✓".green().bold(), "state.json".dimmed());

    let config = Config::default().resolved(&project_root);
    for dir in [&config.datasets_dir, &config.temp_dir, &config.models_dir] {
        fs::create_dir_all(dir)?;
    }
    println!(
        "  {} Dataset folder {}",
        "✓".green().bold(),
        config.datasets_dir.display().to_string().dimmed()
    );

    println!(
        "\n{} Put the Python scripts in {} or set {} in config.toml",
        "→".cyan().bold(),
        config.scripts_dir.display(),
        "scripts_dir".bold()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_layout() {
        let temp = TempDir::new().unwrap();
        execute(Some(temp.path().to_path_buf())).unwrap();

        let work_dir = WorkDir::new(temp.path());
        assert!(work_dir.config_path().is_file());
        assert!(work_dir.state_path().is_file());
        assert!(temp.path().join("datasets/raw").is_dir());
        assert!(temp.path().join("models").is_dir());
    }

    #[test]
    fn test_init_twice_fails() {
        let temp = TempDir::new().unwrap();
        execute(Some(temp.path().to_path_buf())).unwrap();
        assert!(execute(Some(temp.path().to_path_buf())).is_err());
    }
}
