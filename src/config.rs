//! Project configuration (`.tristep/config.toml`).
//!
//! Every key is optional. Relative paths resolve against the project root,
//! and a leading `~` expands to the home directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fs::work_dir::WorkDir;
use crate::models::constants::DEFAULT_CONFIDENCE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interpreter override. When unset the venv, then `PATH`, is searched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<PathBuf>,
    /// Folder holding `yolo_trainer.py`, `predict.py` and `reddit_downloader.py`.
    pub scripts_dir: PathBuf,
    /// Trainer output folder.
    pub models_dir: PathBuf,
    /// Where three-step class folders are created.
    pub datasets_dir: PathBuf,
    /// Where the downloader writes before images are split.
    pub temp_dir: PathBuf,
    pub venv_dir: PathBuf,
    /// Data-loader workers passed to the trainer.
    pub workers: u32,
    pub default_confidence: f64,
    /// Seconds a stopped child gets to exit before it is killed.
    pub stop_grace_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            python: None,
            scripts_dir: PathBuf::from("python"),
            models_dir: PathBuf::from("models"),
            datasets_dir: PathBuf::from("datasets/raw"),
            temp_dir: PathBuf::from("datasets/temp"),
            venv_dir: PathBuf::from("venv"),
            workers: 8,
            default_confidence: DEFAULT_CONFIDENCE,
            stop_grace_secs: 5,
        }
    }
}

impl Config {
    /// Load `config.toml` from a work directory; a missing file gives defaults.
    pub fn load(work_dir: &WorkDir) -> Result<Self> {
        let config_path = work_dir.config_path();
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    /// Write the defaults as a starting `config.toml`.
    pub fn write_default(work_dir: &WorkDir) -> Result<()> {
        let content =
            toml::to_string_pretty(&Self::default()).context("Failed to serialize config")?;
        fs::write(work_dir.config_path(), content).context("Failed to write config.toml")?;
        Ok(())
    }

    /// Copy of the config with every path made absolute against `project_root`.
    pub fn resolved(&self, project_root: &Path) -> Self {
        let resolve = |p: &Path| resolve_path(p, project_root);
        Self {
            python: self
                .python
                .as_deref()
                .map(|p| resolve_interpreter(p, project_root)),
            scripts_dir: resolve(&self.scripts_dir),
            models_dir: resolve(&self.models_dir),
            datasets_dir: resolve(&self.datasets_dir),
            temp_dir: resolve(&self.temp_dir),
            venv_dir: resolve(&self.venv_dir),
            ..self.clone()
        }
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_secs)
    }
}

/// Bare interpreter names (`python3`) are left for `PATH` lookup.
fn resolve_interpreter(path: &Path, project_root: &Path) -> PathBuf {
    if path.components().count() == 1 && !path.starts_with("~") {
        path.to_path_buf()
    } else {
        resolve_path(path, project_root)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// Expand `~` and anchor relative paths at `base`.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    let expanded = expand_home(path);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let work_dir = WorkDir::new(temp.path());
        work_dir.initialize().unwrap();
        assert_eq!(Config::load(&work_dir).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let work_dir = WorkDir::new(temp.path());
        work_dir.initialize().unwrap();
        fs::write(
            work_dir.config_path(),
            "workers = 2\npython = \"/usr/bin/python3\"\n",
        )
        .unwrap();

        let config = Config::load(&work_dir).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.python, Some(PathBuf::from("/usr/bin/python3")));
        assert_eq!(config.scripts_dir, PathBuf::from("python"));
        assert_eq!(config.stop_grace(), Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let work_dir = WorkDir::new(temp.path());
        work_dir.initialize().unwrap();
        fs::write(work_dir.config_path(), "workers = \"many\"").unwrap();
        assert!(Config::load(&work_dir).is_err());
    }

    #[test]
    fn test_write_default_round_trips() {
        let temp = TempDir::new().unwrap();
        let work_dir = WorkDir::new(temp.path());
        work_dir.initialize().unwrap();
        Config::write_default(&work_dir).unwrap();
        assert_eq!(Config::load(&work_dir).unwrap(), Config::default());
    }

    #[test]
    fn test_resolved_paths() {
        let root = Path::new("/project");
        let config = Config {
            python: Some(PathBuf::from("python3")),
            models_dir: PathBuf::from("/abs/models"),
            ..Config::default()
        }
        .resolved(root);

        assert_eq!(config.python, Some(PathBuf::from("python3")));
        assert_eq!(config.scripts_dir, PathBuf::from("/project/python"));
        assert_eq!(config.models_dir, PathBuf::from("/abs/models"));
        assert_eq!(config.datasets_dir, PathBuf::from("/project/datasets/raw"));
    }

    #[test]
    fn test_relative_interpreter_path_is_anchored() {
        let config = Config {
            python: Some(PathBuf::from("venv/bin/python3")),
            ..Config::default()
        }
        .resolved(Path::new("/project"));
        assert_eq!(
            config.python,
            Some(PathBuf::from("/project/venv/bin/python3"))
        );
    }

    #[test]
    fn test_home_expansion() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                resolve_path(Path::new("~/data"), Path::new("/project")),
                home.join("data")
            );
        }
    }
}
