use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const WORK_DIR_NAME: &str = ".tristep";

const SUBDIRS: [&str; 1] = ["logs"];

/// The project's private directory: config, persisted state, and logs.
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    pub fn new<P: AsRef<Path>>(project_root: P) -> Self {
        Self {
            root: project_root.as_ref().join(WORK_DIR_NAME),
        }
    }

    /// Walk up from `start` to the first directory containing `.tristep/`.
    pub fn discover<P: AsRef<Path>>(start: P) -> Option<Self> {
        start
            .as_ref()
            .ancestors()
            .map(Self::new)
            .find(WorkDir::exists)
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn initialize(&self) -> Result<()> {
        if self.root.exists() {
            bail!("{WORK_DIR_NAME} directory already exists");
        }

        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create {WORK_DIR_NAME} directory"))?;

        for subdir in &SUBDIRS {
            fs::create_dir(self.root.join(subdir))
                .with_context(|| format!("Failed to create {subdir} directory"))?;
        }

        self.create_readme()?;

        Ok(())
    }

    pub fn load(&self) -> Result<()> {
        if !self.root.exists() {
            bail!("{WORK_DIR_NAME} directory does not exist. Run 'tristep init' first.");
        }

        for subdir in &SUBDIRS {
            let path = self.root.join(subdir);
            if !path.exists() {
                fs::create_dir(&path)
                    .with_context(|| format!("Failed to create missing directory: {subdir}"))?;
            }
        }

        Ok(())
    }

    fn create_readme(&self) -> Result<()> {
        let readme_content = r#"# tristep Work Directory

- `config.toml` - interpreter, script and dataset locations
- `state.json` - classes, statistics and the three-step workflow session
- `logs/` - tristep.log

Edit `config.toml` freely. `state.json` is rewritten on every change.
"#;

        fs::write(self.root.join("README.md"), readme_content)
            .context("Failed to create README.md")?;

        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The project root (parent of `.tristep`).
    pub fn project_root(&self) -> &Path {
        self.root.parent().unwrap_or(&self.root)
    }
}
