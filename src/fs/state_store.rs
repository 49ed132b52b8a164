//! `state.json`: the persisted copy of [`PersistedState`].
//!
//! A download or training run started from one shell may finish while another
//! shell edits classes. Reads take a shared `fs2` lock. [`StateStore::update`]
//! holds an exclusive lock across read, modify and write, so a caller can fold
//! its changes into whatever another process saved in the meantime.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::models::PersistedState;

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted state. A missing or empty file yields the defaults.
    pub fn load(&self) -> Result<PersistedState> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PersistedState::default())
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to open state file: {}", self.path.display()))
            }
        };
        file.lock_shared().with_context(|| {
            format!("Failed to acquire shared lock: {}", self.path.display())
        })?;

        let len = file
            .metadata()
            .with_context(|| format!("Failed to stat state file: {}", self.path.display()))?
            .len();
        if len == 0 {
            return Ok(PersistedState::default());
        }

        serde_json::from_reader(BufReader::new(&file))
            .with_context(|| format!("Failed to parse state file: {}", self.path.display()))
    }

    /// Overwrite the state file with `state`.
    pub fn save(&self, state: &PersistedState) -> Result<()> {
        let file = self.open_locked()?;
        self.write(&file, state)
    }

    /// Apply `change` to the state currently on disk and save the result,
    /// all under one exclusive lock. Returns the saved state.
    pub fn update<F>(&self, change: F) -> Result<PersistedState>
    where
        F: FnOnce(&mut PersistedState),
    {
        let mut file = self.open_locked()?;
        let len = file
            .metadata()
            .with_context(|| format!("Failed to stat state file: {}", self.path.display()))?
            .len();
        let mut state = if len == 0 {
            PersistedState::default()
        } else {
            serde_json::from_reader(BufReader::new(&file))
                .with_context(|| format!("Failed to parse state file: {}", self.path.display()))?
        };
        change(&mut state);

        file.seek(SeekFrom::Start(0))
            .with_context(|| format!("Failed to rewind state file: {}", self.path.display()))?;
        self.write(&file, &state)?;
        Ok(state)
    }

    fn open_locked(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        #[allow(clippy::suspicious_open_options)]
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open state file: {}", self.path.display()))?;
        file.lock_exclusive().with_context(|| {
            format!("Failed to acquire exclusive lock: {}", self.path.display())
        })?;
        Ok(file)
    }

    /// Truncate and write. The caller holds the exclusive lock.
    fn write(&self, file: &File, state: &PersistedState) -> Result<()> {
        file.set_len(0)
            .with_context(|| format!("Failed to truncate state file: {}", self.path.display()))?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, state).context("Failed to serialize state")?;
        writer
            .flush()
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "Saved state");
        Ok(())
    }
}
