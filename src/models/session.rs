use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::stage::{Slice, Stage};

/// The live three-step workflow: whether it is on, where it is, and which
/// class folder it works in.
///
/// This value is the single source of truth; the state file is only its
/// serialization (loaded on start, saved after every transition).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSession {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// The class folder holding the slice folders (`<datasets>/<class>`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<PathBuf>,
    /// Model produced by the most recent training stage, used for auto-labeling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WorkflowSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the session to a freshly split class folder and rewind to stage 1.
    pub fn start(&mut self, class_name: impl Into<String>, base_path: impl Into<PathBuf>) {
        self.enabled = true;
        self.stage = Stage::Annotate15;
        self.class_name = Some(class_name.into());
        self.base_path = Some(base_path.into());
        self.model_path = None;
        self.touch();
    }

    /// Turn the workflow off and forget its class, folder, and model.
    pub fn clear(&mut self) {
        self.enabled = false;
        self.stage = Stage::Annotate15;
        self.class_name = None;
        self.base_path = None;
        self.model_path = None;
        self.touch();
    }

    pub fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
        self.touch();
    }

    /// Class name and base path, if both are set and non-empty.
    pub fn context(&self) -> Option<(&str, &Path)> {
        let class_name = self.class_name.as_deref().filter(|c| !c.is_empty())?;
        let base_path = self
            .base_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())?;
        Some((class_name, base_path))
    }

    /// Folder of the given slice, if the session has a context.
    pub fn slice_dir(&self, slice: Slice) -> Option<PathBuf> {
        self.context()
            .map(|(class_name, base_path)| slice.dir(base_path, class_name))
    }

    /// Folder the current stage works on.
    pub fn current_dir(&self) -> Option<PathBuf> {
        self.slice_dir(self.stage.slice())
    }

    /// Whether the workflow is on and has everything it needs to run.
    pub fn is_active(&self) -> bool {
        self.enabled && self.context().is_some()
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}
