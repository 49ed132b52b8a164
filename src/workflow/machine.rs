//! The three-step stage machine.
//!
//! `StageMachine` borrows the session and moves it through
//! `1 -> 1.5 -> 2 -> 2.5 -> 3 -> finalize -> 3.5 -> disabled`. It mutates the
//! session in memory only; persisting each transition is the caller's job.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::fs::images::list_dataset_images;
use crate::fs::{merge, MergeOutcome};
use crate::models::constants::{download, training, THREE_STEP_CONFIDENCE};
use crate::models::{Slice, Stage, View, WorkflowSession};

use super::error::WorkflowError;

/// Everything an annotate stage needs once entered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotateSetup {
    pub stage: Stage,
    pub class_name: String,
    pub dataset: PathBuf,
    pub images: Vec<String>,
    /// Whether auto-labeling starts switched on.
    pub auto_label: bool,
    pub confidence: f64,
    /// Model from the previous training stage, if any.
    pub model_path: Option<PathBuf>,
}

/// Locked training parameters for a training stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSetup {
    pub stage: Stage,
    pub class_name: String,
    pub dataset: PathBuf,
    pub batch_size: u32,
    pub image_size: u32,
    pub epochs: u32,
    /// Whether the epoch count is fixed for this stage.
    pub epochs_locked: bool,
    pub learning_percent: u32,
}

/// Result of entering the current stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum StageEntry {
    Annotate(AnnotateSetup),
    Train(TrainingSetup),
}

impl StageEntry {
    pub fn view(&self) -> View {
        match self {
            StageEntry::Annotate(_) => View::Annotate,
            StageEntry::Train(_) => View::Train,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            StageEntry::Annotate(setup) => setup.stage,
            StageEntry::Train(setup) => setup.stage,
        }
    }
}

/// Where `advance` left the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advanced {
    Entered(Stage),
    /// The final training stage finished; the workflow is now disabled.
    Completed,
}

pub struct StageMachine<'a> {
    session: &'a mut WorkflowSession,
}

impl<'a> StageMachine<'a> {
    pub fn new(session: &'a mut WorkflowSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &WorkflowSession {
        self.session
    }

    pub fn stage(&self) -> Stage {
        self.session.stage
    }

    /// Class name and base path of an enabled session.
    fn context(&self) -> Result<(String, PathBuf), WorkflowError> {
        if !self.session.enabled {
            return Err(WorkflowError::NotEnabled);
        }
        self.session
            .context()
            .map(|(class_name, base_path)| (class_name.to_string(), base_path.to_path_buf()))
            .ok_or(WorkflowError::StateMissing)
    }

    fn existing_slice_dir(
        slice: Slice,
        base_path: &Path,
        class_name: &str,
    ) -> Result<PathBuf, WorkflowError> {
        let dir = slice.dir(base_path, class_name);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(WorkflowError::FolderNotFound {
                folder: slice.folder_name(class_name),
                path: dir,
            })
        }
    }

    /// Load the slice of the current annotate stage.
    ///
    /// A missing slice folder is reported as [`WorkflowError::FolderNotFound`];
    /// nothing falls back to an empty dataset and the stage is left alone.
    pub fn annotate_setup(&self) -> Result<AnnotateSetup, WorkflowError> {
        let stage = self.session.stage;
        if !stage.is_annotate() {
            return Err(WorkflowError::Validation(format!(
                "Stage {stage} is a training stage"
            )));
        }
        let (class_name, base_path) = self.context()?;
        let dataset = Self::existing_slice_dir(stage.slice(), &base_path, &class_name)?;
        let images = list_dataset_images(&dataset).map_err(|e| {
            WorkflowError::filesystem(format!("Failed to load {}", dataset.display()), e)
        })?;

        tracing::info!(
            stage = %stage,
            dataset = %dataset.display(),
            images = images.len(),
            "Entering annotate stage"
        );

        Ok(AnnotateSetup {
            stage,
            class_name,
            dataset,
            images,
            auto_label: stage.auto_label_default(),
            confidence: THREE_STEP_CONFIDENCE,
            model_path: self.session.model_path.clone(),
        })
    }

    /// Training parameters of the current training stage. `requested_epochs`
    /// is clamped into the stage's range, or ignored when epochs are fixed.
    pub fn training_setup(
        &self,
        requested_epochs: Option<u32>,
    ) -> Result<TrainingSetup, WorkflowError> {
        let stage = self.session.stage;
        let (Some(policy), Some(learning_percent)) =
            (stage.epoch_policy(), stage.learning_percent())
        else {
            return Err(WorkflowError::Validation(format!(
                "Stage {stage} is an annotate stage"
            )));
        };
        let (class_name, base_path) = self.context()?;
        let dataset = Self::existing_slice_dir(stage.slice(), &base_path, &class_name)?;

        Ok(TrainingSetup {
            stage,
            class_name,
            dataset,
            batch_size: training::BATCH_SIZE,
            image_size: training::IMAGE_SIZE,
            epochs: policy.resolve(requested_epochs),
            epochs_locked: policy.is_locked(),
            learning_percent,
        })
    }

    /// Enter the current stage: load its slice or lock its training parameters.
    pub fn enter(&self) -> Result<StageEntry, WorkflowError> {
        match self.session.stage.view() {
            View::Annotate => self.annotate_setup().map(StageEntry::Annotate),
            _ => self.training_setup(None).map(StageEntry::Train),
        }
    }

    /// Merge the three annotated slices into `{class}_100`.
    pub fn finalize(&self) -> Result<MergeOutcome, WorkflowError> {
        let (class_name, base_path) = self.context()?;
        let output = Slice::Full.dir(&base_path, &class_name);
        merge(&base_path, &class_name, &output).map_err(|e| {
            WorkflowError::filesystem(
                format!("Failed to merge annotations into {}", output.display()),
                e,
            )
        })
    }

    /// Move to the next stage after the current stage's work finished.
    ///
    /// Leaving stage 3 merges the slices first; if that fails the session
    /// stays at 3. Leaving 3.5 clears the session.
    pub fn advance(&mut self) -> Result<Advanced, WorkflowError> {
        self.context()?;
        let current = self.session.stage;

        let Some(next) = current.next() else {
            tracing::info!("Three-step workflow complete");
            self.session.clear();
            return Ok(Advanced::Completed);
        };

        if current == Stage::Annotate50 {
            self.finalize()?;
        }

        let next = current
            .try_advance(next)
            .map_err(|e| WorkflowError::Validation(e.to_string()))?;
        self.session.set_stage(next);
        tracing::info!(from = %current, to = %next, "Advanced three-step stage");
        Ok(Advanced::Entered(next))
    }

    /// Image count a download should request.
    ///
    /// Three-step mode forces 1000 (10 in admin mode); otherwise the
    /// requested count, or the default.
    pub fn download_limit(enabled: bool, admin_mode: bool, requested: Option<u32>) -> u32 {
        match (enabled, admin_mode) {
            (true, true) => download::ADMIN_LIMIT,
            (true, false) => download::THREE_STEP_LIMIT,
            (false, _) => requested
                .filter(|n| *n > 0)
                .unwrap_or(download::DEFAULT_LIMIT),
        }
    }
}
