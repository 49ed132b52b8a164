//! Workflow orchestrator.
//!
//! Owns the loaded [`PersistedState`] (and with it the authoritative
//! [`WorkflowSession`]), reacts to download, annotation and training
//! completion, and writes the state back after every transition.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::fs::images::{count_label_files, list_dataset_images};
use crate::fs::labels::{load_labels, save_labels};
use crate::fs::partition::{relocate_test_images, split};
use crate::fs::{StateStore, WorkDir};
use crate::gateway::trainer::default_model_path;
use crate::gateway::{
    Completion, DownloadReport, DownloadRequest, Downloader, Predictor, Toolchain, Trainer,
    TrainingReport, TrainingRequest,
};
use crate::models::constants::{training, THREE_STEP_CONFIDENCE};
use crate::models::{
    Annotation, ClassList, PersistedState, Slice, Stage, View, WorkflowSession, WorkflowStatus,
};
use crate::process::{ProgressLine, TaskSlot};

use super::error::WorkflowError;
use super::machine::{Advanced, StageEntry, StageMachine};

/// Where the workflow stands after an event was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowStep {
    /// Three-step mode entered (or stayed in) a stage.
    Entered(StageEntry),
    /// The final training run finished and three-step mode switched off.
    Completed,
    /// Three-step mode is off; the view is only a suggestion.
    Free(View),
}

impl WorkflowStep {
    pub fn view(&self) -> View {
        match self {
            WorkflowStep::Entered(entry) => entry.view(),
            WorkflowStep::Completed => View::Test,
            WorkflowStep::Free(view) => *view,
        }
    }
}

/// A download request plus the folder its images end up in.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadPlan {
    pub request: DownloadRequest,
    /// Three-step mode only: where the class folder with its slices is created.
    pub dataset_base: Option<PathBuf>,
}

/// Result of auto-labeling one image.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoLabel {
    pub image: PathBuf,
    pub annotations: Vec<Annotation>,
    /// False when the image already had labels and they were kept.
    pub saved: bool,
}

pub struct Orchestrator {
    work_dir: WorkDir,
    config: Config,
    store: StateStore,
    state: PersistedState,
    /// State as last read from or written to disk.
    saved: PersistedState,
    slots: TaskSlot,
}

impl Orchestrator {
    /// Load config and state from an initialized work directory.
    pub fn open(work_dir: WorkDir) -> Result<Self> {
        work_dir.load()?;
        let config = Config::load(&work_dir)?.resolved(work_dir.project_root());
        let store = StateStore::new(work_dir.state_path());
        let state = store.load()?;
        tracing::debug!(
            enabled = state.session.enabled,
            stage = %state.session.stage,
            "Loaded workflow state"
        );

        Ok(Self {
            work_dir,
            config,
            store,
            saved: state.clone(),
            state,
            slots: TaskSlot::new(),
        })
    }

    pub fn work_dir(&self) -> &WorkDir {
        &self.work_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &WorkflowSession {
        &self.state.session
    }

    pub fn settings(&self) -> &PersistedState {
        &self.state
    }

    pub fn classes(&self) -> &ClassList {
        &self.state.classes
    }

    /// Shared with signal handlers so they can stop running tasks.
    pub fn slots(&self) -> &TaskSlot {
        &self.slots
    }

    /// Save the fields changed since the last save, keeping whatever another
    /// process wrote to the rest, then adopt the merged state.
    fn persist(&mut self) -> Result<(), WorkflowError> {
        let merged = self
            .store
            .update(|disk| disk.merge_changes(&self.saved, &self.state))
            .map_err(|e| WorkflowError::filesystem("Failed to save workflow state", e))?;
        self.state = merged.clone();
        self.saved = merged;
        Ok(())
    }

    fn toolchain(&self) -> Result<Toolchain, WorkflowError> {
        Ok(Toolchain::from_config(&self.config)?)
    }

    /// Switch three-step mode on or off. Switching off forgets the session.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), WorkflowError> {
        if enabled {
            self.state.session.enabled = true;
        } else {
            self.state.session.clear();
        }
        tracing::info!(enabled, "Three-step mode toggled");
        self.persist()
    }

    pub fn set_admin_mode(&mut self, enabled: bool) -> Result<(), WorkflowError> {
        self.state.admin_mode = enabled;
        self.persist()
    }

    pub fn set_language(&mut self, language: &str) -> Result<(), WorkflowError> {
        self.state.language = language.to_string();
        self.persist()
    }

    pub fn add_class(&mut self, name: &str) -> Result<bool, WorkflowError> {
        let added = self
            .state
            .classes
            .add(name)
            .map_err(|e| WorkflowError::Validation(e.to_string()))?;
        if added {
            self.persist()?;
        }
        Ok(added)
    }

    pub fn remove_class(&mut self, name: &str) -> Result<bool, WorkflowError> {
        if let Some(active) = self.active_class() {
            if active == name {
                return Err(WorkflowError::Validation(format!(
                    "Class {name} is in use by the three-step workflow"
                )));
            }
        }
        let removed = self.state.classes.remove(name);
        if removed {
            if self.state.selected_class.as_deref() == Some(name) {
                self.state.selected_class = None;
            }
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn select_class(&mut self, name: &str) -> Result<(), WorkflowError> {
        if !self.state.classes.contains(name) {
            return Err(WorkflowError::Validation(format!("Unknown class: {name}")));
        }
        if let Some(active) = self.active_class() {
            if active != name {
                return Err(WorkflowError::Validation(format!(
                    "Three-step workflow is running for class {active}"
                )));
            }
        }
        self.state.selected_class = Some(name.to_string());
        self.persist()
    }

    /// Class the running three-step session labels with.
    fn active_class(&self) -> Option<&str> {
        let session = &self.state.session;
        if session.is_active() {
            session.class_name.as_deref()
        } else {
            None
        }
    }

    /// Readiness of the four workflow steps, recomputed from disk.
    pub fn workflow_status(&self, dataset: Option<&Path>) -> WorkflowStatus {
        let dataset = dataset
            .map(Path::to_path_buf)
            .or_else(|| self.current_dataset());
        let (images, labels) = match &dataset {
            Some(path) if path.is_dir() => (
                list_dataset_images(path).map(|v| v.len()).unwrap_or(0),
                count_label_files(path).unwrap_or(0),
            ),
            _ => (0, 0),
        };
        WorkflowStatus::compute(
            images,
            dataset.as_deref().is_some_and(Path::is_dir),
            self.state.classes.len(),
            labels,
        )
    }

    /// Folder the active three-step stage works on.
    pub fn current_dataset(&self) -> Option<PathBuf> {
        if self.state.session.is_active() {
            self.state.session.current_dir()
        } else {
            None
        }
    }

    /// Enter the current stage without changing it.
    pub fn enter(&self) -> Result<StageEntry, WorkflowError> {
        let mut session = self.state.session.clone();
        StageMachine::new(&mut session).enter()
    }

    /// Re-derive the page and dataset from the persisted stage after a restart.
    pub fn restore(&self) -> Result<Option<StageEntry>, WorkflowError> {
        let session = &self.state.session;
        if !session.enabled {
            return Ok(None);
        }
        if session.context().is_none() {
            return Err(WorkflowError::StateMissing);
        }
        tracing::info!(stage = %session.stage, "Restoring three-step workflow");
        self.enter().map(Some)
    }

    /// Advance the stage machine, persist, and enter the new stage.
    ///
    /// A stage reached whose folder is missing stays recorded; the folder
    /// error is returned so it can be fixed and the stage resumed.
    pub fn advance(&mut self) -> Result<WorkflowStep, WorkflowError> {
        let advanced = StageMachine::new(&mut self.state.session).advance()?;
        self.persist()?;
        match advanced {
            Advanced::Entered(_) => self.enter().map(WorkflowStep::Entered),
            Advanced::Completed => Ok(WorkflowStep::Completed),
        }
    }

    /// Build the download for the current mode.
    pub fn plan_download(
        &self,
        subreddit: &str,
        requested_limit: Option<u32>,
        class_name: Option<String>,
        output_dir: Option<PathBuf>,
    ) -> Result<DownloadPlan, WorkflowError> {
        let enabled = self.state.session.enabled;
        let limit =
            StageMachine::download_limit(enabled, self.state.admin_mode, requested_limit);

        let (output, dataset_base) = if enabled {
            let base = output_dir.unwrap_or_else(|| self.config.datasets_dir.clone());
            (self.config.temp_dir.clone(), Some(base))
        } else {
            (
                output_dir.unwrap_or_else(|| self.config.datasets_dir.clone()),
                None,
            )
        };

        let request = DownloadRequest {
            subreddit: subreddit.trim().to_string(),
            limit,
            class_name,
            output_dir: output,
            three_step: enabled,
        };
        request.validate()?;
        Ok(DownloadPlan {
            request,
            dataset_base,
        })
    }

    pub fn download<F>(
        &mut self,
        plan: &DownloadPlan,
        sink: F,
    ) -> Result<Completion<WorkflowStep>, WorkflowError>
    where
        F: FnMut(&ProgressLine),
    {
        let downloader = Downloader::new(self.toolchain()?);
        match downloader.run(&plan.request, &self.slots, sink)? {
            Completion::Finished(report) => self
                .on_download_complete(plan, &report)
                .map(Completion::Finished),
            Completion::Stopped => Ok(Completion::Stopped),
        }
    }

    /// Record a finished download. In three-step mode the temp class folder
    /// is split into slices and the workflow starts at stage 1.
    pub fn on_download_complete(
        &mut self,
        plan: &DownloadPlan,
        report: &DownloadReport,
    ) -> Result<WorkflowStep, WorkflowError> {
        let Some(dataset_base) = plan.dataset_base.as_deref() else {
            self.state
                .statistics
                .record_download(u64::from(report.downloaded));
            self.persist()?;
            return Ok(WorkflowStep::Free(View::Annotate));
        };

        let class_name = plan.request.class_name().to_string();
        let source = &report.class_dir;
        if !source.is_dir() {
            return Err(WorkflowError::Validation(format!(
                "Source folder not found after download: {}",
                source.display()
            )));
        }

        let outcome = split(
            source,
            dataset_base,
            &class_name,
            Some(report.downloaded as usize),
        )
        .map_err(|e| WorkflowError::filesystem("Image distribution failed", e))?;

        match relocate_test_images(source, &outcome.base_path) {
            Ok(Some(tests)) => tracing::info!(path = %tests.display(), "Moved test images"),
            Ok(None) => {}
            Err(e) => tracing::error!(error = %format!("{e:#}"), "Failed to move test images"),
        }

        let first = Slice::P15.dir(&outcome.base_path, &class_name);
        if !first.is_dir() {
            return Err(WorkflowError::FolderNotFound {
                folder: Slice::P15.folder_name(&class_name),
                path: first,
            });
        }

        self.state
            .session
            .start(class_name.as_str(), outcome.base_path.as_path());
        if let Err(e) = self.state.classes.add(&class_name) {
            tracing::warn!(error = %e, "Class not added");
        }
        self.state.selected_class = Some(class_name);
        self.state
            .statistics
            .record_download(u64::from(report.downloaded));
        self.persist()?;

        tracing::info!(
            base = %outcome.base_path.display(),
            p15 = outcome.counts.p15,
            p35 = outcome.counts.p35,
            p50 = outcome.counts.p50,
            "Three-step workflow started"
        );
        self.enter().map(WorkflowStep::Entered)
    }

    /// The user finished annotating the current dataset.
    pub fn on_annotation_finished(&mut self) -> Result<WorkflowStep, WorkflowError> {
        if !self.state.session.enabled {
            return Ok(WorkflowStep::Free(View::Train));
        }
        if !self.state.session.stage.is_annotate() {
            return Err(WorkflowError::Validation(format!(
                "Stage {} is a training stage; train before moving on",
                self.state.session.stage
            )));
        }
        self.advance()
    }

    /// Build the trainer request for the current mode.
    ///
    /// Three-step stages dictate the dataset, batch and image size, and the
    /// epoch range; the caller's values for those are ignored.
    pub fn training_request(
        &self,
        dataset: Option<PathBuf>,
        epochs: Option<u32>,
        batch_size: Option<u32>,
        image_size: Option<u32>,
    ) -> Result<TrainingRequest, WorkflowError> {
        let classes = &self.state.classes;
        if classes.is_empty() {
            return Err(WorkflowError::Validation(
                "Please add at least one class before training".to_string(),
            ));
        }
        let class_names = classes.names().to_vec();

        if self.state.session.enabled {
            let mut session = self.state.session.clone();
            let setup = StageMachine::new(&mut session).training_setup(epochs)?;
            if dataset.is_some() || batch_size.is_some() || image_size.is_some() {
                tracing::warn!("Three-step stage fixes dataset, batch and image size; ignoring overrides");
            }
            return Ok(TrainingRequest {
                dataset: setup.dataset,
                epochs: setup.epochs,
                batch_size: setup.batch_size,
                image_size: setup.image_size,
                class_names,
                model_class_name: Some(setup.class_name),
                learning_percent: Some(setup.learning_percent),
            });
        }

        let dataset = dataset
            .ok_or_else(|| WorkflowError::Validation("Please select a dataset".to_string()))?;
        Ok(TrainingRequest {
            dataset,
            epochs: epochs.unwrap_or(training::DEFAULT_EPOCHS),
            batch_size: batch_size.unwrap_or(training::BATCH_SIZE),
            image_size: image_size.unwrap_or(training::IMAGE_SIZE),
            model_class_name: self.state.selected_class().map(String::from),
            class_names,
            learning_percent: Some(Slice::Full.percent()),
        })
    }

    pub fn train<F>(
        &mut self,
        request: &TrainingRequest,
        sink: F,
    ) -> Result<Completion<WorkflowStep>, WorkflowError>
    where
        F: FnMut(&ProgressLine),
    {
        let trainer = Trainer::from_config(self.toolchain()?, &self.config);
        match trainer.run(request, &self.slots, sink)? {
            Completion::Finished(report) => self
                .on_training_complete(&report)
                .map(Completion::Finished),
            Completion::Stopped => Ok(Completion::Stopped),
        }
    }

    /// Record a finished training run and move the workflow on.
    ///
    /// After 1.5 and 2.5 the new model becomes the session's auto-label
    /// model; after 3.5 the workflow completes.
    pub fn on_training_complete(
        &mut self,
        report: &TrainingReport,
    ) -> Result<WorkflowStep, WorkflowError> {
        self.state.statistics.record_model();

        if !self.state.session.enabled {
            self.persist()?;
            return Ok(WorkflowStep::Free(View::Test));
        }

        match self.state.session.stage {
            Stage::Train15 | Stage::Train35 => {
                let model = report
                    .model_path
                    .clone()
                    .unwrap_or_else(|| default_model_path(&self.config.models_dir));
                tracing::info!(model = %model.display(), "Model recorded for auto-labeling");
                self.state.session.model_path = Some(model);
                self.advance()
            }
            Stage::TrainFull => self.advance(),
            _ => {
                self.persist()?;
                self.enter().map(WorkflowStep::Entered)
            }
        }
    }

    /// Model used for auto-labeling: the explicit one, the session's, or the
    /// trainer's default output if it exists.
    fn auto_label_model(&self, model: Option<&Path>) -> Result<PathBuf, WorkflowError> {
        if let Some(model) = model {
            return Ok(model.to_path_buf());
        }
        if self.state.session.enabled {
            if let Some(model) = &self.state.session.model_path {
                return Ok(model.clone());
            }
        }
        let fallback = default_model_path(&self.config.models_dir);
        if fallback.is_file() {
            return Ok(fallback);
        }
        Err(WorkflowError::Validation(
            "No trained model found for auto-labeling".to_string(),
        ))
    }

    /// Confidence threshold for auto-labeling in the current mode.
    pub fn auto_label_confidence(&self) -> f64 {
        let session = &self.state.session;
        if session.is_active() && session.stage.is_annotate() {
            THREE_STEP_CONFIDENCE
        } else {
            self.config.default_confidence
        }
    }

    /// Pre-label one image with the latest model.
    ///
    /// Detections are clamped to the image, zero-size boxes are dropped, and
    /// the result replaces the image's labels unless it already has some and
    /// `replace` is false. An empty result writes nothing.
    pub fn auto_label<F>(
        &self,
        image: &Path,
        model: Option<&Path>,
        replace: bool,
        sink: F,
    ) -> Result<Completion<AutoLabel>, WorkflowError>
    where
        F: FnMut(&ProgressLine),
    {
        let model = self.auto_label_model(model)?;
        let predictor = Predictor::new(self.toolchain()?);
        let confidence = self.auto_label_confidence();

        let prediction = match predictor.run(&model, image, confidence, &self.slots, sink)? {
            Completion::Finished(prediction) => prediction,
            Completion::Stopped => return Ok(Completion::Stopped),
        };

        let annotations: Vec<Annotation> = prediction
            .detections
            .iter()
            .map(|d| d.to_annotation())
            .filter(|a| a.width > 0.0 && a.height > 0.0)
            .collect();

        let has_labels = !self.load_annotations(image)?.is_empty();
        let saved = !annotations.is_empty() && (replace || !has_labels);
        if saved {
            self.save_annotations(image, &annotations)?;
        }
        tracing::info!(
            image = %image.display(),
            boxes = annotations.len(),
            saved,
            "Auto-labeled image"
        );

        Ok(Completion::Finished(AutoLabel {
            image: image.to_path_buf(),
            annotations,
            saved,
        }))
    }

    pub fn save_annotations(
        &self,
        image: &Path,
        annotations: &[Annotation],
    ) -> Result<PathBuf, WorkflowError> {
        save_labels(image, annotations, &self.state.classes).map_err(|e| {
            WorkflowError::filesystem(format!("Failed to save labels for {}", image.display()), e)
        })
    }

    pub fn load_annotations(&self, image: &Path) -> Result<Vec<Annotation>, WorkflowError> {
        load_labels(image, &self.state.classes).map_err(|e| {
            WorkflowError::filesystem(format!("Failed to load labels for {}", image.display()), e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::partition::ensure_slice_dirs;
    use crate::models::stage::ALL_SLICES;
    use std::fs;
    use tempfile::TempDir;

    fn open(temp: &TempDir) -> Orchestrator {
        let work_dir = WorkDir::new(temp.path());
        work_dir.initialize().unwrap();
        Orchestrator::open(work_dir).unwrap()
    }

    fn start_session(orchestrator: &mut Orchestrator, temp: &TempDir) -> PathBuf {
        let base = temp.path().join("datasets/cat");
        for slice in ALL_SLICES {
            ensure_slice_dirs(&slice.dir(&base, "cat")).unwrap();
        }
        orchestrator.state.session.start("cat", &base);
        orchestrator.state.classes.add("cat").unwrap();
        base
    }

    #[test]
    fn test_state_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let mut orchestrator = open(&temp);
        start_session(&mut orchestrator, &temp);
        orchestrator.advance().unwrap();

        let reopened = open(&temp);
        assert_eq!(reopened.session().stage, Stage::Train15);
        assert_eq!(reopened.session().class_name.as_deref(), Some("cat"));
    }

    #[test]
    fn test_restore_without_context_is_state_missing() {
        let temp = TempDir::new().unwrap();
        let mut orchestrator = open(&temp);
        orchestrator.set_enabled(true).unwrap();
        assert!(matches!(
            orchestrator.restore(),
            Err(WorkflowError::StateMissing)
        ));
    }

    #[test]
    fn test_restore_derives_view_from_stage() {
        let temp = TempDir::new().unwrap();
        let mut orchestrator = open(&temp);
        start_session(&mut orchestrator, &temp);
        orchestrator.state.session.set_stage(Stage::Train35);

        let entry = orchestrator.restore().unwrap().unwrap();
        assert_eq!(entry.view(), View::Train);
        assert_eq!(entry.stage(), Stage::Train35);
    }

    #[test]
    fn test_disable_clears_session() {
        let temp = TempDir::new().unwrap();
        let mut orchestrator = open(&temp);
        start_session(&mut orchestrator, &temp);
        orchestrator.set_enabled(false).unwrap();
        assert!(!orchestrator.session().enabled);
        assert!(orchestrator.session().class_name.is_none());
    }

    #[test]
    fn test_free_mode_training_requires_dataset() {
        let temp = TempDir::new().unwrap();
        let mut orchestrator = open(&temp);
        orchestrator.add_class("dog").unwrap();
        orchestrator.add_class("cat").unwrap();

        assert!(matches!(
            orchestrator.training_request(None, None, None, None),
            Err(WorkflowError::Validation(_))
        ));

        let request = orchestrator
            .training_request(Some(PathBuf::from("/data/x")), Some(5), None, None)
            .unwrap();
        assert_eq!(request.epochs, 5);
        assert_eq!(request.batch_size, 16);
        assert_eq!(request.model_class_name.as_deref(), Some("dog"));
        assert_eq!(request.learning_percent, Some(100));
    }

    #[test]
    fn test_three_step_training_request_is_locked() {
        let temp = TempDir::new().unwrap();
        let mut orchestrator = open(&temp);
        let base = start_session(&mut orchestrator, &temp);
        orchestrator.state.session.set_stage(Stage::Train35);

        let request = orchestrator
            .training_request(Some(PathBuf::from("/elsewhere")), Some(300), Some(4), Some(320))
            .unwrap();
        assert_eq!(request.dataset, base.join("cat_35"));
        assert_eq!(request.epochs, 100);
        assert_eq!((request.batch_size, request.image_size), (16, 640));
        assert_eq!(request.learning_percent, Some(35));
        assert_eq!(request.model_class_name.as_deref(), Some("cat"));
    }

    #[test]
    fn test_training_complete_records_model_and_advances() {
        let temp = TempDir::new().unwrap();
        let mut orchestrator = open(&temp);
        start_session(&mut orchestrator, &temp);
        orchestrator.state.session.set_stage(Stage::Train15);

        let report = TrainingReport {
            model_path: Some(PathBuf::from("/m/best.pt")),
            output: Vec::new(),
        };
        let step = orchestrator.on_training_complete(&report).unwrap();

        assert_eq!(step.view(), View::Annotate);
        assert_eq!(orchestrator.session().stage, Stage::Annotate35);
        assert_eq!(
            orchestrator.session().model_path,
            Some(PathBuf::from("/m/best.pt"))
        );
        assert_eq!(orchestrator.settings().statistics.models, 1);
        match step {
            WorkflowStep::Entered(StageEntry::Annotate(setup)) => {
                assert!(setup.auto_label);
                assert_eq!(setup.model_path, Some(PathBuf::from("/m/best.pt")));
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn test_final_training_completes_workflow() {
        let temp = TempDir::new().unwrap();
        let mut orchestrator = open(&temp);
        start_session(&mut orchestrator, &temp);
        orchestrator.state.session.set_stage(Stage::TrainFull);

        let report = TrainingReport {
            model_path: None,
            output: Vec::new(),
        };
        let step = orchestrator.on_training_complete(&report).unwrap();
        assert_eq!(step, WorkflowStep::Completed);
        assert!(!orchestrator.session().enabled);
        assert!(!open(&temp).session().enabled);
    }

    #[test]
    fn test_free_download_only_counts() {
        let temp = TempDir::new().unwrap();
        let mut orchestrator = open(&temp);
        let plan = orchestrator
            .plan_download("cats", Some(20), None, None)
            .unwrap();
        assert_eq!(plan.request.limit, 20);
        assert!(!plan.request.three_step);

        let report = DownloadReport {
            downloaded: 17,
            class_dir: plan.request.class_dir(),
        };
        let step = orchestrator.on_download_complete(&plan, &report).unwrap();
        assert_eq!(step, WorkflowStep::Free(View::Annotate));
        assert_eq!(orchestrator.settings().statistics.images, 17);
        assert_eq!(orchestrator.settings().statistics.datasets, 1);
        assert!(orchestrator.classes().is_empty());
    }

    #[test]
    fn test_three_step_download_starts_workflow() {
        let temp = TempDir::new().unwrap();
        let mut orchestrator = open(&temp);
        orchestrator.set_enabled(true).unwrap();
        orchestrator.set_admin_mode(true).unwrap();

        let plan = orchestrator
            .plan_download("cats", Some(500), Some("cat".to_string()), None)
            .unwrap();
        assert_eq!(plan.request.limit, 10);
        assert!(plan.request.three_step);

        let class_dir = plan.request.class_dir();
        fs::create_dir_all(class_dir.join("FOR_TESTS")).unwrap();
        fs::write(class_dir.join("FOR_TESTS/t.jpg"), b"x").unwrap();
        for i in 0..10 {
            fs::write(class_dir.join(format!("img{i}.jpg")), b"x").unwrap();
        }
        let report = DownloadReport {
            downloaded: 10,
            class_dir: class_dir.clone(),
        };

        let step = orchestrator.on_download_complete(&plan, &report).unwrap();
        let base = orchestrator.config().datasets_dir.join("cat");
        match step {
            WorkflowStep::Entered(StageEntry::Annotate(setup)) => {
                assert_eq!(setup.dataset, base.join("cat_15"));
                assert_eq!(setup.images.len(), 1);
                assert!(!setup.auto_label);
            }
            other => panic!("unexpected step: {other:?}"),
        }
        assert_eq!(orchestrator.session().stage, Stage::Annotate15);
        assert!(orchestrator.classes().contains("cat"));
        assert!(base.join("FOR_TESTS/t.jpg").is_file());
        assert!(!class_dir.exists());
    }

    #[test]
    fn test_workflow_status_follows_disk() {
        let temp = TempDir::new().unwrap();
        let mut orchestrator = open(&temp);
        let base = start_session(&mut orchestrator, &temp);
        let dataset = base.join("cat_15");

        let status = orchestrator.workflow_status(None);
        assert!(!status.download);
        assert!(status.classes);

        fs::write(dataset.join("images/a.jpg"), b"x").unwrap();
        let status = orchestrator.workflow_status(None);
        assert!(status.annotate);
        assert!(!status.train);

        orchestrator
            .save_annotations(
                &dataset.join("images/a.jpg"),
                &[Annotation::new("cat", 0.5, 0.5, 0.2, 0.2)],
            )
            .unwrap();
        assert!(orchestrator.workflow_status(None).train);
    }
}
