//! The three-step workflow: stage machine, orchestrator and their errors.

pub mod error;
pub mod machine;
pub mod orchestrator;

pub use error::WorkflowError;
pub use machine::{Advanced, AnnotateSetup, StageEntry, StageMachine, TrainingSetup};
pub use orchestrator::{AutoLabel, DownloadPlan, Orchestrator, WorkflowStep};
