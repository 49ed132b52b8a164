//! Child-process plumbing for the external trainer, predictor and downloader.

pub mod slot;
pub mod task;

pub use slot::{SlotBusy, SlotClaim, TaskKind, TaskSlot};
pub use task::{
    render_command, ControlResponse, ProcessTask, ProgressLine, Stream, TaskHandle, TaskOutcome,
    TaskStatus,
};
