use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::Config;
use crate::process::{ProgressLine, TaskKind, TaskSlot};

use super::{process_failure, run_in_slot, Completion, GatewayError, Toolchain};

pub const TRAINER_SCRIPT: &str = "yolo_trainer.py";

/// Marker the trainer prints before the path of the best weights.
const BEST_MODEL_MARKER: &str = "Best model saved at:";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingRequest {
    pub dataset: PathBuf,
    pub epochs: u32,
    pub batch_size: u32,
    pub image_size: u32,
    pub class_names: Vec<String>,
    /// Class recorded in the model name; defaults to the first class.
    pub model_class_name: Option<String>,
    /// Share of the dataset this run learns from; defaults to 100.
    pub learning_percent: Option<u32>,
}

impl TrainingRequest {
    fn model_class_name(&self) -> &str {
        self.model_class_name
            .as_deref()
            .or_else(|| self.class_names.first().map(String::as_str))
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    /// Best weights, if the trainer reported them or they exist at the
    /// default location.
    pub model_path: Option<PathBuf>,
    pub output: Vec<String>,
}

/// Host traits that change the trainer's batch, workers and device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hardware {
    pub apple_silicon: bool,
}

impl Hardware {
    pub fn detect() -> Self {
        Self {
            apple_silicon: cfg!(all(target_os = "macos", target_arch = "aarch64")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunedParams {
    pub batch_size: u32,
    pub workers: u32,
    pub device: &'static str,
}

/// Adjust batch size and worker count for the host.
///
/// On Apple Silicon small images allow larger batches on the unified memory:
/// up to 416 px doubles the batch (max 64) with 12 workers, up to 640 px
/// multiplies it by 1.5 (max 48) with 10 workers, larger images cap it at 32
/// with 8 workers.
pub fn tune(hardware: Hardware, batch_size: u32, image_size: u32, workers: u32) -> TunedParams {
    if !hardware.apple_silicon {
        return TunedParams {
            batch_size,
            workers,
            device: "auto",
        };
    }

    let (batch_size, workers) = if image_size <= 416 {
        ((batch_size * 2).min(64), 12)
    } else if image_size <= 640 {
        ((batch_size * 3 / 2).min(48), 10)
    } else {
        (batch_size.min(32), 8)
    };
    TunedParams {
        batch_size,
        workers,
        device: "mps",
    }
}

/// Path printed after the best-model marker, if any.
pub fn parse_best_model(lines: &[String]) -> Option<PathBuf> {
    lines.iter().rev().find_map(|line| {
        let idx = line.find(BEST_MODEL_MARKER)?;
        let path = line[idx + BEST_MODEL_MARKER.len()..].trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    })
}

/// Where the trainer leaves its best weights.
pub fn default_model_path(models_dir: &Path) -> PathBuf {
    models_dir
        .join("custom_model")
        .join("weights")
        .join("best.pt")
}

#[derive(Debug, Clone)]
pub struct Trainer {
    toolchain: Toolchain,
    models_dir: PathBuf,
    workers: u32,
    hardware: Hardware,
}

impl Trainer {
    pub fn new(toolchain: Toolchain, models_dir: impl Into<PathBuf>, workers: u32) -> Self {
        Self {
            toolchain,
            models_dir: models_dir.into(),
            workers,
            hardware: Hardware::detect(),
        }
    }

    pub fn from_config(toolchain: Toolchain, config: &Config) -> Self {
        Self::new(toolchain, config.models_dir.clone(), config.workers)
    }

    pub fn with_hardware(mut self, hardware: Hardware) -> Self {
        self.hardware = hardware;
        self
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn command(&self, request: &TrainingRequest) -> Command {
        let tuned = tune(
            self.hardware,
            request.batch_size,
            request.image_size,
            self.workers,
        );
        let mut command = self.toolchain.script_command(TRAINER_SCRIPT);
        command
            .arg("--data")
            .arg(&request.dataset)
            .arg("--epochs")
            .arg(request.epochs.to_string())
            .arg("--batch")
            .arg(tuned.batch_size.to_string())
            .arg("--img")
            .arg(request.image_size.to_string())
            .arg("--output")
            .arg(&self.models_dir)
            .arg("--class-names")
            .arg(request.class_names.join(","))
            .arg("--workers")
            .arg(tuned.workers.to_string())
            .arg("--device")
            .arg(tuned.device)
            .arg("--model-class-name")
            .arg(request.model_class_name())
            .arg("--model-learning-percent")
            .arg(request.learning_percent.unwrap_or(100).to_string());
        command
    }

    /// Run one training job. Every output line is passed to `sink`.
    pub fn run<F>(
        &self,
        request: &TrainingRequest,
        slots: &TaskSlot,
        sink: F,
    ) -> Result<Completion<TrainingReport>, GatewayError>
    where
        F: FnMut(&ProgressLine),
    {
        if request.class_names.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "At least one class is required for training".to_string(),
            ));
        }

        tracing::info!(
            dataset = %request.dataset.display(),
            epochs = request.epochs,
            learning_percent = ?request.learning_percent,
            "Starting training"
        );
        let outcome = run_in_slot(
            "Training",
            TaskKind::Training,
            self.command(request),
            self.toolchain.grace,
            slots,
            sink,
        )?;

        if outcome.was_stopped() {
            return Ok(Completion::Stopped);
        }
        if !outcome.success() {
            return Err(process_failure("Training", &outcome));
        }

        let model_path = parse_best_model(&outcome.stdout).or_else(|| {
            let fallback = default_model_path(&self.models_dir);
            fallback.is_file().then_some(fallback)
        });
        tracing::info!(model = ?model_path, "Training finished");

        Ok(Completion::Finished(TrainingReport {
            model_path,
            output: outcome.stdout,
        }))
    }
}
