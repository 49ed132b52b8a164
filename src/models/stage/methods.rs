use crate::models::constants::training;

use super::types::{EpochPolicy, Slice, Stage, View};

impl Stage {
    /// Every stage in workflow order.
    pub const ALL: [Stage; 6] = [
        Stage::Annotate15,
        Stage::Train15,
        Stage::Annotate35,
        Stage::Train35,
        Stage::Annotate50,
        Stage::TrainFull,
    ];

    /// Numeric form used in persisted state.
    pub fn value(&self) -> f64 {
        match self {
            Stage::Annotate15 => 1.0,
            Stage::Train15 => 1.5,
            Stage::Annotate35 => 2.0,
            Stage::Train35 => 2.5,
            Stage::Annotate50 => 3.0,
            Stage::TrainFull => 3.5,
        }
    }

    /// Parse the numeric form. Returns `None` for anything outside the sequence.
    pub fn from_value(value: f64) -> Option<Stage> {
        Stage::ALL.into_iter().find(|s| s.value() == value)
    }

    pub fn is_annotate(&self) -> bool {
        matches!(
            self,
            Stage::Annotate15 | Stage::Annotate35 | Stage::Annotate50
        )
    }

    pub fn is_training(&self) -> bool {
        !self.is_annotate()
    }

    /// The page this stage is worked on.
    pub fn view(&self) -> View {
        if self.is_annotate() {
            View::Annotate
        } else {
            View::Train
        }
    }

    /// The dataset slice this stage annotates or trains on.
    pub fn slice(&self) -> Slice {
        match self {
            Stage::Annotate15 | Stage::Train15 => Slice::P15,
            Stage::Annotate35 | Stage::Train35 => Slice::P35,
            Stage::Annotate50 => Slice::P50,
            Stage::TrainFull => Slice::Full,
        }
    }

    /// Learning percentage recorded in the trained model's metadata.
    /// `None` for annotate stages.
    pub fn learning_percent(&self) -> Option<u32> {
        self.is_training().then(|| self.slice().percent())
    }

    /// Whether auto-labeling starts switched on when this stage is entered.
    /// Only stages that follow a training run have a model to label with.
    pub fn auto_label_default(&self) -> bool {
        matches!(self, Stage::Annotate35 | Stage::Annotate50)
    }

    /// Epoch rule for training stages; `None` for annotate stages.
    pub fn epoch_policy(&self) -> Option<EpochPolicy> {
        match self {
            Stage::Train15 | Stage::Train35 => Some(EpochPolicy::Adjustable {
                default: training::DEFAULT_EPOCHS,
                min: training::MIN_EPOCHS,
                max: training::MAX_EPOCHS,
            }),
            Stage::TrainFull => Some(EpochPolicy::Fixed(training::FINAL_EPOCHS)),
            _ => None,
        }
    }
}
