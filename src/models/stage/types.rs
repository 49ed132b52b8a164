use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Position in the three-step workflow.
///
/// Whole-numbered stages annotate a slice, half-numbered stages train on the
/// slice just annotated. The numeric form (`1`, `1.5`, ... `3.5`) is what gets
/// persisted, so old state files stay readable.
///
/// State machine:
/// - `Annotate15` (1) -> `Train15` (1.5)
/// - `Train15` (1.5) -> `Annotate35` (2)
/// - `Annotate35` (2) -> `Train35` (2.5)
/// - `Train35` (2.5) -> `Annotate50` (3)
/// - `Annotate50` (3) -> `TrainFull` (3.5), after merging all slices
/// - `TrainFull` (3.5) is terminal; completing it disables the workflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum Stage {
    /// Annotate the 15% slice by hand.
    #[default]
    Annotate15,
    /// Train on the 15% slice.
    Train15,
    /// Annotate the 35% slice, pre-labeled by the 15% model.
    Annotate35,
    /// Train on the 35% slice.
    Train35,
    /// Annotate the 50% slice, pre-labeled by the 35% model.
    Annotate50,
    /// Train on the merged 100% set.
    TrainFull,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl From<Stage> for f64 {
    fn from(stage: Stage) -> Self {
        stage.value()
    }
}

impl TryFrom<f64> for Stage {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Stage::from_value(value).ok_or_else(|| format!("Unknown three-step stage: {value}"))
    }
}

/// A percentage-bounded subset of a class's images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slice {
    #[serde(rename = "15")]
    P15,
    #[serde(rename = "35")]
    P35,
    #[serde(rename = "50")]
    P50,
    /// Merge of the other three, produced when the last annotate stage ends.
    #[serde(rename = "100")]
    Full,
}

/// The three slices produced by splitting a download, in assignment order.
pub const PARTITION_SLICES: [Slice; 3] = [Slice::P15, Slice::P35, Slice::P50];

/// Every slice, including the merged one.
pub const ALL_SLICES: [Slice; 4] = [Slice::P15, Slice::P35, Slice::P50, Slice::Full];

impl Slice {
    pub fn percent(&self) -> u32 {
        match self {
            Slice::P15 => 15,
            Slice::P35 => 35,
            Slice::P50 => 50,
            Slice::Full => 100,
        }
    }

    /// Folder name for this slice: `{class_name}_{percent}`.
    pub fn folder_name(&self, class_name: &str) -> String {
        format!("{class_name}_{}", self.percent())
    }

    /// Slice root under the class folder (`base_path` is `<datasets>/<class>`).
    pub fn dir(&self, base_path: &Path, class_name: &str) -> PathBuf {
        base_path.join(self.folder_name(class_name))
    }
}

impl std::fmt::Display for Slice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Which page of the workflow a stage lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Download,
    Classes,
    Annotate,
    Train,
    Test,
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Download => write!(f, "download"),
            View::Classes => write!(f, "classes"),
            View::Annotate => write!(f, "annotate"),
            View::Train => write!(f, "train"),
            View::Test => write!(f, "test"),
        }
    }
}

/// How the epoch count of a training stage may be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochPolicy {
    /// User-adjustable within `[min, max]`, starting at `default`.
    Adjustable { default: u32, min: u32, max: u32 },
    /// Fixed; the epoch field is disabled.
    Fixed(u32),
}

impl EpochPolicy {
    /// Apply the policy to a user request (`None` means "use the default").
    pub fn resolve(&self, requested: Option<u32>) -> u32 {
        match *self {
            EpochPolicy::Adjustable { default, min, max } => {
                requested.unwrap_or(default).clamp(min, max)
            }
            EpochPolicy::Fixed(epochs) => epochs,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, EpochPolicy::Fixed(_))
    }
}
