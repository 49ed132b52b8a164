/// Image extensions recognised in dataset folders (matched case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Subdirectory of a dataset root holding the images.
pub const IMAGES_DIR: &str = "images";

/// Subdirectory of a dataset root holding one label file per image.
pub const LABELS_DIR: &str = "labels";

/// Extension of label files.
pub const LABEL_EXTENSION: &str = "txt";

/// Folder the downloader fills with held-out test images.
pub const TEST_IMAGES_DIR: &str = "FOR_TESTS";

/// Fraction of the downloaded set assigned to the first annotate stage.
pub const SLICE_15_FRACTION: f64 = 0.15;

/// Fraction of the downloaded set assigned to the second annotate stage.
pub const SLICE_35_FRACTION: f64 = 0.35;

/// Confidence threshold used for auto-labeling outside the three-step workflow.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// Confidence threshold used for auto-labeling inside three-step annotate stages.
/// Lower than the default so more candidate boxes surface for manual correction.
pub const THREE_STEP_CONFIDENCE: f64 = 0.10;

/// Training parameters fixed while a three-step training stage is active.
pub mod training {
    pub const BATCH_SIZE: u32 = 16;
    pub const IMAGE_SIZE: u32 = 640;
    pub const DEFAULT_EPOCHS: u32 = 50;
    pub const MIN_EPOCHS: u32 = 1;
    pub const MAX_EPOCHS: u32 = 100;
    /// Epoch count for the final run on the merged set; not user-adjustable.
    pub const FINAL_EPOCHS: u32 = 100;
}

/// Download quotas.
pub mod download {
    /// Forced image count while three-step mode is enabled.
    pub const THREE_STEP_LIMIT: u32 = 1000;
    /// Forced image count when admin/fast-test mode is also enabled.
    pub const ADMIN_LIMIT: u32 = 10;
    /// Limit used when the caller does not request one.
    pub const DEFAULT_LIMIT: u32 = 100;
    /// Class name used for free-mode downloads without an explicit class.
    pub const DEFAULT_CLASS_NAME: &str = "Default";
}
