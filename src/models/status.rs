use serde::Serialize;

/// Readiness of each workflow step.
///
/// Always derived from the data on disk and in the class list; never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowStatus {
    /// Images are available.
    pub download: bool,
    /// At least one class is defined.
    pub classes: bool,
    /// A dataset with images is loaded and classes exist.
    pub annotate: bool,
    /// As `annotate`, plus at least one label file exists.
    pub train: bool,
}

impl WorkflowStatus {
    pub fn compute(
        image_count: usize,
        has_dataset: bool,
        class_count: usize,
        label_file_count: usize,
    ) -> Self {
        let has_images = image_count > 0;
        let has_classes = class_count > 0;
        let has_dataset = has_dataset && has_images;

        Self {
            download: has_images,
            classes: has_classes,
            annotate: has_dataset && has_classes,
            train: has_dataset && has_classes && label_file_count > 0,
        }
    }

    /// Step name / readiness pairs in workflow order.
    pub fn steps(&self) -> [(&'static str, bool); 4] {
        [
            ("download", self.download),
            ("classes", self.classes),
            ("annotate", self.annotate),
            ("train", self.train),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_ready() {
        let status = WorkflowStatus::compute(0, false, 0, 0);
        assert_eq!(status, WorkflowStatus::default());
    }

    #[test]
    fn test_images_without_classes() {
        let status = WorkflowStatus::compute(5, true, 0, 3);
        assert!(status.download);
        assert!(!status.classes);
        assert!(!status.annotate);
        assert!(!status.train);
    }

    #[test]
    fn test_annotate_ready_without_labels() {
        let status = WorkflowStatus::compute(5, true, 1, 0);
        assert!(status.annotate);
        assert!(!status.train);
    }

    #[test]
    fn test_train_ready() {
        let status = WorkflowStatus::compute(5, true, 2, 1);
        assert!(status.train);
        assert!(status.steps().iter().all(|(_, ready)| *ready));
    }

    #[test]
    fn test_empty_dataset_blocks_annotate() {
        let status = WorkflowStatus::compute(0, true, 2, 1);
        assert!(!status.annotate);
        assert!(!status.train);
    }
}
