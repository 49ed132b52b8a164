use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Slack allowed when checking that a box stays inside the unit square.
const EXTENT_TOLERANCE: f64 = 1e-6;

/// One bounding box on one image, in normalized center/size form.
///
/// All coordinates are relative to the image size and live in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub class_name: String,
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Annotation {
    pub fn new(
        class_name: impl Into<String>,
        center_x: f64,
        center_y: f64,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            center_x,
            center_y,
            width,
            height,
        }
    }

    /// Check the geometry invariants: finite values, positive size, and a box
    /// that stays inside the unit square.
    pub fn validate(&self) -> Result<()> {
        let values = [self.center_x, self.center_y, self.width, self.height];
        if values.iter().any(|v| !v.is_finite()) {
            bail!("Annotation '{}' has non-finite coordinates", self.class_name);
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            bail!(
                "Annotation '{}' has non-positive size {}x{}",
                self.class_name,
                self.width,
                self.height
            );
        }

        let (x_min, x_max) = (
            self.center_x - self.width / 2.0,
            self.center_x + self.width / 2.0,
        );
        let (y_min, y_max) = (
            self.center_y - self.height / 2.0,
            self.center_y + self.height / 2.0,
        );
        let inside = |lo: f64, hi: f64| lo >= -EXTENT_TOLERANCE && hi <= 1.0 + EXTENT_TOLERANCE;
        if !inside(x_min, x_max) || !inside(y_min, y_max) {
            bail!(
                "Annotation '{}' extends outside the image: center ({}, {}), size {}x{}",
                self.class_name,
                self.center_x,
                self.center_y,
                self.width,
                self.height
            );
        }

        Ok(())
    }

    /// Return a copy whose corners are clipped to the unit square.
    ///
    /// Used for boxes coming from inference, which can overshoot the image
    /// border by a few pixels.
    pub fn clamped(&self) -> Self {
        let x_min = (self.center_x - self.width / 2.0).clamp(0.0, 1.0);
        let x_max = (self.center_x + self.width / 2.0).clamp(0.0, 1.0);
        let y_min = (self.center_y - self.height / 2.0).clamp(0.0, 1.0);
        let y_max = (self.center_y + self.height / 2.0).clamp(0.0, 1.0);

        Self {
            class_name: self.class_name.clone(),
            center_x: (x_min + x_max) / 2.0,
            center_y: (y_min + y_max) / 2.0,
            width: x_max - x_min,
            height: y_max - y_min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_box_inside_image() {
        let ann = Annotation::new("cat", 0.5, 0.5, 0.2, 0.3);
        assert!(ann.validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_full_image_box() {
        let ann = Annotation::new("cat", 0.5, 0.5, 1.0, 1.0);
        assert!(ann.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_width() {
        let ann = Annotation::new("cat", 0.5, 0.5, 0.0, 0.3);
        let err = ann.validate().unwrap_err();
        assert!(err.to_string().contains("non-positive"));
    }

    #[test]
    fn test_validate_rejects_box_past_right_edge() {
        let ann = Annotation::new("cat", 0.95, 0.5, 0.2, 0.2);
        let err = ann.validate().unwrap_err();
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let ann = Annotation::new("cat", f64::NAN, 0.5, 0.2, 0.2);
        assert!(ann.validate().is_err());
    }

    #[test]
    fn test_clamped_trims_overshoot() {
        let ann = Annotation::new("dog", 0.95, 0.5, 0.2, 0.2).clamped();
        assert!((ann.center_x - 0.925).abs() < 1e-9);
        assert!((ann.width - 0.15).abs() < 1e-9);
        assert!(ann.validate().is_ok());
    }

    #[test]
    fn test_clamped_keeps_valid_box() {
        let ann = Annotation::new("dog", 0.4, 0.6, 0.2, 0.2);
        let clamped = ann.clamped();
        assert!((clamped.center_x - 0.4).abs() < 1e-9);
        assert!((clamped.center_y - 0.6).abs() < 1e-9);
        assert!((clamped.width - 0.2).abs() < 1e-9);
    }
}
