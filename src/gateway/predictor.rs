use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::models::Annotation;
use crate::process::{ProgressLine, TaskKind, TaskSlot};

use super::{process_failure, run_in_slot, Completion, GatewayError, Toolchain};

pub const PREDICTOR_SCRIPT: &str = "predict.py";

const OUTPUT_PATH_MARKER: &str = "OUTPUT_PATH:";
const JSON_OUTPUT_MARKER: &str = "JSON_OUTPUT:";

/// One box reported by the predictor, normalized like [`Annotation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i64>,
    pub class_name: String,
    pub confidence: f64,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl Detection {
    /// Annotation for this box, clipped to the image.
    pub fn to_annotation(&self) -> Annotation {
        Annotation::new(
            self.class_name.clone(),
            self.x_center,
            self.y_center,
            self.width,
            self.height,
        )
        .clamped()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Image with the detections drawn on it.
    pub result_path: PathBuf,
    pub detections: Vec<Detection>,
}

/// Recover the result image path and the detections from predictor stdout.
///
/// Markers may appear anywhere in a line. An unparsable detection list is
/// logged and treated as empty.
pub fn parse_prediction_output(lines: &[String]) -> (Option<PathBuf>, Vec<Detection>) {
    let mut result_path = None;
    let mut detections = Vec::new();

    for line in lines {
        if let Some(idx) = line.find(OUTPUT_PATH_MARKER) {
            let path = line[idx + OUTPUT_PATH_MARKER.len()..].trim();
            if !path.is_empty() {
                result_path = Some(PathBuf::from(path));
            }
        }
        if let Some(idx) = line.find(JSON_OUTPUT_MARKER) {
            let json = line[idx + JSON_OUTPUT_MARKER.len()..].trim();
            match serde_json::from_str(json) {
                Ok(parsed) => detections = parsed,
                Err(e) => tracing::warn!(error = %e, "Failed to parse detection JSON"),
            }
        }
    }

    (result_path, detections)
}

#[derive(Debug, Clone)]
pub struct Predictor {
    toolchain: Toolchain,
}

impl Predictor {
    pub fn new(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }

    pub fn command(&self, model: &Path, image: &Path, confidence: f64) -> Command {
        let mut command = self.toolchain.script_command(PREDICTOR_SCRIPT);
        command
            .arg("--model")
            .arg(model)
            .arg("--source")
            .arg(image)
            .arg("--conf")
            .arg(confidence.to_string());
        command
    }

    /// Run inference on one image.
    ///
    /// A zero exit without an `OUTPUT_PATH:` line is reported as
    /// [`GatewayError::MissingOutput`], distinct from a failed run.
    pub fn run<F>(
        &self,
        model: &Path,
        image: &Path,
        confidence: f64,
        slots: &TaskSlot,
        sink: F,
    ) -> Result<Completion<Prediction>, GatewayError>
    where
        F: FnMut(&ProgressLine),
    {
        let outcome = run_in_slot(
            "Prediction",
            TaskKind::Prediction,
            self.command(model, image, confidence),
            self.toolchain.grace,
            slots,
            sink,
        )?;

        if outcome.was_stopped() {
            return Ok(Completion::Stopped);
        }
        if !outcome.success() {
            return Err(process_failure("Prediction", &outcome));
        }

        match parse_prediction_output(&outcome.stdout) {
            (Some(result_path), detections) => {
                tracing::debug!(
                    image = %image.display(),
                    detections = detections.len(),
                    "Prediction finished"
                );
                Ok(Completion::Finished(Prediction {
                    result_path,
                    detections,
                }))
            }
            (None, _) => Err(GatewayError::MissingOutput {
                tool: "Prediction",
                what: "an output path",
                output: outcome.stdout.join("\n"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_both_markers() {
        let out = lines(&[
            "image 1/1 /tmp/a.jpg: 640x480 1 cat",
            "OUTPUT_PATH:/runs/predict/a.jpg",
            "Detected: cat (conf: 0.91)",
            r#"JSON_OUTPUT:[{"class_id":0,"class_name":"cat","confidence":0.91,"x_center":0.5,"y_center":0.4,"width":0.2,"height":0.3}]"#,
        ]);
        let (path, detections) = parse_prediction_output(&out);
        assert_eq!(path, Some(PathBuf::from("/runs/predict/a.jpg")));
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_name, "cat");
        assert_eq!(detections[0].class_id, Some(0));
    }

    #[test]
    fn test_parse_marker_mid_line() {
        let out = lines(&["noise OUTPUT_PATH: /r/a.jpg  ", "x JSON_OUTPUT:[]"]);
        let (path, detections) = parse_prediction_output(&out);
        assert_eq!(path, Some(PathBuf::from("/r/a.jpg")));
        assert!(detections.is_empty());
    }

    #[test]
    fn test_parse_bad_json_gives_no_detections() {
        let out = lines(&["OUTPUT_PATH:/r/a.jpg", "JSON_OUTPUT:[{broken"]);
        let (path, detections) = parse_prediction_output(&out);
        assert!(path.is_some());
        assert!(detections.is_empty());
    }

    #[test]
    fn test_parse_missing_path() {
        let (path, _) = parse_prediction_output(&lines(&["No detections found.", "JSON_OUTPUT:[]"]));
        assert_eq!(path, None);
    }

    #[test]
    fn test_detection_to_annotation_clamps() {
        let detection = Detection {
            class_id: None,
            class_name: "cat".to_string(),
            confidence: 0.5,
            x_center: 0.95,
            y_center: 0.5,
            width: 0.2,
            height: 0.2,
        };
        let annotation = detection.to_annotation();
        assert!(annotation.validate().is_ok());
        assert!((annotation.center_x + annotation.width / 2.0 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_command_arguments() {
        let predictor = Predictor::new(Toolchain::new("python3", "/scripts"));
        let command = predictor.command(Path::new("/m/best.pt"), Path::new("/d/a.jpg"), 0.1);
        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "/scripts/predict.py",
                "--model",
                "/m/best.pt",
                "--source",
                "/d/a.jpg",
                "--conf",
                "0.1"
            ]
        );
    }
}
