//! `tristep predict`: run the predictor on one image and print its detections.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::gateway::{Completion, Predictor, Toolchain};

use super::common::{absolute, install_stop_handler, open_orchestrator, print_progress};

pub fn execute(model: PathBuf, image: PathBuf, confidence: Option<f64>) -> Result<()> {
    let orchestrator = open_orchestrator()?;
    let model = absolute(model)?;
    let image = absolute(image)?;
    let confidence = confidence.unwrap_or(orchestrator.config().default_confidence);

    let predictor = Predictor::new(Toolchain::from_config(orchestrator.config())?);
    install_stop_handler(orchestrator.slots())?;

    let prediction = match predictor.run(
        &model,
        &image,
        confidence,
        orchestrator.slots(),
        print_progress,
    )? {
        Completion::Finished(prediction) => prediction,
        Completion::Stopped => {
            println!("{} Prediction stopped", "─".dimmed());
            return Ok(());
        }
    };

    println!(
        "{} {} detection(s); result at {}",
        "✓".green().bold(),
        prediction.detections.len(),
        prediction.result_path.display()
    );
    for d in &prediction.detections {
        println!(
            "  {:<12} {:.2}  center ({:.4}, {:.4})  size {:.4} x {:.4}",
            d.class_name, d.confidence, d.x_center, d.y_center, d.width, d.height
        );
    }
    Ok(())
}
