//! `tristep status`: classes, statistics, step readiness and the three-step session.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::models::{Statistics, WorkflowSession, WorkflowStatus};
use crate::workflow::Orchestrator;

use super::common::{absolute, open_orchestrator};

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    project: PathBuf,
    classes: &'a [String],
    selected_class: Option<&'a str>,
    statistics: &'a Statistics,
    workflow: WorkflowStatus,
    three_step: &'a WorkflowSession,
    admin_mode: bool,
    language: &'a str,
}

fn collect<'a>(orchestrator: &'a Orchestrator, dataset: Option<&Path>) -> StatusReport<'a> {
    let settings = orchestrator.settings();
    StatusReport {
        project: orchestrator.work_dir().project_root().to_path_buf(),
        classes: settings.classes.names(),
        selected_class: settings.selected_class(),
        statistics: &settings.statistics,
        workflow: orchestrator.workflow_status(dataset),
        three_step: orchestrator.session(),
        admin_mode: settings.admin_mode,
        language: &settings.language,
    }
}

pub fn execute(dataset: Option<PathBuf>, json: bool) -> Result<()> {
    let orchestrator = open_orchestrator()?;
    let dataset = dataset.map(absolute).transpose()?;
    let report = collect(&orchestrator, dataset.as_deref());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", "Project".bold(), report.project.display());

    println!("\n{}", "Workflow".bold());
    println!("{}", "─".repeat(40).dimmed());
    for (step, ready) in report.workflow.steps() {
        let glyph = if ready { "✓".green().bold() } else { "○".dimmed() };
        println!("  {glyph} {step}");
    }

    println!("\n{}", "Classes".bold());
    println!("{}", "─".repeat(40).dimmed());
    if report.classes.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for (i, name) in report.classes.iter().enumerate() {
        let marker = if report.selected_class == Some(name.as_str()) { "*" } else { " " };
        println!("  {marker} {i} {name}");
    }

    let stats = report.statistics;
    println!("\n{}", "Statistics".bold());
    println!("{}", "─".repeat(40).dimmed());
    println!(
        "  Datasets: {}  Images: {}  Models: {}",
        stats.datasets, stats.images, stats.models
    );

    println!("\n{}", "Three-step".bold());
    println!("{}", "─".repeat(40).dimmed());
    print_session(report.three_step, report.admin_mode);
    Ok(())
}

pub fn print_session(session: &WorkflowSession, admin_mode: bool) {
    if !session.enabled {
        println!("  {} disabled", "○".dimmed());
        return;
    }
    let admin = if admin_mode { " (admin)" } else { "" };
    println!(
        "  {} enabled{admin}, stage {} ({})",
        "●".green().bold(),
        session.stage,
        session.stage.view()
    );
    match session.context() {
        Some((class_name, base_path)) => {
            println!("  Class: {class_name}");
            println!("  Base:  {}", base_path.display());
        }
        None => println!(
            "  {} Class or base path missing; download a dataset to start",
            "!".yellow().bold()
        ),
    }
    if let Some(model) = &session.model_path {
        println!("  Model: {}", model.display());
    }
}
