//! `tristep download`: fetch images with the downloader script.
//!
//! With three-step mode on the image count is forced and the download is
//! split into slices when it finishes.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::gateway::Completion;

use super::common::{
    absolute, install_stop_handler, open_orchestrator, print_progress, print_step, user_error,
};

pub fn execute(
    subreddit: String,
    limit: Option<u32>,
    class_name: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut orchestrator = open_orchestrator()?;
    let output = output.map(absolute).transpose()?;
    let plan = orchestrator
        .plan_download(&subreddit, limit, class_name, output)
        .map_err(user_error)?;

    if plan.request.three_step && limit.is_some_and(|l| l != plan.request.limit) {
        println!(
            "{} Three-step mode downloads {} images",
            "!".yellow().bold(),
            plan.request.limit
        );
    }
    println!(
        "{} Downloading up to {} images from r/{} as {}",
        "→".cyan().bold(),
        plan.request.limit,
        plan.request.subreddit,
        plan.request.class_name().bold()
    );

    install_stop_handler(orchestrator.slots())?;
    match orchestrator
        .download(&plan, print_progress)
        .map_err(user_error)?
    {
        Completion::Finished(step) => {
            println!("{} Download complete", "✓".green().bold());
            print_step(&step);
        }
        Completion::Stopped => println!("{} Download stopped", "─".dimmed()),
    }
    Ok(())
}
