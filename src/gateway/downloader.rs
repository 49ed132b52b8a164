use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;

use crate::models::constants::download::DEFAULT_CLASS_NAME;
use crate::process::{ControlResponse, ProgressLine, Stream, TaskKind, TaskSlot};

use super::{process_failure, run_in_slot, Completion, GatewayError, Toolchain};

pub const DOWNLOADER_SCRIPT: &str = "reddit_downloader.py";

fn progress_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Downloaded\s+(\d+)/(\d+):|Download complete!\s+(\d+)\s+images")
            .expect("Invalid regex pattern")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DownloadProgress {
    /// `Downloaded 12/100: name.jpg`
    Item { downloaded: u32, total: u32 },
    /// `Download complete! 97 images saved to ...`
    Complete { count: u32 },
}

impl DownloadProgress {
    pub fn count(&self) -> u32 {
        match self {
            DownloadProgress::Item { downloaded, .. } => *downloaded,
            DownloadProgress::Complete { count } => *count,
        }
    }
}

/// Recognise a downloader progress line.
pub fn parse_download_progress(line: &str) -> Option<DownloadProgress> {
    let caps = progress_regex().captures(line)?;
    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    if let Some(count) = number(3) {
        return Some(DownloadProgress::Complete { count });
    }
    Some(DownloadProgress::Item {
        downloaded: number(1)?,
        total: number(2)?,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadRequest {
    pub subreddit: String,
    pub limit: u32,
    pub class_name: Option<String>,
    pub output_dir: PathBuf,
    /// Ask the downloader to reserve held-out test images.
    pub three_step: bool,
}

impl DownloadRequest {
    /// Class folder name; blank or missing names fall back to `Default`.
    pub fn class_name(&self) -> &str {
        self.class_name
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CLASS_NAME)
    }

    /// Folder the downloader fills: `{output_dir}/{class}`.
    pub fn class_dir(&self) -> PathBuf {
        self.output_dir.join(self.class_name())
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.subreddit.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "Please enter a subreddit name".to_string(),
            ));
        }
        if self.limit == 0 {
            return Err(GatewayError::InvalidRequest(
                "Download limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadReport {
    pub downloaded: u32,
    pub class_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Downloader {
    toolchain: Toolchain,
}

impl Downloader {
    pub fn new(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }

    pub fn command(&self, request: &DownloadRequest) -> Command {
        let mut command = self.toolchain.script_command(DOWNLOADER_SCRIPT);
        command
            .arg("--subreddit")
            .arg(request.subreddit.trim())
            .arg("--limit")
            .arg(request.limit.to_string())
            .arg("--class")
            .arg(request.class_name())
            .arg("--output")
            .arg(&request.output_dir);
        if request.three_step {
            command.arg("--three-step");
        }
        command
    }

    /// Download images. Progress lines are passed to `sink` as they arrive.
    ///
    /// The reported count is the last progress count seen; if none was seen
    /// it falls back to the requested limit.
    pub fn run<F>(
        &self,
        request: &DownloadRequest,
        slots: &TaskSlot,
        mut sink: F,
    ) -> Result<Completion<DownloadReport>, GatewayError>
    where
        F: FnMut(&ProgressLine),
    {
        request.validate()?;
        tracing::info!(
            subreddit = %request.subreddit,
            limit = request.limit,
            class = request.class_name(),
            three_step = request.three_step,
            "Starting download"
        );

        let mut downloaded = 0;
        let outcome = run_in_slot(
            "Download",
            TaskKind::Download,
            self.command(request),
            self.toolchain.grace,
            slots,
            |line| {
                if line.stream == Stream::Stdout {
                    if let Some(progress) = parse_download_progress(&line.text) {
                        downloaded = progress.count();
                    }
                }
                sink(line);
            },
        )?;

        if outcome.was_stopped() {
            tracing::info!("Download stopped by user");
            return Ok(Completion::Stopped);
        }
        if !outcome.success() {
            return Err(process_failure("Download", &outcome));
        }

        if downloaded == 0 {
            downloaded = outcome
                .stdout
                .iter()
                .filter_map(|line| match parse_download_progress(line) {
                    Some(DownloadProgress::Complete { count }) => Some(count),
                    _ => None,
                })
                .last()
                .unwrap_or(request.limit);
        }
        tracing::info!(downloaded, "Download finished");

        Ok(Completion::Finished(DownloadReport {
            downloaded,
            class_dir: request.class_dir(),
        }))
    }

    pub fn pause(slots: &TaskSlot) -> ControlResponse {
        slots
            .active(TaskKind::Download)
            .map_or(ControlResponse::NoActiveOperation, |h| h.pause())
    }

    pub fn resume(slots: &TaskSlot) -> ControlResponse {
        slots
            .active(TaskKind::Download)
            .map_or(ControlResponse::NoActiveOperation, |h| h.resume())
    }

    pub fn stop(slots: &TaskSlot) -> ControlResponse {
        slots
            .active(TaskKind::Download)
            .map_or(ControlResponse::NoActiveOperation, |h| h.stop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DownloadRequest {
        DownloadRequest {
            subreddit: "cats".to_string(),
            limit: 50,
            class_name: Some("cat".to_string()),
            output_dir: PathBuf::from("/tmp/out"),
            three_step: false,
        }
    }

    #[test]
    fn test_parse_item_line() {
        assert_eq!(
            parse_download_progress("Downloaded 12/100: abc.jpg"),
            Some(DownloadProgress::Item {
                downloaded: 12,
                total: 100
            })
        );
    }

    #[test]
    fn test_parse_complete_line() {
        assert_eq!(
            parse_download_progress("Download complete! 97 images saved to /x"),
            Some(DownloadProgress::Complete { count: 97 })
        );
    }

    #[test]
    fn test_parse_other_lines() {
        assert_eq!(parse_download_progress("Downloading images from r/cats..."), None);
        assert_eq!(parse_download_progress("Downloaded for 15%: 3/10: a.jpg"), None);
    }

    #[test]
    fn test_class_name_default() {
        let mut req = request();
        req.class_name = None;
        assert_eq!(req.class_name(), "Default");
        req.class_name = Some("   ".to_string());
        assert_eq!(req.class_name(), "Default");
        assert_eq!(req.class_dir(), PathBuf::from("/tmp/out/Default"));
    }

    #[test]
    fn test_validate() {
        assert!(request().validate().is_ok());
        let mut req = request();
        req.subreddit = " ".to_string();
        assert!(matches!(req.validate(), Err(GatewayError::InvalidRequest(_))));
        let mut req = request();
        req.limit = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_command_three_step_flag() {
        let downloader = Downloader::new(Toolchain::new("python3", "/scripts"));
        let mut req = request();
        let args = |req: &DownloadRequest| -> Vec<String> {
            downloader
                .command(req)
                .get_args()
                .map(|a| a.to_string_lossy().into_owned())
                .collect()
        };
        assert_eq!(
            args(&req),
            vec![
                "/scripts/reddit_downloader.py",
                "--subreddit",
                "cats",
                "--limit",
                "50",
                "--class",
                "cat",
                "--output",
                "/tmp/out"
            ]
        );
        req.three_step = true;
        assert_eq!(args(&req).last().map(String::as_str), Some("--three-step"));
    }

    #[test]
    fn test_control_without_download() {
        let slots = TaskSlot::new();
        assert_eq!(Downloader::pause(&slots), ControlResponse::NoActiveOperation);
        assert_eq!(Downloader::resume(&slots), ControlResponse::NoActiveOperation);
        assert_eq!(Downloader::stop(&slots), ControlResponse::NoActiveOperation);
    }
}
