//! Integration tests for the script adapters, using shell scripts in place of
//! the Python tools.
#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tristep::fs::WorkDir;
use tristep::gateway::{
    Completion, DownloadRequest, Downloader, ErrorCategory, GatewayError, Predictor, Toolchain,
    Trainer, TrainingRequest,
};
use tristep::models::{Stage, View};
use tristep::process::{ControlResponse, TaskKind, TaskSlot};
use tristep::workflow::Orchestrator;

const DOWNLOADER: &str = r#"
limit="$4"; class="$6"; out="$8"
mkdir -p "$out/$class"
i=1
while [ "$i" -le "$limit" ]; do
  : > "$out/$class/img_$i.jpg"
  echo "Downloaded $i/$limit: img_$i.jpg"
  i=$((i + 1))
done
if [ "$9" = "--three-step" ]; then
  mkdir -p "$out/$class/FOR_TESTS"
  : > "$out/$class/FOR_TESTS/held_out.jpg"
fi
echo "Download complete! $limit images saved to $out/$class"
"#;

const SLOW_DOWNLOADER: &str = r#"
while true; do
  echo "Downloaded 1/5: a.jpg"
  sleep 1
done
"#;

fn toolchain(temp: &TempDir, scripts: &[(&str, &str)]) -> Toolchain {
    let dir = temp.path().join("scripts");
    fs::create_dir_all(&dir).unwrap();
    for (name, body) in scripts {
        fs::write(dir.join(name), body).unwrap();
    }
    Toolchain::new("/bin/sh", dir).with_grace(Duration::from_secs(1))
}

fn training_request(dataset: &Path) -> TrainingRequest {
    TrainingRequest {
        dataset: dataset.to_path_buf(),
        epochs: 2,
        batch_size: 16,
        image_size: 640,
        class_names: vec!["cat".to_string()],
        model_class_name: Some("cat".to_string()),
        learning_percent: Some(15),
    }
}

trait FinishedExt<T> {
    fn finished(self) -> T;
}

impl<T> FinishedExt<T> for Completion<T> {
    fn finished(self) -> T {
        match self {
            Completion::Finished(value) => value,
            Completion::Stopped => panic!("task was stopped"),
        }
    }
}

fn wait_for_active(slots: &TaskSlot, kind: TaskKind) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while slots.active(kind).is_none() {
        assert!(Instant::now() < deadline, "task never started");
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn test_trainer_reports_best_model() {
    let temp = TempDir::new().unwrap();
    let tools = toolchain(
        &temp,
        &[(
            "yolo_trainer.py",
            "echo 'Epoch 1/2'\necho 'Epoch 2/2'\necho 'Best model saved at: /runs/best.pt'\n",
        )],
    );
    let trainer = Trainer::new(tools, temp.path().join("models"), 2);

    let mut lines = Vec::new();
    let report = trainer
        .run(&training_request(temp.path()), &TaskSlot::new(), |line| {
            lines.push(line.text.clone())
        })
        .expect("Training should succeed")
        .finished();

    assert_eq!(report.model_path, Some(PathBuf::from("/runs/best.pt")));
    assert_eq!(lines, vec!["Epoch 1/2", "Epoch 2/2", "Best model saved at: /runs/best.pt"]);
}

#[test]
fn test_trainer_failure_is_classified() {
    let temp = TempDir::new().unwrap();
    let tools = toolchain(
        &temp,
        &[(
            "yolo_trainer.py",
            "echo 'RuntimeError: CUDA out of memory' >&2\nexit 3\n",
        )],
    );
    let trainer = Trainer::new(tools, temp.path().join("models"), 2);

    let error = trainer
        .run(&training_request(temp.path()), &TaskSlot::new(), |_| {})
        .unwrap_err();
    match error {
        GatewayError::ProcessFailed { code, category, .. } => {
            assert_eq!(code, Some(3));
            assert_eq!(category, ErrorCategory::OutOfMemory);
        }
        other => panic!("expected process failure, got {other:?}"),
    }
}

#[test]
fn test_unmatched_failure_is_unknown() {
    let temp = TempDir::new().unwrap();
    let tools = toolchain(&temp, &[("yolo_trainer.py", "echo 'weird' >&2\nexit 1\n")]);
    let trainer = Trainer::new(tools, temp.path().join("models"), 2);

    let error = trainer
        .run(&training_request(temp.path()), &TaskSlot::new(), |_| {})
        .unwrap_err();
    assert_eq!(error.category(), Some(ErrorCategory::Unknown));
    assert_eq!(error.to_string(), "Training failed with code 1");
}

#[test]
fn test_predictor_parses_markers() {
    let temp = TempDir::new().unwrap();
    let tools = toolchain(
        &temp,
        &[(
            "predict.py",
            r#"echo "OUTPUT_PATH:/runs/predict/a.jpg"
echo 'JSON_OUTPUT:[{"class_name":"cat","confidence":0.8,"x_center":0.5,"y_center":0.5,"width":0.2,"height":0.2}]'
"#,
        )],
    );

    let prediction = Predictor::new(tools)
        .run(
            Path::new("/m/best.pt"),
            Path::new("/d/a.jpg"),
            0.25,
            &TaskSlot::new(),
            |_| {},
        )
        .unwrap()
        .finished();
    assert_eq!(prediction.result_path, PathBuf::from("/runs/predict/a.jpg"));
    assert_eq!(prediction.detections.len(), 1);
}

#[test]
fn test_predictor_without_output_path() {
    let temp = TempDir::new().unwrap();
    let tools = toolchain(&temp, &[("predict.py", "echo 'No detections found.'\n")]);

    let error = Predictor::new(tools)
        .run(
            Path::new("/m/best.pt"),
            Path::new("/d/a.jpg"),
            0.25,
            &TaskSlot::new(),
            |_| {},
        )
        .unwrap_err();
    assert!(matches!(error, GatewayError::MissingOutput { .. }));
}

#[test]
fn test_download_counts_progress() {
    let temp = TempDir::new().unwrap();
    let tools = toolchain(&temp, &[("reddit_downloader.py", DOWNLOADER)]);
    let request = DownloadRequest {
        subreddit: "cats".to_string(),
        limit: 4,
        class_name: Some("cat".to_string()),
        output_dir: temp.path().join("out"),
        three_step: false,
    };

    let report = Downloader::new(tools)
        .run(&request, &TaskSlot::new(), |_| {})
        .unwrap()
        .finished();
    assert_eq!(report.downloaded, 4);
    assert_eq!(report.class_dir, temp.path().join("out/cat"));
    assert_eq!(fs::read_dir(&report.class_dir).unwrap().count(), 4);
}

#[test]
fn test_download_pause_resume_stop() {
    let temp = TempDir::new().unwrap();
    let tools = toolchain(&temp, &[("reddit_downloader.py", SLOW_DOWNLOADER)]);
    let request = DownloadRequest {
        subreddit: "cats".to_string(),
        limit: 5,
        class_name: None,
        output_dir: temp.path().join("out"),
        three_step: false,
    };
    let slots = TaskSlot::new();

    let control = {
        let slots = slots.clone();
        thread::spawn(move || {
            wait_for_active(&slots, TaskKind::Download);
            let paused = Downloader::pause(&slots);
            let paused_twice = Downloader::pause(&slots);
            let resumed = Downloader::resume(&slots);
            let stopped = Downloader::stop(&slots);
            (paused, paused_twice, resumed, stopped)
        })
    };

    let completion = Downloader::new(tools).run(&request, &slots, |_| {}).unwrap();
    let (paused, paused_twice, resumed, stopped) = control.join().unwrap();

    assert_eq!(completion, Completion::Stopped);
    assert_eq!(paused, ControlResponse::Done);
    assert_eq!(paused_twice, ControlResponse::NoActiveOperation);
    assert_eq!(resumed, ControlResponse::Done);
    assert_eq!(stopped, ControlResponse::Done);
    assert!(!slots.is_claimed(TaskKind::Download));
}

#[test]
fn test_second_task_of_same_kind_is_rejected() {
    let temp = TempDir::new().unwrap();
    let tools = toolchain(&temp, &[("reddit_downloader.py", SLOW_DOWNLOADER)]);
    let request = DownloadRequest {
        subreddit: "cats".to_string(),
        limit: 5,
        class_name: None,
        output_dir: temp.path().join("out"),
        three_step: false,
    };
    let slots = TaskSlot::new();

    let first = {
        let slots = slots.clone();
        let tools = tools.clone();
        let request = request.clone();
        thread::spawn(move || Downloader::new(tools).run(&request, &slots, |_| {}))
    };
    wait_for_active(&slots, TaskKind::Download);

    let second = Downloader::new(tools).run(&request, &slots, |_| {});
    assert!(matches!(
        second,
        Err(GatewayError::AlreadyRunning(TaskKind::Download))
    ));

    assert_eq!(Downloader::stop(&slots), ControlResponse::Done);
    assert_eq!(first.join().unwrap().unwrap(), Completion::Stopped);
}

#[test]
fn test_three_step_download_through_orchestrator() {
    let temp = TempDir::new().unwrap();
    let scripts = temp.path().join("scripts");
    fs::create_dir_all(&scripts).unwrap();
    fs::write(scripts.join("reddit_downloader.py"), DOWNLOADER).unwrap();

    let work_dir = WorkDir::new(temp.path());
    work_dir.initialize().unwrap();
    fs::write(
        work_dir.config_path(),
        format!(
            "python = \"/bin/sh\"\nscripts_dir = \"{}\"\n",
            scripts.display()
        ),
    )
    .unwrap();

    let mut orchestrator = Orchestrator::open(work_dir).unwrap();
    orchestrator.set_enabled(true).unwrap();
    orchestrator.set_admin_mode(true).unwrap();

    let plan = orchestrator
        .plan_download("cats", None, Some("cat".to_string()), None)
        .unwrap();
    let step = orchestrator
        .download(&plan, |_| {})
        .unwrap()
        .finished();

    assert_eq!(step.view(), View::Annotate);
    assert_eq!(orchestrator.session().stage, Stage::Annotate15);
    let base = temp.path().join("datasets/raw/cat");
    assert_eq!(fs::read_dir(base.join("cat_15/images")).unwrap().count(), 1);
    assert_eq!(fs::read_dir(base.join("cat_35/images")).unwrap().count(), 3);
    assert_eq!(fs::read_dir(base.join("cat_50/images")).unwrap().count(), 6);
    assert!(base.join("FOR_TESTS/held_out.jpg").exists());
    assert!(!plan.request.class_dir().exists());
    assert_eq!(orchestrator.settings().statistics.images, 10);
}
