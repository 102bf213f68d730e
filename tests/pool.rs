//! Orchestrator Integration Tests
//!
//! Full runs and worker-pool failure handling, with tool fakes.

mod common;

use std::sync::Arc;

use clipforge::adapters::ExportFormat;
use clipforge::core::{Orchestrator, RawStageExecutor, RunOptions, SeparatedStageExecutor};
use clipforge::domain::Action;
use clipforge::error::PipelineError;
use tempfile::TempDir;

use common::{file_names, write_text, write_wav, CopyTransform, FakeSeparator};

fn orchestrator(transform: Arc<CopyTransform>, separated_dir: &std::path::Path, work: &std::path::Path) -> Orchestrator {
    let raw = RawStageExecutor::new(
        transform.clone(),
        Arc::new(FakeSeparator::default()),
        separated_dir,
    );
    let separated = SeparatedStageExecutor::new(transform, 8, ExportFormat::default());
    Orchestrator::new(raw, separated)
        .with_workers(3)
        .with_work_dir(work)
}

#[tokio::test]
async fn test_one_failure_fails_run_but_keeps_other_outputs() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("separated");
    for name in ["alpha", "bravo", "broken", "delta"] {
        write_wav(&input.join(format!("htdemucs/{}/vocals.wav", name)), 1);
    }
    let out = temp.path().join("final");
    std::fs::create_dir_all(&out).unwrap();

    let transform = Arc::new(CopyTransform::failing_on("broken"));
    let orchestrator = orchestrator(transform, &input, &temp.path().join("work"));

    let options = RunOptions {
        input,
        output_dir: out.clone(),
        actions: vec![Action::Mono, Action::RemoveSilence],
    };
    let err = orchestrator.run(&options).await.unwrap_err();

    match err {
        PipelineError::PhaseFailed { failed, total, .. } => {
            assert_eq!(failed, 1);
            assert_eq!(total, 4);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(
        file_names(&out),
        [
            "alpha_silenceremoved_mono.wav",
            "bravo_silenceremoved_mono.wav",
            "delta_silenceremoved_mono.wav",
        ]
    );
}

#[tokio::test]
async fn test_full_run_from_sidecar_to_chunks() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("inbox");
    write_wav(&input.join("session.wav"), 17);
    write_text(&input.join("session.cue"), "00:00:00-00:00:10\n00:00:10-00:00:17\n");
    // No sidecar: skipped because extraction is requested
    write_wav(&input.join("uncurated.wav"), 20);

    let separated = temp.path().join("separated");
    let out = temp.path().join("final");
    std::fs::create_dir_all(&out).unwrap();

    let transform = Arc::new(CopyTransform::default());
    let orchestrator = orchestrator(transform.clone(), &separated, &temp.path().join("work"));

    let options = RunOptions {
        input,
        output_dir: out.clone(),
        actions: Action::ALL.to_vec(),
    };
    let report = orchestrator.run(&options).await.unwrap();

    assert_eq!(report.raw_operations, 2);
    assert_eq!(report.separated_operations, 2);
    // The copy transform never shortens audio: two 17s sections -> 2 chunks each
    assert_eq!(report.outputs.len(), 4);
    assert_eq!(file_names(&out).len(), 4);
    assert!(report.completed_at.is_some());

    // Separation artifacts persist in the canonical folder beyond the run
    assert!(separated.join("htdemucs/session_0/vocals.wav").is_file());
    assert!(separated.join("htdemucs/session_1/vocals.wav").is_file());
    assert_eq!(CopyTransform::count(&transform.conversions), 1);

    // Workspaces are gone once the run returns
    assert!(file_names(&temp.path().join("work")).is_empty());
}

#[tokio::test]
async fn test_raw_only_run_writes_to_output() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("inbox");
    write_wav(&input.join("take.wav"), 2);

    let separated = temp.path().join("separated");
    let orchestrator = orchestrator(Arc::new(CopyTransform::default()), &separated, &temp.path().join("work"));

    let options = RunOptions {
        input,
        output_dir: separated.clone(),
        actions: vec![Action::Separate],
    };
    let report = orchestrator.run(&options).await.unwrap();

    assert_eq!(report.raw_operations, 1);
    assert_eq!(report.separated_operations, 0);
    assert_eq!(report.outputs, vec![separated.join("htdemucs/take/vocals.wav")]);
}

#[tokio::test]
async fn test_empty_action_list_rejected() {
    let temp = TempDir::new().unwrap();
    let orchestrator = orchestrator(Arc::new(CopyTransform::default()), temp.path(), temp.path());

    let options = RunOptions {
        input: temp.path().to_path_buf(),
        output_dir: temp.path().to_path_buf(),
        actions: Vec::new(),
    };
    assert!(matches!(
        orchestrator.run(&options).await,
        Err(PipelineError::Precondition(_))
    ));
}

#[tokio::test]
async fn test_raw_failure_aborts_run() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("inbox");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("clip.mp4"), b"video").unwrap();

    let transform = Arc::new(CopyTransform {
        corrupt_conversion: true,
        ..Default::default()
    });
    let out = temp.path().join("final");
    std::fs::create_dir_all(&out).unwrap();
    let orchestrator = orchestrator(transform, &temp.path().join("separated"), &temp.path().join("work"));

    // Extraction would skip the file (no sidecar), so start at separation
    let options = RunOptions {
        input,
        output_dir: out.clone(),
        actions: vec![Action::Separate, Action::Mono, Action::Split],
    };

    let err = orchestrator.run(&options).await.unwrap_err();
    assert!(matches!(err, PipelineError::Format { .. }));
    assert!(file_names(&out).is_empty());
}

#[tokio::test]
async fn test_stray_files_in_inbox_do_not_abort_run() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("inbox");
    write_wav(&input.join("song.wav"), 2);
    write_text(&input.join("notes.txt"), "lyrics draft");
    write_text(&input.join("cover.jpg"), "jpeg bytes");

    let separated = temp.path().join("separated");
    let transform = Arc::new(CopyTransform::default());
    let orchestrator = orchestrator(transform.clone(), &separated, &temp.path().join("work"));

    let options = RunOptions {
        input,
        output_dir: separated.clone(),
        actions: vec![Action::Separate],
    };
    let report = orchestrator.run(&options).await.unwrap();

    assert_eq!(report.raw_operations, 1);
    assert_eq!(report.outputs, vec![separated.join("htdemucs/song/vocals.wav")]);
    assert_eq!(CopyTransform::count(&transform.conversions), 1);
}
