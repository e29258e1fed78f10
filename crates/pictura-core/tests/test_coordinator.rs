mod common;

use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;

use pictura_core::compress::{
    BatchCoordinator, HandleStats, JobEvent, JobId, JobObserver, JobOutcome, JobStatus,
};
use pictura_core::error::PicturaError;

use common::{tagged_file, GatedCompressor, Script, ScriptedCompressor};

fn scripted(
    scripts: impl IntoIterator<Item = (u8, Script)>,
) -> (BatchCoordinator, Arc<ScriptedCompressor>) {
    let compressor = Arc::new(ScriptedCompressor::new(scripts));
    (BatchCoordinator::new(compressor.clone()), compressor)
}

// ---------------------------------------------------------------------------
// Single job
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_compress_one_records_sizes_and_ratio() {
    let (coord, _) = scripted([(1, Script::Output(400_000))]);
    let ids = coord.intake([tagged_file("photo.png", 1, 1_000_000)]);

    let outcome = coord.compress_one(ids[0]).await.unwrap();
    match outcome {
        JobOutcome::Compressed {
            id,
            compressed_size,
            ratio,
        } => {
            assert_eq!(id, ids[0]);
            assert_eq!(compressed_size, 400_000);
            assert_relative_eq!(ratio, 0.6, epsilon = 1e-12);
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let job = coord.job(ids[0]).unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.original_size, 1_000_000);
    assert_eq!(job.compressed_size, Some(400_000));
    assert_relative_eq!(job.compression_ratio.unwrap(), 0.6, epsilon = 1e-12);
    assert_eq!(job.download_name(), "compressed-photo.png");
}

#[tokio::test]
async fn test_compress_one_failure_is_recorded_on_job() {
    let (coord, _) = scripted([(1, Script::Fail("quota exceeded"))]);
    let ids = coord.intake([tagged_file("a.png", 1, 100)]);

    let outcome = coord.compress_one(ids[0]).await.unwrap();
    assert_eq!(
        outcome,
        JobOutcome::Failed {
            id: ids[0],
            message: "quota exceeded".into()
        }
    );

    let job = coord.job(ids[0]).unwrap();
    assert_eq!(job.status.error_message(), Some("quota exceeded"));
    assert_eq!(job.compressed_size, None);
    assert_eq!(job.compression_ratio, None);
}

#[tokio::test]
async fn test_compress_one_unknown_job() {
    let (coord, compressor) = scripted([]);
    let missing = JobId::new();
    let err = coord.compress_one(missing).await.unwrap_err();
    assert!(matches!(err, PicturaError::JobNotFound(id) if id == missing));
    assert_eq!(compressor.calls(), 0);
}

#[tokio::test]
async fn test_compress_one_rejects_non_pending_job() {
    let (coord, compressor) = scripted([(1, Script::Output(10))]);
    let ids = coord.intake([tagged_file("a.png", 1, 100)]);
    coord.compress_one(ids[0]).await.unwrap();

    let err = coord.compress_one(ids[0]).await.unwrap_err();
    assert!(matches!(
        err,
        PicturaError::InvalidTransition {
            from: JobStatus::Done,
            event: JobEvent::Dispatch,
            ..
        }
    ));
    assert_eq!(compressor.calls(), 1);
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_compress_all_settles_every_job() {
    let (coord, compressor) = scripted((1..=5).map(|tag| (tag, Script::Output(50))));
    coord.intake((1..=5).map(|tag| tagged_file(&format!("{tag}.png"), tag, 100)));

    let report = coord.compress_all().await;
    assert_eq!(report.dispatched(), 5);
    assert_eq!(report.succeeded(), 5);
    assert_eq!(compressor.calls(), 5);
    assert!(coord.jobs().iter().all(|j| j.status.is_settled()));
    assert!(!coord.has_pending());
}

#[tokio::test]
async fn test_failures_are_isolated() {
    let scripts = (1..=6).map(|tag| match tag {
        2 | 5 => (tag, Script::Fail("rejected")),
        _ => (tag, Script::Output(25)),
    });
    let (coord, _) = scripted(scripts);
    let ids = coord.intake((1..=6).map(|tag| tagged_file(&format!("{tag}.jpg"), tag, 100)));

    let report = coord.compress_all().await;
    assert_eq!(report.succeeded(), 4);
    assert_eq!(report.failed(), 2);

    for (tag, id) in (1u8..=6).zip(&ids) {
        let job = coord.job(*id).unwrap();
        if tag == 2 || tag == 5 {
            assert_eq!(job.status.error_message(), Some("rejected"));
        } else {
            assert_eq!(job.status, JobStatus::Done);
            assert_eq!(job.compressed_size, Some(25));
            assert_relative_eq!(job.compression_ratio.unwrap(), 0.75, epsilon = 1e-12);
        }
    }
}

#[tokio::test]
async fn test_compress_all_leaves_settled_jobs_alone() {
    let (coord, compressor) = scripted([
        (1, Script::Output(10)),
        (2, Script::Fail("bad")),
        (3, Script::Output(30)),
    ]);
    let first = coord.intake([tagged_file("a.png", 1, 100), tagged_file("b.png", 2, 100)]);
    coord.compress_all().await;
    let before: Vec<_> = first.iter().map(|id| coord.job(*id).unwrap()).collect();

    let late = coord.intake([tagged_file("c.png", 3, 100)]);
    let report = coord.compress_all().await;

    assert_eq!(report.dispatched(), 1);
    assert_eq!(report.outcomes[0].id(), late[0]);
    assert_eq!(compressor.calls(), 3);
    let after: Vec<_> = first.iter().map(|id| coord.job(*id).unwrap()).collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_compress_all_on_empty_list() {
    let (coord, compressor) = scripted([]);
    let report = coord.compress_all().await;
    assert_eq!(report.dispatched(), 0);
    assert_eq!(compressor.calls(), 0);
}

#[tokio::test]
async fn test_jobs_are_compressing_while_in_flight() {
    let (compressor, mut gates) = GatedCompressor::new(&[1, 2]);
    let coord = BatchCoordinator::new(Arc::new(compressor));
    coord.intake([tagged_file("a.png", 1, 100), tagged_file("b.png", 2, 100)]);

    let (report, ()) = tokio::join!(coord.compress_all(), async {
        gates.wait_started(2).await;
        assert!(coord
            .jobs()
            .iter()
            .all(|j| j.status == JobStatus::Compressing));
        assert!(!coord.has_pending());
        gates.resolve(1, Script::Output(10));
        gates.resolve(2, Script::Output(20));
    });
    assert_eq!(report.succeeded(), 2);
}

#[tokio::test]
async fn test_out_of_order_completion_lands_on_right_jobs() {
    let (compressor, mut gates) = GatedCompressor::new(&[1, 2, 3]);
    let coord = BatchCoordinator::new(Arc::new(compressor));
    let ids = coord.intake([
        tagged_file("a.png", 1, 100),
        tagged_file("b.png", 2, 100),
        tagged_file("c.png", 3, 100),
    ]);

    let (report, ()) = tokio::join!(coord.compress_all(), async {
        gates.wait_started(3).await;
        gates.resolve(3, Script::Output(30));
        tokio::task::yield_now().await;
        gates.resolve(1, Script::Output(10));
        tokio::task::yield_now().await;
        gates.resolve(2, Script::Output(20));
    });

    let order: Vec<JobId> = report.outcomes.iter().map(JobOutcome::id).collect();
    assert_eq!(order, ids);
    for (id, size) in ids.iter().zip([10, 20, 30]) {
        assert_eq!(coord.job(*id).unwrap().compressed_size, Some(size));
    }
}

#[tokio::test]
async fn test_intake_during_batch_is_not_dispatched() {
    let (compressor, mut gates) = GatedCompressor::new(&[1]);
    let coord = BatchCoordinator::new(Arc::new(compressor));
    coord.intake([tagged_file("a.png", 1, 100)]);

    let (report, late) = tokio::join!(coord.compress_all(), async {
        gates.wait_started(1).await;
        let late = coord.intake([tagged_file("late.png", 9, 100)]);
        gates.resolve(1, Script::Output(10));
        late
    });

    assert_eq!(report.dispatched(), 1);
    assert_eq!(coord.job(late[0]).unwrap().status, JobStatus::Pending);
    assert!(coord.has_pending());
    assert_eq!(coord.len(), 2);
}

// ---------------------------------------------------------------------------
// Removal, retry, handles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_remove_while_compressing_discards_result() {
    let (compressor, mut gates) = GatedCompressor::new(&[1, 2, 3]);
    let coord = BatchCoordinator::new(Arc::new(compressor));
    let ids = coord.intake([
        tagged_file("a.png", 1, 100),
        tagged_file("b.png", 2, 100),
        tagged_file("c.png", 3, 100),
    ]);

    let (report, ()) = tokio::join!(coord.compress_all(), async {
        gates.wait_started(3).await;
        assert!(coord.remove(ids[1]));
        gates.resolve(1, Script::Output(10));
        gates.resolve(2, Script::Output(20));
        gates.resolve(3, Script::Fail("boom"));
    });

    assert_eq!(report.dispatched(), 3);
    assert_eq!(report.outcomes[1], JobOutcome::Discarded { id: ids[1] });
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);

    assert!(coord.job(ids[1]).is_none());
    assert_eq!(coord.len(), 2);

    // Three bound at intake plus one for the compressed result; the removed
    // job's handle and the replaced original are revoked.
    assert_eq!(
        coord.handle_stats(),
        HandleStats {
            bound: 4,
            revoked: 2,
            live: 2
        }
    );
}

#[tokio::test]
async fn test_remove_unknown_and_pending() {
    let (coord, _) = scripted([]);
    let ids = coord.intake([tagged_file("a.png", 1, 10)]);
    assert!(!coord.remove(JobId::new()));
    assert!(coord.remove(ids[0]));
    assert!(!coord.remove(ids[0]));
    assert!(coord.is_empty());
    assert_eq!(coord.handle_stats().live, 0);
}

#[tokio::test]
async fn test_retry_only_from_error() {
    let (coord, compressor) = scripted([(1, Script::Fail("nope")), (2, Script::Output(5))]);
    let ids = coord.intake([tagged_file("a.png", 1, 10), tagged_file("b.png", 2, 10)]);

    let err = coord.retry(ids[0]).unwrap_err();
    assert!(matches!(
        err,
        PicturaError::InvalidTransition {
            from: JobStatus::Pending,
            event: JobEvent::Retry,
            ..
        }
    ));

    coord.compress_all().await;
    coord.retry(ids[0]).unwrap();
    assert_eq!(coord.job(ids[0]).unwrap().status, JobStatus::Pending);
    assert!(coord.retry(ids[1]).is_err());
    assert!(matches!(
        coord.retry(JobId::new()),
        Err(PicturaError::JobNotFound(_))
    ));

    let report = coord.compress_all().await;
    assert_eq!(report.dispatched(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(compressor.calls(), 3);
}

#[tokio::test]
async fn test_preview_handle_swapped_on_success() {
    let (coord, _) = scripted([(1, Script::Output(4)), (2, Script::Fail("x"))]);
    let ids = coord.intake([tagged_file("a.png", 1, 10), tagged_file("b.png", 2, 10)]);
    let handle_a = coord.job(ids[0]).unwrap().preview;
    let handle_b = coord.job(ids[1]).unwrap().preview;
    assert_eq!(coord.preview_bytes(ids[0]).unwrap().len(), 10);

    coord.compress_all().await;

    let a = coord.job(ids[0]).unwrap();
    assert_ne!(a.preview, handle_a);
    assert_eq!(coord.preview_bytes(ids[0]).as_deref(), Some(&[1u8; 4][..]));

    let b = coord.job(ids[1]).unwrap();
    assert_eq!(b.preview, handle_b);
    assert_eq!(coord.preview_bytes(ids[1]).as_deref(), Some(&[2u8; 10][..]));
}

#[tokio::test]
async fn test_reset_all_revokes_every_handle() {
    let (coord, _) = scripted((1..=4).map(|tag| (tag, Script::Output(3))));
    coord.intake((1..=4).map(|tag| tagged_file(&format!("{tag}.gif"), tag, 10)));
    coord.compress_all().await;
    coord.intake([tagged_file("extra.png", 7, 10)]);

    assert_eq!(coord.reset_all(), 5);
    assert!(coord.is_empty());
    let stats = coord.handle_stats();
    assert_eq!(stats.live, 0);
    assert_eq!(stats.bound, stats.revoked);
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Recorder {
    started: Mutex<Vec<String>>,
    settled: Mutex<Vec<JobOutcome>>,
}

impl JobObserver for Recorder {
    fn job_started(&self, _id: JobId, name: &str) {
        self.started.lock().unwrap().push(name.to_string());
    }

    fn job_settled(&self, outcome: &JobOutcome) {
        self.settled.lock().unwrap().push(outcome.clone());
    }
}

#[tokio::test]
async fn test_observer_sees_each_job() {
    let recorder = Arc::new(Recorder::default());
    let compressor = Arc::new(ScriptedCompressor::new([
        (1, Script::Output(1)),
        (2, Script::Fail("f")),
    ]));
    let coord = BatchCoordinator::new(compressor).with_observer(recorder.clone());
    coord.intake([tagged_file("a.png", 1, 10), tagged_file("b.png", 2, 10)]);
    coord.compress_all().await;

    let mut started = recorder.started.lock().unwrap().clone();
    started.sort();
    assert_eq!(started, ["a.png", "b.png"]);
    assert_eq!(recorder.settled.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_reset_during_batch_discards_every_result() {
    let (compressor, mut gates) = GatedCompressor::new(&[1, 2, 3]);
    let coord = BatchCoordinator::new(Arc::new(compressor));
    let ids = coord.intake([
        tagged_file("a.png", 1, 100),
        tagged_file("b.png", 2, 100),
        tagged_file("c.png", 3, 100),
    ]);

    let (report, ()) = tokio::join!(coord.compress_all(), async {
        gates.wait_started(3).await;
        assert_eq!(coord.reset_all(), 3);
        assert!(coord.is_empty());
        gates.resolve(2, Script::Output(20));
        gates.resolve(1, Script::Output(10));
        gates.resolve(3, Script::Fail("late failure"));
    });

    assert_eq!(report.dispatched(), 3);
    assert_eq!(report.discarded(), 3);
    for id in &ids {
        assert!(report
            .outcomes
            .contains(&JobOutcome::Discarded { id: *id }));
    }
    assert_eq!(coord.len(), 0);
    assert!(coord.jobs().is_empty());
    assert_eq!(
        coord.handle_stats(),
        HandleStats {
            bound: 3,
            revoked: 3,
            live: 0
        }
    );
}
