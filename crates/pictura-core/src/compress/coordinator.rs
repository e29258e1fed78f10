use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{PicturaError, Result};

use super::compressor::{CompressError, Compressor};
use super::handle::{HandleRegistry, HandleStats};
use super::job::{compression_ratio, ImageJob, JobEvent, JobId, JobStatus, JobView, SourceFile};
use super::observer::{JobObserver, NoOpObserver};

/// How a single compress call ended.
#[derive(Clone, Debug, PartialEq)]
pub enum JobOutcome {
    Compressed {
        id: JobId,
        compressed_size: u64,
        ratio: f64,
    },
    Failed {
        id: JobId,
        message: String,
    },
    /// The job was removed before its result arrived; the result was dropped.
    Discarded { id: JobId },
}

impl JobOutcome {
    pub fn id(&self) -> JobId {
        match self {
            Self::Compressed { id, .. } | Self::Failed { id, .. } | Self::Discarded { id } => *id,
        }
    }
}

/// Outcomes of one [`BatchCoordinator::compress_all`] call, in dispatch order.
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn dispatched(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Compressed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Failed { .. }))
    }

    pub fn discarded(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Discarded { .. }))
    }

    fn count(&self, pred: impl Fn(&JobOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

#[derive(Default)]
struct Board {
    jobs: Vec<ImageJob>,
    handles: HandleRegistry,
}

impl Board {
    fn find_mut(&mut self, id: JobId) -> Option<&mut ImageJob> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }
}

/// Owns the job list and drives compression.
///
/// All state sits behind one lock that is never held across an `.await`, so
/// every operation is a single atomic update of the list even while compress
/// calls are in flight.
pub struct BatchCoordinator {
    board: Mutex<Board>,
    compressor: Arc<dyn Compressor>,
    observer: Arc<dyn JobObserver>,
}

impl BatchCoordinator {
    pub fn new(compressor: Arc<dyn Compressor>) -> Self {
        Self {
            board: Mutex::new(Board::default()),
            compressor,
            observer: Arc::new(NoOpObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn JobObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Append one pending job per file. Returns the new ids in order.
    pub fn intake(&self, files: impl IntoIterator<Item = SourceFile>) -> Vec<JobId> {
        let mut board = self.board.lock();
        let Board { jobs, handles } = &mut *board;

        files
            .into_iter()
            .map(|source| {
                let id = JobId::new();
                let preview = handles.bind(source.bytes.clone());
                debug!(%id, name = %source.name, size = source.size(), "Job added");
                jobs.push(ImageJob {
                    id,
                    original_size: source.size(),
                    source,
                    preview,
                    compressed_size: None,
                    compression_ratio: None,
                    output_format: None,
                    status: JobStatus::Pending,
                });
                id
            })
            .collect()
    }

    /// Compress one pending job.
    ///
    /// Fails fast if the job is unknown or not pending. A compressor failure is
    /// not an error here: it is recorded on the job and reported as
    /// [`JobOutcome::Failed`].
    pub async fn compress_one(&self, id: JobId) -> Result<JobOutcome> {
        let (name, source) = self.dispatch(id)?;
        Ok(self.run(id, name, source).await)
    }

    /// Compress every job that is pending right now, all at once.
    ///
    /// Jobs added while the batch runs are not part of it. Returns after every
    /// dispatched call has settled.
    pub async fn compress_all(&self) -> BatchReport {
        let dispatched: Vec<(JobId, String, Arc<[u8]>)> = {
            let mut board = self.board.lock();
            board
                .jobs
                .iter_mut()
                .filter(|job| job.status.is_pending())
                .filter_map(|job| match job.status.transition(job.id, JobEvent::Dispatch) {
                    Ok(next) => {
                        job.status = next;
                        Some((job.id, job.source.name.clone(), job.source.bytes.clone()))
                    }
                    Err(e) => {
                        warn!(error = %e, "Skipping job");
                        None
                    }
                })
                .collect()
        };

        if dispatched.is_empty() {
            return BatchReport::default();
        }

        let start = Instant::now();
        info!(jobs = dispatched.len(), "Compressing batch");

        let outcomes = join_all(
            dispatched
                .into_iter()
                .map(|(id, name, source)| self.run(id, name, source)),
        )
        .await;

        let report = BatchReport { outcomes };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            discarded = report.discarded(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch settled"
        );
        report
    }

    fn dispatch(&self, id: JobId) -> Result<(String, Arc<[u8]>)> {
        let mut board = self.board.lock();
        let job = board.find_mut(id).ok_or(PicturaError::JobNotFound(id))?;
        job.status = job.status.transition(id, JobEvent::Dispatch)?;
        Ok((job.source.name.clone(), job.source.bytes.clone()))
    }

    async fn run(&self, id: JobId, name: String, source: Arc<[u8]>) -> JobOutcome {
        self.observer.job_started(id, &name);
        let result = self.compressor.compress(source).await;
        let outcome = self.settle(id, result);
        self.observer.job_settled(&outcome);
        outcome
    }

    /// Apply a compress result to its job, if the job still exists.
    ///
    /// On success the old preview handle is revoked and the new one bound in
    /// the same critical section as the move to `Done`.
    fn settle(&self, id: JobId, result: std::result::Result<Vec<u8>, CompressError>) -> JobOutcome {
        let mut board = self.board.lock();
        let Board { jobs, handles } = &mut *board;

        let Some(job) = jobs.iter_mut().find(|j| j.id == id) else {
            debug!(%id, "Result for removed job discarded");
            return JobOutcome::Discarded { id };
        };

        match result {
            Ok(bytes) => {
                let next = match job.status.transition(id, JobEvent::Succeed) {
                    Ok(next) => next,
                    Err(e) => {
                        warn!(error = %e, "Result discarded");
                        return JobOutcome::Discarded { id };
                    }
                };
                let compressed_size = bytes.len() as u64;
                let ratio = compression_ratio(job.original_size, compressed_size);
                job.output_format = image::guess_format(&bytes).ok();
                let old = std::mem::replace(&mut job.preview, handles.bind(Arc::from(bytes)));
                handles.revoke(old);
                job.compressed_size = Some(compressed_size);
                job.compression_ratio = Some(ratio);
                job.status = next;
                debug!(%id, original = job.original_size, compressed_size, ratio, "Job done");
                JobOutcome::Compressed {
                    id,
                    compressed_size,
                    ratio,
                }
            }
            Err(e) => match job.status.transition(id, JobEvent::Fail(e.message.clone())) {
                Ok(next) => {
                    job.status = next;
                    debug!(%id, error = %e, "Job failed");
                    JobOutcome::Failed {
                        id,
                        message: e.message,
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Failure discarded");
                    JobOutcome::Discarded { id }
                }
            },
        }
    }

    /// Put a failed job back to pending so the next batch picks it up.
    pub fn retry(&self, id: JobId) -> Result<()> {
        let mut board = self.board.lock();
        let job = board.find_mut(id).ok_or(PicturaError::JobNotFound(id))?;
        job.status = job.status.transition(id, JobEvent::Retry)?;
        Ok(())
    }

    /// Revoke the job's handle and drop it from the list. Safe in any status.
    ///
    /// Returns `false` if no such job exists.
    pub fn remove(&self, id: JobId) -> bool {
        let mut board = self.board.lock();
        let Board { jobs, handles } = &mut *board;
        let Some(pos) = jobs.iter().position(|j| j.id == id) else {
            return false;
        };
        let job = jobs.remove(pos);
        debug!(%id, status = %job.status, "Job removed");
        handles.revoke(job.preview);
        true
    }

    /// Revoke every handle and clear the list. Returns the number of revoked handles.
    pub fn reset_all(&self) -> usize {
        let mut board = self.board.lock();
        let Board { jobs, handles } = &mut *board;
        let revoked = jobs
            .drain(..)
            .map(|job| handles.revoke(job.preview))
            .filter(|revoked| *revoked)
            .count();
        info!(revoked, "Job list cleared");
        revoked
    }

    pub fn jobs(&self) -> Vec<JobView> {
        self.board.lock().jobs.iter().map(ImageJob::view).collect()
    }

    pub fn job(&self, id: JobId) -> Option<JobView> {
        self.board
            .lock()
            .jobs
            .iter()
            .find(|j| j.id == id)
            .map(ImageJob::view)
    }

    pub fn len(&self) -> usize {
        self.board.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_pending(&self) -> bool {
        self.board.lock().jobs.iter().any(|j| j.status.is_pending())
    }

    /// Bytes currently behind the job's preview handle.
    pub fn preview_bytes(&self, id: JobId) -> Option<Arc<[u8]>> {
        let board = self.board.lock();
        let job = board.jobs.iter().find(|j| j.id == id)?;
        board.handles.resolve(job.preview.id())
    }

    pub fn handle_stats(&self) -> HandleStats {
        self.board.lock().handles.stats()
    }
}
