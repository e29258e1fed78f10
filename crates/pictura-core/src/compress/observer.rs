use super::coordinator::JobOutcome;
use super::job::JobId;

/// Hooks into job progress, e.g. for progress bars or logging.
///
/// Implementations must be cheap: hooks run inline with the coordinator.
/// All methods default to no-ops.
pub trait JobObserver: Send + Sync {
    /// The compress call for `id` is about to start.
    fn job_started(&self, _id: JobId, _name: &str) {}

    /// The compress call for a job has settled.
    fn job_settled(&self, _outcome: &JobOutcome) {}
}

/// Observer that ignores every event.
pub struct NoOpObserver;
impl JobObserver for NoOpObserver {}
