pub mod compressor;
pub mod coordinator;
pub mod handle;
pub mod job;
pub mod observer;

pub use compressor::{CompressError, Compressor, ReencodeCompressor};
pub use coordinator::{BatchCoordinator, BatchReport, JobOutcome};
pub use handle::{HandleId, HandleRegistry, HandleStats, PreviewHandle};
pub use job::{compression_ratio, JobEvent, JobId, JobStatus, JobView, SourceFile};
pub use observer::{JobObserver, NoOpObserver};
