use std::fmt;
use std::path::Path;
use std::sync::Arc;

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PicturaError, Result};
use crate::intake::mime_for_path;

use super::handle::{HandleId, PreviewHandle};

/// Identifier assigned to a job at intake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a single job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Compressing,
    Done,
    Error { message: String },
}

/// Inputs of the job state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobEvent {
    Dispatch,
    Succeed,
    Fail(String),
    Retry,
}

impl JobStatus {
    /// Apply `event`, failing on any transition outside the table:
    ///
    /// ```text
    /// Pending     --Dispatch--> Compressing
    /// Compressing --Succeed---> Done
    /// Compressing --Fail------> Error
    /// Error       --Retry-----> Pending
    /// ```
    pub fn transition(&self, id: JobId, event: JobEvent) -> Result<JobStatus> {
        match (self, event) {
            (Self::Pending, JobEvent::Dispatch) => Ok(Self::Compressing),
            (Self::Compressing, JobEvent::Succeed) => Ok(Self::Done),
            (Self::Compressing, JobEvent::Fail(message)) => Ok(Self::Error { message }),
            (Self::Error { .. }, JobEvent::Retry) => Ok(Self::Pending),
            (from, event) => Err(PicturaError::InvalidTransition {
                id,
                from: from.clone(),
                event,
            }),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// `Done` or `Error`.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Compressing => write!(f, "Compressing"),
            Self::Done => write!(f, "Done"),
            Self::Error { .. } => write!(f, "Error"),
        }
    }
}

impl fmt::Display for JobEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatch => write!(f, "dispatch"),
            Self::Succeed => write!(f, "succeed"),
            Self::Fail(_) => write!(f, "fail"),
            Self::Retry => write!(f, "retry"),
        }
    }
}

/// An input file handed to intake.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let mime = mime_for_path(Path::new(&name)).map(str::to_string);
        Self {
            name,
            mime,
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, naming it after its file name.
    pub async fn read(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(Self::new(name, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Fraction of bytes saved: `1 - compressed / original`.
///
/// An empty original yields `0.0`.
pub fn compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    1.0 - compressed_size as f64 / original_size as f64
}

/// One image moving through the compression pipeline.
#[derive(Debug)]
pub(crate) struct ImageJob {
    pub id: JobId,
    pub source: SourceFile,
    pub preview: PreviewHandle,
    pub original_size: u64,
    pub compressed_size: Option<u64>,
    pub compression_ratio: Option<f64>,
    /// Format sniffed from the compressed bytes, if recognised.
    pub output_format: Option<ImageFormat>,
    pub status: JobStatus,
}

impl ImageJob {
    pub fn view(&self) -> JobView {
        JobView {
            id: self.id,
            name: self.source.name.clone(),
            preview: self.preview.id(),
            original_size: self.original_size,
            compressed_size: self.compressed_size,
            compression_ratio: self.compression_ratio,
            output_format: self.output_format,
            status: self.status.clone(),
        }
    }
}

/// Read-only snapshot of a job.
#[derive(Clone, Debug, PartialEq)]
pub struct JobView {
    pub id: JobId,
    pub name: String,
    pub preview: HandleId,
    pub original_size: u64,
    pub compressed_size: Option<u64>,
    pub compression_ratio: Option<f64>,
    pub output_format: Option<ImageFormat>,
    pub status: JobStatus,
}

impl JobView {
    /// Download name of the compressed result, e.g. `compressed-photo.png`.
    ///
    /// When the compressor changed the format the extension follows the
    /// output: `photo.png` re-encoded as JPEG becomes `compressed-photo.jpg`.
    pub fn download_name(&self) -> String {
        let path = Path::new(&self.name);
        let ext = path.extension().and_then(|e| e.to_str());
        let Some(format) = self.output_format else {
            return format!("compressed-{}", self.name);
        };
        let known = format.extensions_str();
        let keeps_extension =
            ext.is_some_and(|ext| known.iter().any(|k| k.eq_ignore_ascii_case(ext)));
        match known.first() {
            Some(out_ext) if !keeps_extension => {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(&self.name);
                format!("compressed-{stem}.{out_ext}")
            }
            _ => format!("compressed-{}", self.name),
        }
    }
}
