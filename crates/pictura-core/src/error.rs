use thiserror::Error;

use crate::compress::job::{JobEvent, JobId, JobStatus};

#[derive(Error, Debug)]
pub enum PicturaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid aspect ratio: {0}")]
    InvalidAspect(String),

    #[error("Job {0} not found")]
    JobNotFound(JobId),

    #[error("Invalid transition for job {id}: {event} while {from}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        event: JobEvent,
    },

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Empty file: {0}")]
    EmptyFile(String),

    #[error("Unauthorized: missing caller identity")]
    Unauthorized,

    #[error("Library index error: {0}")]
    Index(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PicturaError>;
