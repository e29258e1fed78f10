use async_trait::async_trait;

use crate::compress::job::SourceFile;
use crate::error::Result;

use super::caller::CallerId;
use super::record::UploadRecord;

/// Persists an uploaded file. One attempt, no retry.
///
/// A missing caller is rejected with `PicturaError::Unauthorized`.
#[async_trait]
pub trait UploadStore: Send + Sync {
    async fn upload(&self, file: &SourceFile, caller: Option<&CallerId>) -> Result<UploadRecord>;
}

/// Lists a caller's uploads, newest first.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn history(&self, caller: Option<&CallerId>) -> Result<Vec<UploadRecord>>;
}
