use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted upload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub id: String,
    pub name: String,
    pub url: String,
    pub size: u64,
    pub format: String,
    pub created_at: DateTime<Utc>,
}
