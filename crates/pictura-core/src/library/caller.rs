use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{PicturaError, Result};

/// Opaque, client-generated identity attached to upload and history calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerId(Uuid);

impl CallerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Read the token stored at `path`, or create and store a new one.
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents.parse(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let id = Self::generate();
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(path, id.to_string()).await?;
                debug!(path = %path.display(), "Caller id created");
                Ok(id)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CallerId {
    type Err = PicturaError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| PicturaError::Unauthorized)
    }
}
