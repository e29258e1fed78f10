use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use pictura_core::compress::SourceFile;
use pictura_core::library::{LocalLibrary, UploadStore};
use tracing::warn;

use super::{caller_id, load_config};
use crate::summary::print_upload_result;

#[derive(Args)]
pub struct UploadArgs {
    /// Images to store (png, jpg, jpeg, gif or webp)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// File holding the caller token (default: <library root>/caller-id)
    #[arg(long)]
    pub identity: Option<PathBuf>,

    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn run(args: &UploadArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let caller = caller_id(args.identity.as_deref(), &config).await?;
    let library = LocalLibrary::from_config(&config.library);

    let mut failed = 0usize;
    for path in &args.files {
        let outcome = match SourceFile::read(path).await {
            Ok(file) => library.upload(&file, Some(&caller)).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(record) => print_upload_result(&record),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Upload failed");
                eprintln!("{}: {e}", path.display());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} uploads failed", args.files.len());
    }
    Ok(())
}
