use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pictura_core::library::{HistoryStore, LocalLibrary};

use super::{caller_id, load_config};
use crate::summary::print_history;

#[derive(Args)]
pub struct HistoryArgs {
    /// Show only the N most recent uploads
    #[arg(long)]
    pub limit: Option<usize>,

    /// File holding the caller token (default: <library root>/caller-id)
    #[arg(long)]
    pub identity: Option<PathBuf>,

    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn run(args: &HistoryArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let caller = caller_id(args.identity.as_deref(), &config).await?;
    let library = LocalLibrary::from_config(&config.library);

    let mut records = library
        .history(Some(&caller))
        .await
        .with_context(|| format!("Failed to read library {}", library.root().display()))?;
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }

    print_history(&records);
    Ok(())
}
