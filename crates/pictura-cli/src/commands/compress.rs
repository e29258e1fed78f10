use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pictura_core::compress::{
    BatchCoordinator, JobId, JobObserver, JobOutcome, JobStatus, ReencodeCompressor, SourceFile,
};
use pictura_core::config::CompressMode;
use pictura_core::intake::{is_accepted, IntakePurpose};
use tracing::{debug, warn};

use super::{load_config, output_dir};
use crate::summary::print_compress_summary;

#[derive(Clone, ValueEnum)]
pub enum ModeArg {
    /// Lossy re-encode (JPEG, or PNG when the image has alpha)
    Smart,
    /// Lossless re-encode in the source format
    Original,
}

#[derive(Args)]
pub struct CompressArgs {
    /// Input images (png, jpg, jpeg or gif)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Compression mode (default from config)
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// JPEG quality for smart mode, 1-100 (default from config)
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// Directory for compressed-<name> files (default: next to each input)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Retry failed images this many times
    #[arg(long, default_value = "0")]
    pub retries: u32,

    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Drives a progress bar from coordinator events.
struct ProgressObserver {
    pb: ProgressBar,
}

impl JobObserver for ProgressObserver {
    fn job_started(&self, _id: JobId, name: &str) {
        self.pb.set_message(name.to_string());
    }

    fn job_settled(&self, outcome: &JobOutcome) {
        if let JobOutcome::Failed { message, .. } = outcome {
            self.pb.println(format!("  failed: {message}"));
        }
        self.pb.inc(1);
    }
}

pub async fn run(args: &CompressArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(ref mode) = args.mode {
        config.compress.mode = match mode {
            ModeArg::Smart => CompressMode::Smart,
            ModeArg::Original => CompressMode::Original,
        };
    }
    if let Some(quality) = args.quality {
        config.compress.quality = quality;
    }

    let mut sources = Vec::new();
    let mut paths = Vec::new();
    for path in &args.files {
        if !is_accepted(path, IntakePurpose::Compress) {
            warn!(path = %path.display(), "Skipping unsupported file");
            continue;
        }
        let source = SourceFile::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        sources.push(source);
        paths.push(path.clone());
    }
    if sources.is_empty() {
        bail!("No supported images to compress");
    }

    let pb = ProgressBar::new(sources.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let compressor = Arc::new(ReencodeCompressor::from_config(&config.compress));
    let coordinator = BatchCoordinator::new(compressor)
        .with_observer(Arc::new(ProgressObserver { pb: pb.clone() }));
    let ids = coordinator.intake(sources);

    coordinator.compress_all().await;
    for attempt in 1..=args.retries {
        let failed: Vec<JobId> = coordinator
            .jobs()
            .into_iter()
            .filter(|job| matches!(job.status, JobStatus::Error { .. }))
            .map(|job| job.id)
            .collect();
        if failed.is_empty() {
            break;
        }
        debug!(attempt, jobs = failed.len(), "Retrying failed jobs");
        pb.inc_length(failed.len() as u64);
        for id in failed {
            coordinator.retry(id)?;
        }
        coordinator.compress_all().await;
    }
    pb.finish_with_message("Done");

    let mut written = Vec::new();
    for (id, path) in ids.iter().zip(&paths) {
        let Some(job) = coordinator.job(*id) else {
            continue;
        };
        if job.status != JobStatus::Done {
            continue;
        }
        let Some(bytes) = coordinator.preview_bytes(*id) else {
            continue;
        };
        let dest = output_dir(args.output_dir.as_deref(), path).join(job.download_name());
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        written.push(dest);
    }

    let jobs = coordinator.jobs();
    print_compress_summary(&config.compress, &jobs, &written);

    let failed = jobs.iter().filter(|j| j.status.error_message().is_some()).count();
    let released = coordinator.reset_all();
    debug!(released, "Preview handles released");

    if failed > 0 {
        bail!("{failed} of {} images failed to compress", jobs.len());
    }
    Ok(())
}
