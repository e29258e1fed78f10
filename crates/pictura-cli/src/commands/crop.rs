use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use pictura_core::consts::DEFAULT_DISPLAY_BOX;
use pictura_core::crop::{AspectConstraint, CropEngine, CroppedImage, SelectionRect};
use pictura_core::intake::{is_accepted, IntakePurpose};
use tracing::info;

use super::{load_config, output_dir};
use crate::summary::print_crop_summary;

#[derive(Args)]
pub struct CropArgs {
    /// Input image (png, jpg, jpeg or gif)
    pub file: PathBuf,

    /// Aspect constraint: free, W:H or a decimal ratio
    #[arg(short, long, default_value = "free")]
    pub aspect: AspectConstraint,

    /// Selection as x,y,width,height in percent of the displayed image
    #[arg(short, long, value_parser = parse_rect)]
    pub selection: Option<[f64; 4]>,

    /// Read --selection as displayed pixels instead of percent
    #[arg(long)]
    pub pixels: bool,

    /// Displayed size as WxH (default: fit within 800x800)
    #[arg(long, value_parser = parse_size)]
    pub display: Option<(f64, f64)>,

    /// Output file (default: cropped-image-<ms>.jpg next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also save the displayed-size preview (format from extension)
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &CropArgs) -> Result<()> {
    if !is_accepted(&args.file, IntakePurpose::Crop) {
        bail!("Unsupported image type: {}", args.file.display());
    }
    let config = load_config(args.config.as_deref())?;
    let source = image::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    let now = Instant::now();
    let mut engine = CropEngine::new(config.crop.clone());
    engine.set_aspect_constraint(args.aspect, now);
    match args.display {
        Some((width, height)) => engine.load_image(source, width, height, now)?,
        None => {
            let max = DEFAULT_DISPLAY_BOX as f64;
            engine.load_fitted(source, max, max, now)?
        }
    }

    let rect = match args.selection {
        Some([x, y, w, h]) if args.pixels => SelectionRect::pixels(x, y, w, h),
        Some([x, y, w, h]) => SelectionRect::percent(x, y, w, h),
        None => engine
            .selection()
            .copied()
            .context("No default selection for this image")?,
    };
    engine.complete_selection(rect, now);

    if let Some(ref path) = args.preview {
        let Some(preview) = engine.preview() else {
            bail!("Selection is empty; nothing to preview");
        };
        preview
            .save(path)
            .with_context(|| format!("Failed to write preview {}", path.display()))?;
        info!(path = %path.display(), "Preview saved");
    }

    let cropped = engine
        .confirm_crop()?
        .cloned()
        .context("Selection is empty; nothing to crop")?;

    let output = args.output.clone().unwrap_or_else(|| {
        output_dir(None, &args.file)
            .join(CroppedImage::download_name(Utc::now().timestamp_millis()))
    });
    std::fs::write(&output, &cropped.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    print_crop_summary(&args.file, &output, &engine, &cropped);
    Ok(())
}

fn parse_rect(s: &str) -> Result<[f64; 4], String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| format!("invalid number in selection: {e}"))?;
    values
        .try_into()
        .map_err(|_| "expected four values: x,y,width,height".to_string())
}

fn parse_size(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got `{s}`"))?;
    let width: f64 = w.trim().parse().map_err(|_| format!("invalid width `{w}`"))?;
    let height: f64 = h.trim().parse().map_err(|_| format!("invalid height `{h}`"))?;
    Ok((width, height))
}
