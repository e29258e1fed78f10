use std::path::{Path, PathBuf};

use console::Style;
use pictura_core::compress::{JobStatus, JobView};
use pictura_core::config::CompressConfig;
use pictura_core::crop::{CropEngine, CroppedImage};
use pictura_core::format::{format_file_size, format_ratio};
use pictura_core::library::UploadRecord;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    failed: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            failed: Style::new().red(),
            path: Style::new().underlined(),
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!(
        "  {}",
        s.title.apply_to("\u{2550}".repeat(title.chars().count()))
    );
    println!();
}

pub fn print_crop_summary(input: &Path, output: &Path, engine: &CropEngine, cropped: &CroppedImage) {
    let s = Styles::new();
    print_title(&s, "Crop");

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(output.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Aspect"),
        s.method.apply_to(engine.aspect())
    );
    println!();

    if let Some(geometry) = engine.geometry() {
        let (nw, nh) = geometry.natural_size();
        let (dw, dh) = geometry.displayed_size();
        println!("  {}", s.header.apply_to("Geometry"));
        println!(
            "    {:<12}{}",
            s.label.apply_to("Source"),
            s.value.apply_to(format!("{nw}x{nh}"))
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("Displayed"),
            s.value.apply_to(format!("{dw:.0}x{dh:.0}"))
        );
        if let Some(selection) = engine.selection() {
            let pct = selection.to_percent(geometry);
            println!(
                "    {:<12}{}",
                s.label.apply_to("Selection"),
                s.value.apply_to(format!(
                    "{:.1}%, {:.1}% {:.1}x{:.1}%",
                    pct.x, pct.y, pct.width, pct.height
                ))
            );
            if let Some(rect) = geometry
                .source_window(selection)
                .to_pixel_rect(geometry.natural_size())
            {
                println!(
                    "    {:<12}{}",
                    s.label.apply_to("Window"),
                    s.value.apply_to(format!(
                        "{}x{} at ({}, {})",
                        rect.width, rect.height, rect.x, rect.y
                    ))
                );
            }
        }
        println!();
    }

    println!("  {}", s.header.apply_to("Result"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!("{}x{}", cropped.width, cropped.height))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("File"),
        s.value.apply_to(format_file_size(cropped.bytes.len() as u64))
    );
    println!();
}

pub fn print_compress_summary(config: &CompressConfig, jobs: &[JobView], written: &[PathBuf]) {
    let s = Styles::new();
    print_title(&s, "Compression");

    println!(
        "  {:<14}{}",
        s.label.apply_to("Mode"),
        s.method.apply_to(config.mode)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Quality"),
        s.value.apply_to(config.quality)
    );
    println!();

    println!(
        "  {:<28}  {:>11}  {:>11}  {:>7}",
        s.header.apply_to("Image"),
        s.header.apply_to("Original"),
        s.header.apply_to("Compressed"),
        s.header.apply_to("Saved")
    );
    for job in jobs {
        match &job.status {
            JobStatus::Done => println!(
                "  {:<28}  {:>11}  {:>11}  {:>7}",
                job.name,
                format_file_size(job.original_size),
                format_file_size(job.compressed_size.unwrap_or_default()),
                s.method
                    .apply_to(format_ratio(job.compression_ratio.unwrap_or_default()))
            ),
            JobStatus::Error { message } => println!(
                "  {:<28}  {:>11}  {}",
                job.name,
                format_file_size(job.original_size),
                s.failed.apply_to(message)
            ),
            other => println!(
                "  {:<28}  {:>11}  {}",
                job.name,
                format_file_size(job.original_size),
                s.label.apply_to(other)
            ),
        }
    }

    let original: u64 = jobs
        .iter()
        .filter(|j| j.status == JobStatus::Done)
        .map(|j| j.original_size)
        .sum();
    let compressed: u64 = jobs.iter().filter_map(|j| j.compressed_size).sum();
    if original > 0 {
        println!();
        println!(
            "  {:<14}{} -> {} ({})",
            s.label.apply_to("Total"),
            s.value.apply_to(format_file_size(original)),
            s.value.apply_to(format_file_size(compressed)),
            s.method.apply_to(format_ratio(
                pictura_core::compress::compression_ratio(original, compressed)
            ))
        );
    }

    if !written.is_empty() {
        println!();
        println!("  {}", s.header.apply_to("Saved"));
        for path in written {
            println!("    {}", s.path.apply_to(path.display()));
        }
    }
    println!();
}

pub fn print_upload_result(record: &UploadRecord) {
    let s = Styles::new();
    println!(
        "  {:<28}  {:>11}  {}",
        s.value.apply_to(&record.name),
        format_file_size(record.size),
        s.path.apply_to(&record.url)
    );
}

pub fn print_history(records: &[UploadRecord]) {
    let s = Styles::new();
    print_title(&s, "Upload History");

    if records.is_empty() {
        println!("  {}", s.label.apply_to("No uploads yet"));
        println!();
        return;
    }

    for record in records {
        println!(
            "  {}  {:<28}  {:>11}  {:<5}",
            s.label
                .apply_to(record.created_at.format("%Y-%m-%d %H:%M:%S")),
            s.value.apply_to(&record.name),
            format_file_size(record.size),
            s.method.apply_to(&record.format)
        );
        println!("    {}", s.path.apply_to(&record.url));
    }
    println!();
}
