mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pictura", about = "Crop, compress and keep track of images")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crop an image to a selection of its displayed view
    Crop(commands::crop::CropArgs),
    /// Compress a batch of images concurrently
    Compress(commands::compress::CompressArgs),
    /// Store images in the local library
    Upload(commands::upload::UploadArgs),
    /// List previous uploads, newest first
    History(commands::history::HistoryArgs),
    /// Print or save the default configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Crop(args) => commands::crop::run(args),
        Commands::Compress(args) => commands::compress::run(args).await,
        Commands::Upload(args) => commands::upload::run(args).await,
        Commands::History(args) => commands::history::run(args).await,
        Commands::Config(args) => commands::config::run(args),
    }
}
