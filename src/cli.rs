use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scrape a half-open range of post IDs into per-post folders
    Scrape {
        /// First post ID (inclusive)
        start: u64,
        /// Last post ID (exclusive)
        end: u64,
        /// Output directory, overriding the configured download_dir
        #[arg(short, long)]
        root_dir: Option<PathBuf>,
    },
    /// Regroup per-post metadata JSON into batched JSONL files
    Enumerate {
        /// Directory containing the post_{id} folders
        root_dir: PathBuf,
        /// Number of posts per batch
        #[arg(long, default_value_t = 10_000, value_parser = clap::value_parser!(u64).range(1..))]
        batch_size: u64,
        /// Directory for the batch files (defaults to the root directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}
