use crate::api::DEFAULT_API_BASE;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Download YouTube comments (top-level and first replies) as JSON Lines",
    long_about = None
)]
pub struct Cli {
    /// YouTube video URLs or 11-character video IDs
    #[arg(required = true, num_args = 1..)]
    pub videos: Vec<String>,

    /// Path to write JSON Lines output
    #[arg(short, long, default_value = "comments.jsonl")]
    pub output: PathBuf,

    /// File containing the YouTube Data API key (default: token.txt next to the executable)
    #[arg(short, long)]
    pub token: Option<PathBuf>,

    /// Number of videos downloaded concurrently
    #[arg(short, long, default_value = "8")]
    pub parallel: usize,

    /// Records buffered in memory before each flush to disk
    #[arg(short, long, default_value = "1000")]
    pub buffer_size: usize,

    /// Requests per second allowed for each worker (0 disables throttling)
    #[arg(short = 'r', long, default_value = "25")]
    pub max_rps: u32,

    /// Base URL of the YouTube Data API
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Write a per-video CSV report to this path
    #[arg(long)]
    pub stats: Option<PathBuf>,

    /// Disable the progress display
    #[arg(long)]
    pub no_progress: bool,
}
