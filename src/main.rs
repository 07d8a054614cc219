mod api;
mod cli;
mod config;
mod downloader;
mod error;
mod flatten;
mod job;
mod paginate;
mod rate_limiter;
mod types;
mod video_id;

#[cfg(test)]
mod test_support;

use anyhow::{anyhow, Context};
use cli::Cli;
use clap::Parser;
use colored::*;
use log::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    info!("Starting comment downloader");

    let cli = Cli::parse();
    info!(
        "CLI arguments parsed: videos={}, parallel={}, buffer_size={}, max_rps={}",
        cli.videos.len(),
        cli.parallel,
        cli.buffer_size,
        cli.max_rps
    );

    let token_path = cli.token.clone().unwrap_or_else(config::default_token_path);
    let api_key = match config::load_api_key(&token_path).await {
        Ok(key) => key,
        Err(e) => {
            error!("Failed to load API key: {}", e);
            eprintln!("{}", e.to_string().red());
            return Err(e.into());
        }
    };

    let settings = config::Settings::from_cli(&cli, api_key);
    let downloader = downloader::Downloader::new(settings)?;

    let outcome = tokio::select! {
        outcome = downloader.download_all(&cli.videos, &cli.output) => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted by Ctrl-C");
            eprintln!("\n{}", "Interrupted".red());
            return Err(anyhow!("interrupted"));
        }
    };

    match outcome {
        Ok(summary) => {
            if let Some(stats_path) = &cli.stats {
                downloader::write_stats_csv(&summary, stats_path)
                    .with_context(|| format!("writing stats to {}", stats_path.display()))?;
            }

            let output_path = std::fs::canonicalize(&cli.output).unwrap_or(cli.output.clone());
            println!("\n{}", "Download Summary:".bold());
            println!("Videos downloaded: {}", summary.videos.len());
            println!("Comments written: {}", summary.total_records.to_string().green());
            println!("Total duration: {:.2?}", summary.total_duration);
            println!("Wrote comments to {}", output_path.display());
            Ok(())
        }
        Err(e) => {
            error!("Download process failed: {}", e);
            if e.is_quota_exceeded() {
                eprintln!(
                    "{}",
                    "YouTube Data API quota exhausted; retry after the quota resets.".red()
                );
            } else {
                eprintln!("{}", "Download process failed".red());
            }
            Err(e.into())
        }
    }
}
