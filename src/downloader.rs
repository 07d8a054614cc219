use crate::api::PageFetcher;
use crate::config::Settings;
use crate::error::DownloaderError;
use crate::job::{download_video, JobContext};
use crate::types::{DownloadSummary, VideoDownload, VideoJob};
use log::{error, info, warn};
use std::path::Path;
use std::time::Instant;
use tempfile::TempDir;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;

/// Fans per-video jobs out, merges their temp files into one output file,
/// and owns the temp directory for the whole run.
pub struct Downloader {
    settings: Settings,
    fetcher: PageFetcher,
}

struct Collected {
    downloads: Vec<VideoDownload>,
    failure: Option<DownloaderError>,
}

impl Downloader {
    pub fn new(settings: Settings) -> Result<Self, DownloaderError> {
        let fetcher = PageFetcher::new(&settings.api_base)?;
        Ok(Self { settings, fetcher })
    }

    pub async fn download_all(
        &self,
        video_inputs: &[String],
        output_path: &Path,
    ) -> Result<DownloadSummary, DownloaderError> {
        let start_time = Instant::now();
        // Removed on drop, so every exit path below (including a dropped
        // future) cleans up.
        let temp_dir = self.create_temp_dir()?;
        info!(
            "Downloading {} videos via {}",
            video_inputs.len(),
            temp_dir.path().display()
        );

        let collected = if self.settings.parallelism > 1 && video_inputs.len() > 1 {
            self.download_parallel(video_inputs, temp_dir.path()).await
        } else {
            self.download_sequential(video_inputs, temp_dir.path()).await
        };

        let merged = if collected.failure.is_none() || !collected.downloads.is_empty() {
            merge_outputs(&collected.downloads, output_path).await
        } else {
            Ok(0)
        };

        let temp_path = temp_dir.path().to_path_buf();
        if let Err(e) = temp_dir.close() {
            warn!("Failed to remove {}: {}", temp_path.display(), e);
        }

        if let Some(failure) = collected.failure {
            if let Err(e) = merged {
                error!("Merging completed videos failed: {}", e);
            }
            return Err(failure);
        }

        let total_records = merged?;
        Ok(DownloadSummary {
            total_records,
            total_duration: start_time.elapsed(),
            videos: collected.downloads,
        })
    }

    fn create_temp_dir(&self) -> Result<TempDir, DownloaderError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("yt-comments-");
        let dir = match &self.settings.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    fn job_context(&self) -> JobContext {
        JobContext {
            fetcher: self.fetcher.clone(),
            api_key: self.settings.api_key.clone(),
            buffer_size: self.settings.buffer_size,
            max_requests_per_second: self.settings.max_requests_per_second,
        }
    }

    fn video_job(&self, video_input: &str, temp_dir: &Path, show_progress: bool) -> VideoJob {
        VideoJob {
            video_input: video_input.to_string(),
            temp_dir: temp_dir.to_path_buf(),
            show_progress,
        }
    }

    async fn download_sequential(&self, video_inputs: &[String], temp_dir: &Path) -> Collected {
        let mut downloads = Vec::with_capacity(video_inputs.len());

        for input in video_inputs {
            let job = self.video_job(input, temp_dir, self.settings.show_progress);
            match download_video(self.job_context(), job).await {
                Ok(download) => downloads.push(download),
                Err(e) => {
                    return Collected {
                        downloads,
                        failure: Some(e),
                    }
                }
            }
        }

        Collected {
            downloads,
            failure: None,
        }
    }

    // Keeps at most `parallelism` jobs in flight and collects them in the
    // order they finish. Progress display is off: bars would interleave.
    // After a failure nothing new is dispatched, but jobs already running
    // are still awaited and collected.
    async fn download_parallel(&self, video_inputs: &[String], temp_dir: &Path) -> Collected {
        let mut pending = video_inputs.iter();
        let mut workers = JoinSet::new();
        let mut downloads = Vec::with_capacity(video_inputs.len());
        let mut failure = None;

        for input in pending.by_ref().take(self.settings.parallelism) {
            workers.spawn(download_video(
                self.job_context(),
                self.video_job(input, temp_dir, false),
            ));
        }

        while let Some(joined) = workers.join_next().await {
            let outcome = joined
                .map_err(|e| DownloaderError::WorkerError(e.to_string()))
                .and_then(|result| result);

            match outcome {
                Ok(download) => {
                    info!(
                        "Collected {} ({} comments)",
                        download.video_id, download.record_count
                    );
                    downloads.push(download);
                    if failure.is_some() {
                        continue;
                    }
                    if let Some(input) = pending.next() {
                        workers.spawn(download_video(
                            self.job_context(),
                            self.video_job(input, temp_dir, false),
                        ));
                    }
                }
                Err(e) if failure.is_none() => {
                    error!(
                        "Stopping dispatch after failure, waiting for {} running jobs: {}",
                        workers.len(),
                        e
                    );
                    failure = Some(e);
                }
                Err(e) => error!("Another job failed: {}", e),
            }
        }

        Collected { downloads, failure }
    }
}

/// Concatenate the per-video files, byte for byte, in collection order.
async fn merge_outputs(
    downloads: &[VideoDownload],
    output_path: &Path,
) -> Result<u64, DownloaderError> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut output = File::create(output_path).await?;
    let mut total_records = 0;
    for download in downloads {
        let mut source = File::open(&download.temp_path).await?;
        tokio::io::copy(&mut source, &mut output).await?;
        total_records += download.record_count;
    }
    output.flush().await?;

    info!(
        "Merged {} videos ({} comments) into {}",
        downloads.len(),
        total_records,
        output_path.display()
    );
    Ok(total_records)
}

pub fn write_stats_csv(summary: &DownloadSummary, stats_path: &Path) -> Result<(), DownloaderError> {
    let mut wtr = csv::WriterBuilder::new().from_path(stats_path)?;

    wtr.write_record(["Video", "Input", "Records", "Duration (s)"])?;
    for video in &summary.videos {
        wtr.write_record([
            video.video_id.clone(),
            video.video_input.clone(),
            video.record_count.to_string(),
            format!("{:.2}", video.duration.as_secs_f64()),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
