use crate::api::PageFetcher;
use crate::error::DownloaderError;
use crate::flatten::{CommentFlattener, ProgressFn};
use crate::rate_limiter::RateLimiter;
use crate::types::{CommentRecord, VideoDownload, VideoJob};
use crate::video_id::extract_video_id;
use futures::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone)]
pub struct JobContext {
    pub fetcher: PageFetcher,
    pub api_key: String,
    pub buffer_size: usize,
    pub max_requests_per_second: u32,
}

pub async fn download_video(
    ctx: JobContext,
    job: VideoJob,
) -> Result<VideoDownload, DownloaderError> {
    let start_time = Instant::now();
    let video_id = extract_video_id(&job.video_input)?;
    let limiter = RateLimiter::new(ctx.max_requests_per_second);
    let (temp_path, file) = create_temp_file(&job.temp_dir, &video_id).await?;
    info!(
        "Starting download: {} -> {}",
        video_id,
        temp_path.display()
    );

    let pb = job.show_progress.then(|| create_progress_bar(&video_id));
    let on_progress = pb.clone().map(|pb| {
        Box::new(move |processed: u64, total: Option<u64>| {
            update_progress(&pb, processed, total)
        }) as ProgressFn
    });

    let result = async {
        let flattener =
            CommentFlattener::new(&ctx.fetcher, &limiter, &video_id, &ctx.api_key, on_progress);
        let records = flattener.into_stream();
        futures::pin_mut!(records);

        let mut writer = RecordWriter::new(file, ctx.buffer_size);
        while let Some(record) = records.try_next().await? {
            writer.push(record).await?;
        }
        writer.finish().await
    }
    .await;

    match result {
        Ok(record_count) => {
            if let Some(pb) = &pb {
                pb.finish_with_message(format!("{}: done", video_id));
            }
            let duration = start_time.elapsed();
            info!(
                "Finished {}: {} comments in {:.2?}",
                video_id, record_count, duration
            );
            Ok(VideoDownload {
                video_input: job.video_input,
                video_id,
                temp_path,
                record_count,
                duration,
            })
        }
        Err(e) => {
            if let Some(pb) = &pb {
                pb.abandon_with_message(format!("{}: failed", video_id));
            }
            error!("Download failed for {}: {}", video_id, e);
            Err(e)
        }
    }
}

pub struct RecordWriter<W> {
    out: W,
    buffer: Vec<CommentRecord>,
    capacity: usize,
    written: u64,
}

impl<W: AsyncWrite + Unpin> RecordWriter<W> {
    pub fn new(out: W, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            out,
            buffer: Vec::with_capacity(capacity.min(4096)),
            capacity,
            written: 0,
        }
    }

    pub async fn push(&mut self, record: CommentRecord) -> Result<(), DownloaderError> {
        self.buffer.push(record);
        if self.buffer.len() >= self.capacity {
            self.flush_buffer().await?;
        }
        Ok(())
    }

    pub async fn finish(mut self) -> Result<u64, DownloaderError> {
        self.flush_buffer().await?;
        self.out.flush().await?;
        Ok(self.written)
    }

    async fn flush_buffer(&mut self) -> Result<(), DownloaderError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        // Whole lines only: serialize everything before touching the file.
        let mut chunk = Vec::new();
        for record in &self.buffer {
            serde_json::to_writer(&mut chunk, record)?;
            chunk.push(b'\n');
        }
        self.out.write_all(&chunk).await?;

        debug!("Flushed {} records ({} bytes)", self.buffer.len(), chunk.len());
        self.written += self.buffer.len() as u64;
        self.buffer.clear();
        Ok(())
    }
}

/// `{video_id}.jsonl`, or `{video_id}-N.jsonl` when the same video was requested again.
async fn create_temp_file(dir: &Path, video_id: &str) -> Result<(PathBuf, File), DownloaderError> {
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{}.jsonl", video_id)
        } else {
            format!("{}-{}.jsonl", video_id, attempt)
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(DownloaderError::IoError(e)),
        }
    }
}

fn create_progress_bar(video_id: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}: {pos} processed")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(video_id.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

// Switches from the spinner to a bar once a total estimate is known.
fn update_progress(pb: &ProgressBar, processed: u64, total: Option<u64>) {
    if let Some(total) = total.filter(|t| *t > 0) {
        let total = total.max(processed);
        if pb.length().is_none() {
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] {msg} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
            );
        }
        if pb.length() != Some(total) {
            pb.set_length(total);
        }
    }
    pb.set_position(processed);
}
