use crate::api::PageFetcher;
use crate::error::DownloaderError;
use crate::paginate::{ReplyPaginator, ThreadPaginator};
use crate::rate_limiter::RateLimiter;
use crate::types::CommentRecord;
use futures::stream::{self, Stream};
use log::debug;

/// Called with `(processed, total_estimate)` after each record is built.
pub type ProgressFn<'a> = Box<dyn FnMut(u64, Option<u64>) + Send + 'a>;

pub struct CommentFlattener<'a> {
    fetcher: &'a PageFetcher,
    limiter: &'a RateLimiter,
    api_key: String,
    threads: ThreadPaginator<'a>,
    replies: Option<ReplyPaginator<'a>>,
    processed: u64,
    total_estimate: Option<u64>,
    on_progress: Option<ProgressFn<'a>>,
}

impl<'a> CommentFlattener<'a> {
    pub fn new(
        fetcher: &'a PageFetcher,
        limiter: &'a RateLimiter,
        video_id: &str,
        api_key: &str,
        on_progress: Option<ProgressFn<'a>>,
    ) -> Self {
        Self {
            fetcher,
            limiter,
            api_key: api_key.to_string(),
            threads: ThreadPaginator::new(fetcher, limiter, video_id, api_key),
            replies: None,
            processed: 0,
            total_estimate: None,
            on_progress,
        }
    }

    pub async fn next(&mut self) -> Result<Option<CommentRecord>, DownloaderError> {
        if let Some(replies) = self.replies.as_mut() {
            match replies.next().await? {
                Some(reply) => {
                    let record =
                        CommentRecord::from_comment(reply, Some(replies.parent_id().to_string()));
                    self.record_processed();
                    return Ok(Some(record));
                }
                None => self.replies = None,
            }
        }

        let Some((thread, thread_total)) = self.threads.next().await? else {
            return Ok(None);
        };

        if self.total_estimate.is_none() {
            self.total_estimate = thread_total;
        }

        let reply_count = thread.snippet.total_reply_count;
        let record = CommentRecord::from_comment(thread.snippet.top_level_comment, None);
        self.record_processed();

        if reply_count > 0 {
            debug!("Thread {} has {} replies", thread.id, reply_count);
            if let Some(total) = self.total_estimate.as_mut() {
                *total += reply_count;
            }
            self.replies = Some(ReplyPaginator::new(
                self.fetcher,
                self.limiter,
                &record.id,
                &self.api_key,
            ));
        }

        Ok(Some(record))
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<CommentRecord, DownloaderError>> + 'a {
        stream::try_unfold(self, |mut flattener| async move {
            let next = flattener.next().await?;
            Ok::<_, DownloaderError>(next.map(|record| (record, flattener)))
        })
    }

    fn record_processed(&mut self) {
        self.processed += 1;
        if let Some(on_progress) = self.on_progress.as_mut() {
            on_progress(self.processed, self.total_estimate);
        }
    }
}
