use crate::api::{Endpoint, PageFetcher};
use crate::error::DownloaderError;
use crate::rate_limiter::RateLimiter;
use crate::types::{ApiComment, ReplyPage, Thread, ThreadPage};
use log::debug;
use std::collections::VecDeque;

pub const MAX_RESULTS: &str = "100";

pub const THREAD_FIELDS: &str = "nextPageToken,pageInfo/totalResults,\
items(id,snippet(totalReplyCount,topLevelComment(id,snippet(authorDisplayName,textOriginal,publishedAt,likeCount))))";

pub const REPLY_FIELDS: &str =
    "nextPageToken,items(id,snippet(authorDisplayName,textOriginal,publishedAt,likeCount))";

/// Position in a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PageToken {
    First,
    Next(String),
    Exhausted,
}

impl PageToken {
    /// Missing or empty cursors end the listing.
    fn after(next_page_token: Option<String>) -> Self {
        match next_page_token {
            Some(token) if !token.is_empty() => PageToken::Next(token),
            _ => PageToken::Exhausted,
        }
    }
}

struct Listing<'a> {
    fetcher: &'a PageFetcher,
    limiter: &'a RateLimiter,
    api_key: String,
    endpoint: Endpoint,
    filter: (&'static str, String),
    fields: &'static str,
    cursor: PageToken,
}

impl<'a> Listing<'a> {
    /// Fetches the page under the cursor, or `None` once exhausted. The
    /// caller advances the cursor from the decoded page.
    async fn fetch_page<T: serde::de::DeserializeOwned>(
        &mut self,
    ) -> Result<Option<T>, DownloaderError> {
        let token = match &self.cursor {
            PageToken::Exhausted => return Ok(None),
            PageToken::First => None,
            PageToken::Next(token) => Some(token.as_str()),
        };

        let mut params = vec![
            ("part", "snippet"),
            (self.filter.0, self.filter.1.as_str()),
            ("maxResults", MAX_RESULTS),
            ("textFormat", "plainText"),
            ("fields", self.fields),
            ("key", self.api_key.as_str()),
        ];
        if let Some(token) = token {
            params.push(("pageToken", token));
        }

        let value = self.fetcher.fetch(self.limiter, self.endpoint, &params).await?;
        Ok(Some(serde_json::from_value(value)?))
    }
}

/// Top-level comment threads of one video, page by page.
///
/// The total reported by the first page rides along with the first thread
/// only; every later item carries `None`.
pub struct ThreadPaginator<'a> {
    listing: Listing<'a>,
    buffered: VecDeque<Thread>,
    total_results: Option<u64>,
    total_reported: bool,
}

impl<'a> ThreadPaginator<'a> {
    pub fn new(
        fetcher: &'a PageFetcher,
        limiter: &'a RateLimiter,
        video_id: &str,
        api_key: &str,
    ) -> Self {
        Self {
            listing: Listing {
                fetcher,
                limiter,
                api_key: api_key.to_string(),
                endpoint: Endpoint::CommentThreads,
                filter: ("videoId", video_id.to_string()),
                fields: THREAD_FIELDS,
                cursor: PageToken::First,
            },
            buffered: VecDeque::new(),
            total_results: None,
            total_reported: false,
        }
    }

    pub async fn next(&mut self) -> Result<Option<(Thread, Option<u64>)>, DownloaderError> {
        loop {
            if let Some(thread) = self.buffered.pop_front() {
                let total = if self.total_reported {
                    None
                } else {
                    self.total_reported = true;
                    self.total_results
                };
                return Ok(Some((thread, total)));
            }

            let Some(page) = self.listing.fetch_page::<ThreadPage>().await? else {
                return Ok(None);
            };

            if self.total_results.is_none() {
                self.total_results = page.page_info.and_then(|info| info.total_results);
            }
            debug!(
                "Fetched {} threads for video {}",
                page.items.len(),
                self.listing.filter.1
            );
            self.buffered.extend(page.items);
            self.listing.cursor = PageToken::after(page.next_page_token);
        }
    }
}

pub struct ReplyPaginator<'a> {
    listing: Listing<'a>,
    buffered: VecDeque<ApiComment>,
}

impl<'a> ReplyPaginator<'a> {
    pub fn new(
        fetcher: &'a PageFetcher,
        limiter: &'a RateLimiter,
        parent_id: &str,
        api_key: &str,
    ) -> Self {
        Self {
            listing: Listing {
                fetcher,
                limiter,
                api_key: api_key.to_string(),
                endpoint: Endpoint::Comments,
                filter: ("parentId", parent_id.to_string()),
                fields: REPLY_FIELDS,
                cursor: PageToken::First,
            },
            buffered: VecDeque::new(),
        }
    }

    pub fn parent_id(&self) -> &str {
        &self.listing.filter.1
    }

    pub async fn next(&mut self) -> Result<Option<ApiComment>, DownloaderError> {
        loop {
            if let Some(reply) = self.buffered.pop_front() {
                return Ok(Some(reply));
            }

            let Some(page) = self.listing.fetch_page::<ReplyPage>().await? else {
                return Ok(None);
            };
            self.buffered.extend(page.items);
            self.listing.cursor = PageToken::after(page.next_page_token);
        }
    }
}
