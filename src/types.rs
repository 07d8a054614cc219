use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One output line: a top-level comment or a first-degree reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub parent_id: Option<String>,
    pub author: Option<String>,
    pub text: Option<String>,
    pub published_at: Option<String>,
    pub like_count: u64,
}

impl CommentRecord {
    pub fn from_comment(comment: ApiComment, parent_id: Option<String>) -> Self {
        let snippet = comment.snippet;
        Self {
            id: comment.id,
            parent_id,
            author: snippet.author_display_name,
            text: snippet.text_original,
            published_at: snippet.published_at,
            like_count: snippet.like_count,
        }
    }
}

// Upstream response shapes, restricted to what the `fields` masks request.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPage {
    #[serde(default)]
    pub items: Vec<Thread>,
    pub next_page_token: Option<String>,
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPage {
    #[serde(default)]
    pub items: Vec<ApiComment>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_results: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    #[serde(default)]
    pub id: String,
    pub snippet: ThreadSnippet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSnippet {
    pub top_level_comment: ApiComment,
    #[serde(default)]
    pub total_reply_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiComment {
    #[serde(default)]
    pub id: String,
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    pub author_display_name: Option<String>,
    pub text_original: Option<String>,
    pub published_at: Option<String>,
    #[serde(default)]
    pub like_count: u64,
}

#[derive(Debug, Clone)]
pub struct VideoJob {
    pub video_input: String,
    pub temp_dir: PathBuf,
    pub show_progress: bool,
}

#[derive(Debug, Clone)]
pub struct VideoDownload {
    pub video_input: String,
    pub video_id: String,
    pub temp_path: PathBuf,
    pub record_count: u64,
    pub duration: Duration,
}

#[derive(Debug)]
pub struct DownloadSummary {
    pub total_records: u64,
    pub total_duration: Duration,
    pub videos: Vec<VideoDownload>,
}
