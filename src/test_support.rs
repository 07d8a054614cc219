//! Upstream API fixtures for tests.

use serde_json::{json, Value};
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn comment_json(id: &str) -> Value {
    json!({
        "id": id,
        "snippet": {
            "authorDisplayName": format!("Author of {}", id),
            "textOriginal": format!("Text of {} ✓", id),
            "publishedAt": "2020-01-01T00:00:00Z",
            "likeCount": 1
        }
    })
}

pub fn thread_json(top_id: &str, total_reply_count: u64) -> Value {
    json!({
        "id": format!("thread-{}", top_id),
        "snippet": {
            "topLevelComment": comment_json(top_id),
            "totalReplyCount": total_reply_count
        }
    })
}

/// Two threads for `video_id`: `top-{video}-1` with one reply
/// `reply-{video}-1`, then `top-{video}-2` with none.
pub async fn mount_video(server: &MockServer, video_id: &str) {
    let first_top = format!("top-{}-1", video_id);

    Mock::given(method("GET"))
        .and(path("/commentThreads"))
        .and(query_param("videoId", video_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                thread_json(&first_top, 1),
                thread_json(&format!("top-{}-2", video_id), 0)
            ],
            "pageInfo": { "totalResults": 2 }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/comments"))
        .and(query_param("parentId", first_top.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [comment_json(&format!("reply-{}-1", video_id))]
        })))
        .mount(server)
        .await;
}

/// Every thread request for `video_id` fails with a quota error.
pub async fn mount_quota_failure(server: &MockServer, video_id: &str) {
    Mock::given(method("GET"))
        .and(path("/commentThreads"))
        .and(query_param("videoId", video_id))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "The request cannot be completed because you have exceeded your quota.",
                "errors": [{ "domain": "youtube.quota", "reason": "quotaExceeded" }]
            }
        })))
        .mount(server)
        .await;
}

pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn read_ids(path: &Path) -> Vec<String> {
    read_lines(path)
        .iter()
        .map(|line| {
            let value: Value = serde_json::from_str(line).unwrap();
            value["id"].as_str().unwrap().to_string()
        })
        .collect()
}
