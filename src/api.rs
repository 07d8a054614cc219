use crate::error::DownloaderError;
use crate::rate_limiter::RateLimiter;
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

const QUOTA_REASONS: [&str; 4] = [
    "quotaExceeded",
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "dailyLimitExceeded",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CommentThreads,
    Comments,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::CommentThreads => "commentThreads",
            Endpoint::Comments => "comments",
        }
    }
}

/// Issues single page requests against the Data API.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl PageFetcher {
    pub fn new(base_url: &str) -> Result<Self, DownloaderError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET one page of `endpoint`. Waits on `limiter` before sending.
    pub async fn fetch(
        &self,
        limiter: &RateLimiter,
        endpoint: Endpoint,
        params: &[(&str, &str)],
    ) -> Result<Value, DownloaderError> {
        limiter.acquire().await;

        let url = format!("{}/{}", self.base_url, endpoint.path());
        let page_token = params
            .iter()
            .find(|(k, _)| *k == "pageToken")
            .map(|(_, v)| *v)
            .unwrap_or("<first>");
        debug!("GET {} (page {})", url, page_token);

        let resp = self.client.get(&url).query(params).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

fn classify_failure(status: StatusCode, body: &str) -> DownloaderError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();

    let quota = status == StatusCode::TOO_MANY_REQUESTS
        || match &envelope {
            Some(env) => env
                .error
                .errors
                .iter()
                .filter_map(|detail| detail.reason.as_deref())
                .any(|reason| QUOTA_REASONS.contains(&reason)),
            None => QUOTA_REASONS.iter().any(|reason| body.contains(reason)),
        };

    let message = envelope
        .and_then(|env| env.error.message)
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    let status = status.as_u16();
    if quota {
        DownloaderError::QuotaExceededError { status, message }
    } else {
        DownloaderError::RequestFailedError { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn quota_body() -> Value {
        json!({
            "error": {
                "code": 403,
                "message": "The request cannot be completed because you have exceeded your quota.",
                "errors": [{
                    "message": "The request cannot be completed because you have exceeded your quota.",
                    "domain": "youtube.quota",
                    "reason": "quotaExceeded"
                }]
            }
        })
    }

    async fn fetch_from(server: &MockServer) -> Result<Value, DownloaderError> {
        let fetcher = PageFetcher::new(&server.uri()).unwrap();
        let limiter = RateLimiter::new(0);
        fetcher
            .fetch(&limiter, Endpoint::Comments, &[("key", "value"), ("parentId", "c1")])
            .await
    }

    #[tokio::test]
    async fn returns_parsed_json_and_sends_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comments"))
            .and(query_param("key", "value"))
            .and(query_param("parentId", "c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;

        let value = fetch_from(&server).await.unwrap();
        assert_eq!(value, json!({"items": []}));
    }

    #[tokio::test]
    async fn quota_exceeded_403_is_distinct() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comments"))
            .respond_with(ResponseTemplate::new(403).set_body_json(quota_body()))
            .mount(&server)
            .await;

        match fetch_from(&server).await.unwrap_err() {
            DownloaderError::QuotaExceededError { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("exceeded your quota"));
            }
            other => panic!("expected quota error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn other_403_is_generic_failure() {
        let server = MockServer::start().await;
        let body = json!({
            "error": {
                "code": 403,
                "message": "The video identified by the videoId parameter has disabled comments.",
                "errors": [{ "reason": "commentsDisabled" }]
            }
        });
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(body))
            .mount(&server)
            .await;

        match fetch_from(&server).await.unwrap_err() {
            DownloaderError::RequestFailedError { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("disabled comments"));
            }
            other => panic!("expected request failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_is_carried_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
            .mount(&server)
            .await;

        match fetch_from(&server).await.unwrap_err() {
            DownloaderError::RequestFailedError { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "backend exploded");
            }
            other => panic!("expected request failure, got {:?}", other),
        }
    }

    #[test]
    fn too_many_requests_counts_as_quota() {
        let err = classify_failure(StatusCode::TOO_MANY_REQUESTS, "");
        assert!(err.is_quota_exceeded());
        assert!(err.to_string().contains("Too Many Requests"));
    }

    #[test]
    fn quota_reason_in_plain_text_body() {
        let err = classify_failure(StatusCode::FORBIDDEN, "reason: rateLimitExceeded");
        assert!(err.is_quota_exceeded());
    }
}
