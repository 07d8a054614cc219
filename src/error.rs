use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloaderError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Unable to extract video ID from '{0}'. Provide a standard YouTube URL or video ID.")]
    InvalidVideoReferenceError(String),

    #[error("API quota exceeded ({status}): {message}")]
    QuotaExceededError { status: u16, message: String },

    #[error("API request failed ({status}): {message}")]
    RequestFailedError { status: u16, message: String },

    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Malformed API response: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Worker task failed: {0}")]
    WorkerError(String),
}

impl DownloaderError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, DownloaderError::QuotaExceededError { .. })
    }
}
