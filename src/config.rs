use crate::cli::Cli;
use crate::error::DownloaderError;
use log::debug;
use std::path::{Path, PathBuf};

pub const TOKEN_FILE_NAME: &str = "token.txt";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base: String,
    pub api_key: String,
    pub parallelism: usize,
    pub buffer_size: usize,
    pub max_requests_per_second: u32,
    pub show_progress: bool,
    /// Where the ephemeral working directory is created; `None` uses the system temp dir.
    pub temp_root: Option<PathBuf>,
}

impl Settings {
    pub fn from_cli(cli: &Cli, api_key: String) -> Self {
        Self {
            api_base: cli.api_base.clone(),
            api_key,
            parallelism: cli.parallel.max(1),
            buffer_size: cli.buffer_size.max(1),
            max_requests_per_second: cli.max_rps,
            show_progress: !cli.no_progress,
            temp_root: None,
        }
    }
}

/// `token.txt` next to the running executable, or in the working directory
/// when the executable path is unavailable.
pub fn default_token_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(TOKEN_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(TOKEN_FILE_NAME))
}

pub async fn load_api_key(token_path: &Path) -> Result<String, DownloaderError> {
    let contents = match tokio::fs::read_to_string(token_path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DownloaderError::ConfigurationError(format!(
                "No API token found at {}. Provide a token.txt file with your GCP API key.",
                token_path.display()
            )));
        }
        Err(e) => return Err(DownloaderError::IoError(e)),
    };

    let api_key = contents.trim();
    if api_key.is_empty() {
        return Err(DownloaderError::ConfigurationError(format!(
            "{} is empty; populate it with your YouTube Data API key.",
            token_path.display()
        )));
    }

    debug!("Loaded API key from {}", token_path.display());
    Ok(api_key.to_string())
}
