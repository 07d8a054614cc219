use crate::error::DownloaderError;
use url::Url;

const VIDEO_ID_LEN: usize = 11;

/// Resolve a raw video ID or a YouTube URL (short link, `/watch?v=`,
/// `/embed/`, `/shorts/`) to the 11-character video ID.
pub fn extract_video_id(input: &str) -> Result<String, DownloaderError> {
    let input = input.trim();
    if is_video_id(input) {
        return Ok(input.to_string());
    }

    parse_reference(input)
        .and_then(|url| id_from_url(&url))
        .filter(|id| is_video_id(id))
        .ok_or_else(|| DownloaderError::InvalidVideoReferenceError(input.to_string()))
}

fn is_video_id(candidate: &str) -> bool {
    candidate.len() == VIDEO_ID_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// Scheme-less references such as `youtu.be/<id>` are read as https URLs.
fn parse_reference(input: &str) -> Option<Url> {
    let url = match Url::parse(input) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{}", input)).ok()?
        }
        Err(_) => return None,
    };
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn id_from_url(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

    match url.host_str()? {
        "youtu.be" | "www.youtu.be" => segments.first().map(|s| s.to_string()),
        "youtube.com" | "www.youtube.com" | "m.youtube.com" => {
            if url.path().starts_with("/watch") {
                if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
                    return Some(v.into_owned());
                }
            }
            match segments.as_slice() {
                ["embed", id, ..] | ["shorts", id, ..] => Some(id.to_string()),
                _ => None,
            }
        }
        _ => None,
    }
}
