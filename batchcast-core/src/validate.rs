use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::config::IngestMode;

/// Extensions accepted for remote/URL-based sources. Manifest formats are
/// only meaningful when the platform plays them from where they live.
const REMOTE_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "mpd", "m3u8"];
/// Extensions accepted when the platform pulls and transcodes the master.
const MASTER_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\s]+$").expect("valid regex"));

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("provided url is not a valid url: {0}")]
    Syntax(#[from] url::ParseError),
    #[error("unsupported url scheme: {0}")]
    Scheme(String),
    #[error("url has no file path")]
    MissingPath,
    #[error("url does not end in a supported video format: {0}")]
    Extension(String),
    #[error("invalid tag value: {0}")]
    InvalidTag(String),
    #[error("unsupported format for tags input")]
    UnsupportedTags,
}

/// Checks a video source URL against the scheme/extension grammar for the
/// given ingest mode.
pub fn validate_video_url(raw: &str, mode: IngestMode) -> Result<(), ValidationError> {
    let parsed = Url::parse(raw)?;
    match parsed.scheme() {
        "http" | "https" | "s3" => {}
        other => return Err(ValidationError::Scheme(other.to_string())),
    }
    let file_name = parsed
        .path_segments()
        .and_then(|segments| segments.last().map(str::to_string))
        .filter(|segment| !segment.is_empty())
        .ok_or(ValidationError::MissingPath)?;
    let allowed = match mode {
        IngestMode::RemoteAssets => REMOTE_EXTENSIONS,
        IngestMode::Master => MASTER_EXTENSIONS,
    };
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && allowed.contains(&extension) => Ok(()),
        _ => Err(ValidationError::Extension(file_name)),
    }
}

/// Normalizes a raw CSV tags field into a clean list.
///
/// Accepts the three shapes the field shows up in: empty, a JSON-encoded
/// array of strings, or a comma-separated list. Every resulting tag must be
/// word characters and whitespace only; one bad tag fails the whole field.
pub fn normalize_tags(raw: &str) -> Result<Vec<String>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let tags = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(tag) => Ok(tag),
                _ => Err(ValidationError::UnsupportedTags),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => trimmed
            .split(',')
            .map(|tag| tag.trim().to_string())
            .collect(),
    };
    for tag in &tags {
        if !TAG_PATTERN.is_match(tag) {
            return Err(ValidationError::InvalidTag(tag.clone()));
        }
    }
    Ok(tags)
}
