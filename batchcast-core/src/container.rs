use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("unrecognised container for {url}")]
    Unrecognised { url: String },
}

/// Streaming/file format family of a video source URL, derived from the
/// final extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Mp4,
    Hls,
    Dash,
    Unknown,
}

impl ContainerKind {
    pub fn classify(url: &str) -> Self {
        if url.ends_with(".m3u8") {
            ContainerKind::Hls
        } else if url.ends_with(".mpd") {
            ContainerKind::Dash
        } else if url.ends_with(".mp4") {
            ContainerKind::Mp4
        } else {
            ContainerKind::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Mp4 => "MP4",
            ContainerKind::Hls => "HLS",
            ContainerKind::Dash => "DASH",
            ContainerKind::Unknown => "Unknown",
        }
    }
}

/// A remote source registration ready for submission: the video sub-resource
/// it targets and the JSON body to post there. Building one has no network
/// effects.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRegistration {
    pub asset_path: &'static str,
    pub payload: serde_json::Value,
}

pub fn registration_request(
    kind: ContainerKind,
    url: &str,
) -> Result<RemoteRegistration, ContainerError> {
    let registration = match kind {
        ContainerKind::Mp4 => RemoteRegistration {
            asset_path: "assets/renditions",
            payload: json!({
                "remote_url": url,
                "video_container": kind.as_str(),
                "video_codec": "h264",
                "progressive_download": true,
            }),
        },
        ContainerKind::Hls => RemoteRegistration {
            asset_path: "assets/hls_manifest",
            payload: json!({ "remote_url": url }),
        },
        ContainerKind::Dash => RemoteRegistration {
            asset_path: "assets/dash_manifest",
            payload: json!({ "remote_url": url }),
        },
        ContainerKind::Unknown => {
            return Err(ContainerError::Unrecognised {
                url: url.to_string(),
            })
        }
    };
    Ok(registration)
}
