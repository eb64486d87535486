//! Media inputs accepted by the submission entry points and the rules that
//! turn them into a `MediaType`.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const VIDEO_EXTENSIONS: [&str; 4] = [".mp4", ".mov", ".webm", ".m4v"];
const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    /// Anything that is not explicitly `video/*` is analysed as an image.
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.trim().to_ascii_lowercase().starts_with("video") {
            MediaType::Video
        } else {
            MediaType::Image
        }
    }
}

/// A file picked or dropped by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInput {
    pub name: String,
    pub mime_type: String,
}

impl FileInput {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn media_type(&self) -> MediaType {
        MediaType::from_mime(&self.mime_type)
    }
}

/// An in-page image picked through the context-menu "analyse" action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextImage {
    pub mime_type: String,
}

impl ContextImage {
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
        }
    }

    pub fn display_name(&self) -> &'static str {
        if self.mime_type.to_ascii_lowercase().contains("png") {
            "context-image.png"
        } else {
            "context-image.jpg"
        }
    }
}

/// URL accepted for analysis, normalised to carry an explicit scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUrl {
    pub url: String,
    pub media_type: MediaType,
}

/// Classify a pasted URL by the file extensions it mentions.
///
/// The extension may appear anywhere in the URL (CDN links often carry query
/// strings after it). Video extensions win over image extensions.
pub fn detect_url_media(raw: &str) -> Result<MediaUrl, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let url = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let lower = url.to_ascii_lowercase();
    let media_type = if VIDEO_EXTENSIONS.iter().any(|ext| lower.contains(ext)) {
        MediaType::Video
    } else if IMAGE_EXTENSIONS.iter().any(|ext| lower.contains(ext)) {
        MediaType::Image
    } else {
        return Err(ValidationError::UnrecognizedMedia(url));
    };

    Ok(MediaUrl { url, media_type })
}

fn has_http_scheme(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
