use std::path::PathBuf;

/// Media category selected by the `/download/{content_type}` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Reels,
    /// Profile picture ("display picture").
    Dp,
    Audio,
    Video,
}

impl ContentType {
    /// Parse a known label. Unknown labels return `None`; callers decide
    /// whether to fall back to [`ContentType::Video`] or reject.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "reels" | "reel" => Some(Self::Reels),
            "dp" => Some(Self::Dp),
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    /// Prefix used to namespace output files in the download directory.
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Reels => "reels",
            Self::Dp => "dp",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    pub fn default_extension(self) -> &'static str {
        match self {
            Self::Dp => "jpg",
            Self::Audio => "mp3",
            Self::Reels | Self::Video => "mp4",
        }
    }

    pub fn format_preference(self) -> FormatPreference {
        match self {
            Self::Audio => FormatPreference::BestAudio,
            _ => FormatPreference::BestVideoWithAudio,
        }
    }
}

/// Stream selection handed to the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatPreference {
    BestVideoWithAudio,
    BestAudio,
}

impl FormatPreference {
    pub fn selector(self) -> &'static str {
        match self {
            Self::BestVideoWithAudio => "bestvideo+bestaudio/best",
            Self::BestAudio => "bestaudio",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub content_type: ContentType,
}

#[derive(Debug, Clone)]
pub struct DownloadResult {
    /// Absolute path inside the download directory.
    pub file_path: PathBuf,
    pub media_extension: String,
}
