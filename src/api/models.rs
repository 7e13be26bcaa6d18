use std::path::PathBuf;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::domain::{FormatPreference, OutputTemplate};

/// Info dict printed by `yt-dlp --print after_move:%()j`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YtDlpInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(rename = "_filename", default)]
    pub filename: Option<String>,
}

/// Configuration for the yt-dlp client
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub binary: PathBuf,
    /// Netscape cookie jar, needed for content behind a login wall.
    pub cookies_file: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            cookies_file: None,
        }
    }
}

/// One unit of extraction work.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    pub url: String,
    pub format: FormatPreference,
    pub template: OutputTemplate,
    /// Fired on timeout or when the requesting client goes away.
    pub cancel: CancellationToken,
}

/// What the extractor wrote to disk.
#[derive(Debug, Clone)]
pub struct ExtractedMedia {
    pub path: PathBuf,
    pub title: String,
    pub id: Option<String>,
    pub extension: String,
}
