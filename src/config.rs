use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::api::ExtractorConfig;
use crate::application::FetchConfig;

/// Command-line and environment settings.
#[derive(Debug, Clone, Parser)]
#[command(name = "reelfetch", version, about = "Download Instagram media over HTTP")]
pub struct Settings {
    /// Address to listen on.
    #[arg(long, env = "REELFETCH_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// Directory downloads are written to; created if absent.
    #[arg(long, env = "REELFETCH_DOWNLOAD_DIR", default_value = "downloads")]
    pub download_dir: PathBuf,

    /// yt-dlp executable.
    #[arg(long, env = "REELFETCH_YT_DLP", default_value = "yt-dlp")]
    pub yt_dlp: PathBuf,

    /// Cookie jar passed to yt-dlp.
    #[arg(long, env = "REELFETCH_COOKIES")]
    pub cookies: Option<PathBuf>,

    #[arg(long, env = "REELFETCH_EXTRACTION_TIMEOUT_SECS", default_value_t = 180)]
    pub extraction_timeout_secs: u64,

    #[arg(long, env = "REELFETCH_MAX_CONCURRENT_FETCHES", default_value_t = 4)]
    pub max_concurrent_fetches: usize,

    /// Reject content types other than reels, reel, dp, audio and video.
    #[arg(long, env = "REELFETCH_STRICT_CONTENT_TYPES")]
    pub strict_content_types: bool,

    /// Log filter directive, e.g. `reelfetch=debug`.
    #[arg(long, env = "RUST_LOG")]
    pub log: Option<String>,
}

impl Settings {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            download_dir: self.download_dir.clone(),
            extraction_timeout: Duration::from_secs(self.extraction_timeout_secs.max(1)),
            max_concurrent_fetches: self.max_concurrent_fetches.max(1),
            strict_content_types: self.strict_content_types,
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            binary: self.yt_dlp.clone(),
            cookies_file: self.cookies.clone(),
        }
    }
}
