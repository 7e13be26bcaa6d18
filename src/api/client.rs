use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use super::models::{ExtractedMedia, ExtractionJob, ExtractorConfig, YtDlpInfo};
use crate::domain::ContentType;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to run yt-dlp: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Failed to wait for yt-dlp: {0}")]
    Wait(#[source] std::io::Error),

    /// Message reported by the extractor itself, passed through verbatim.
    #[error("{0}")]
    Failed(String),

    #[error("Invalid extractor output: {0}")]
    InvalidOutput(String),

    #[error("Extraction cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ExtractError>;

/// Resolves a media URL and writes the media to local storage.
///
/// Implementations must stop work when `job.cancel` fires or when the
/// returned future is dropped.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    async fn extract(&self, job: &ExtractionJob) -> Result<ExtractedMedia>;
}

#[derive(Clone)]
pub struct YtDlpClient {
    config: ExtractorConfig,
}

impl YtDlpClient {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn build_args(&self, job: &ExtractionJob) -> Vec<String> {
        let mut args: Vec<String> = [
            "--no-playlist",
            "--quiet",
            "--no-warnings",
            "--no-progress",
            "--no-simulate",
            "--restrict-filenames",
            "-f",
            job.format.selector(),
        ]
        .into_iter()
        .map(String::from)
        .collect();

        match job.template.content_type() {
            ContentType::Reels | ContentType::Video => {
                args.extend(
                    ["--merge-output-format", "mp4", "--remux-video", "mp4"].map(String::from),
                );
            }
            ContentType::Audio => {
                args.extend(["-x", "--audio-format", "mp3"].map(String::from));
            }
            ContentType::Dp => {}
        }

        if let Some(cookies) = &self.config.cookies_file {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().into_owned());
        }

        args.push("-o".to_string());
        args.push(job.template.pattern());
        args.push("--print".to_string());
        args.push("after_move:%()j".to_string());
        args.push("--".to_string());
        args.push(job.url.clone());
        args
    }
}

#[async_trait]
impl MediaExtractor for YtDlpClient {
    async fn extract(&self, job: &ExtractionJob) -> Result<ExtractedMedia> {
        debug!(binary = %self.config.binary.display(), url = %job.url, "spawning yt-dlp");

        let child = Command::new(&self.config.binary)
            .args(self.build_args(job))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ExtractError::Spawn)?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            biased;
            _ = job.cancel.cancelled() => {
                warn!(url = %job.url, "killing yt-dlp after cancellation");
                return Err(ExtractError::Cancelled);
            }
            output = child.wait_with_output() => output.map_err(ExtractError::Wait)?,
        };

        if !output.status.success() {
            return Err(ExtractError::Failed(error_message(
                &output.stderr,
                output.status,
            )));
        }

        parse_output(&output.stdout, job.template.default_extension())
    }
}

fn last_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .next_back()
        .map(ToString::to_string)
}

fn error_message(stderr: &[u8], status: ExitStatus) -> String {
    match last_line(stderr) {
        Some(line) => line
            .strip_prefix("ERROR: ")
            .map(ToString::to_string)
            .unwrap_or(line),
        None => format!("yt-dlp exited with {status}"),
    }
}

fn parse_output(stdout: &[u8], default_extension: &str) -> Result<ExtractedMedia> {
    let line = last_line(stdout)
        .ok_or_else(|| ExtractError::InvalidOutput("no info printed".to_string()))?;
    let info: YtDlpInfo = serde_json::from_str(&line)
        .map_err(|e| ExtractError::InvalidOutput(format!("JSON decode error: {}", e)))?;

    let path = info
        .filepath
        .or(info.filename)
        .map(PathBuf::from)
        .ok_or_else(|| ExtractError::InvalidOutput("missing output file path".to_string()))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(ToString::to_string)
        .or(info.ext)
        .unwrap_or_else(|| default_extension.to_string());

    let id = info.id;
    let title = info
        .title
        .or_else(|| id.clone())
        .unwrap_or_else(|| file_stem(&path));

    Ok(ExtractedMedia {
        path,
        title,
        id,
        extension,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentType, OutputTemplate};
    use tokio_util::sync::CancellationToken;

    fn job(content_type: ContentType) -> ExtractionJob {
        ExtractionJob {
            url: "https://www.instagram.com/reel/C1xyz/".to_string(),
            format: content_type.format_preference(),
            template: OutputTemplate::new("downloads", content_type),
            cancel: CancellationToken::new(),
        }
    }

    #[test]
    fn test_build_args_video() {
        let client = YtDlpClient::new(ExtractorConfig::default());
        let args = client.build_args(&job(ContentType::Reels));

        let f = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f + 1], "bestvideo+bestaudio/best");
        assert!(args.windows(2).any(|w| w == ["--merge-output-format", "mp4"]));
        assert!(!args.iter().any(|a| a == "-x"));
        assert!(!args.iter().any(|a| a == "--cookies"));
        assert_eq!(args[args.len() - 2], "--");
        assert_eq!(args[args.len() - 1], "https://www.instagram.com/reel/C1xyz/");
    }

    #[test]
    fn test_build_args_audio_with_cookies() {
        let client = YtDlpClient::new(ExtractorConfig {
            cookies_file: Some(PathBuf::from("/etc/reelfetch/cookies.txt")),
            ..Default::default()
        });
        let args = client.build_args(&job(ContentType::Audio));

        let f = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f + 1], "bestaudio");
        assert!(args.windows(3).any(|w| w == ["-x", "--audio-format", "mp3"]));
        assert!(args
            .windows(2)
            .any(|w| w == ["--cookies", "/etc/reelfetch/cookies.txt"]));
        let o = args.iter().position(|a| a == "-o").unwrap();
        assert!(args[o + 1].ends_with("audio_%(title)s_%(id)s.%(ext)s"));
    }

    #[test]
    fn test_parse_output_uses_last_line() {
        let stdout = br#"some noise
{"id": "C1xyz", "title": "Sunset", "ext": "mp4", "filepath": "downloads/reels_Sunset.mp4"}
"#;
        let media = parse_output(stdout, "mp4").unwrap();
        assert_eq!(media.path, PathBuf::from("downloads/reels_Sunset.mp4"));
        assert_eq!(media.title, "Sunset");
        assert_eq!(media.id.as_deref(), Some("C1xyz"));
        assert_eq!(media.extension, "mp4");
    }

    #[test]
    fn test_parse_output_fallbacks() {
        let stdout = br#"{"id": "C1xyz", "ext": "m4a", "_filename": "downloads/audio_NA.mp3"}"#;
        let media = parse_output(stdout, "mp3").unwrap();
        assert_eq!(media.title, "C1xyz");
        assert_eq!(media.extension, "mp3");
    }

    #[test]
    fn test_parse_output_rejects_garbage() {
        assert!(matches!(
            parse_output(b"", "mp4"),
            Err(ExtractError::InvalidOutput(_))
        ));
        assert!(matches!(
            parse_output(b"not json", "mp4"),
            Err(ExtractError::InvalidOutput(_))
        ));
        assert!(matches!(
            parse_output(br#"{"title": "x"}"#, "mp4"),
            Err(ExtractError::InvalidOutput(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_error_message_strips_prefix() {
        use std::os::unix::process::ExitStatusExt;

        let status = ExitStatus::from_raw(1 << 8);
        let stderr = b"[instagram] C1xyz: Setting up session\nERROR: [Instagram] C1xyz: Requested content is not available\n";
        assert_eq!(
            error_message(stderr, status),
            "[Instagram] C1xyz: Requested content is not available"
        );
        assert!(error_message(b"", status).starts_with("yt-dlp exited with"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let client = YtDlpClient::new(ExtractorConfig {
            binary: PathBuf::from("/nonexistent/yt-dlp-binary"),
            ..Default::default()
        });
        let err = client.extract(&job(ContentType::Video)).await.unwrap_err();
        assert!(matches!(err, ExtractError::Spawn(_)));
        assert!(err.to_string().starts_with("Failed to run yt-dlp"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancelled_job_stops_child() {
        let client = YtDlpClient::new(ExtractorConfig {
            binary: PathBuf::from("sh"),
            ..Default::default()
        });
        let job = job(ContentType::Video);
        job.cancel.cancel();

        let err = client.extract(&job).await.unwrap_err();
        assert!(matches!(err, ExtractError::Cancelled));
    }
}
