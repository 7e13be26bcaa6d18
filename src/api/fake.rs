//! In-process stand-in for yt-dlp used by the coordinator and HTTP tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::client::{ExtractError, MediaExtractor, Result};
use super::models::{ExtractedMedia, ExtractionJob};
use crate::domain::{ContentType, FormatPreference};

pub enum Behavior {
    /// Write a file named the way `--restrict-filenames` would and report
    /// `title` and `id` as the remote metadata.
    Succeed {
        title: String,
        id: Option<String>,
        body: Vec<u8>,
    },
    Fail(String),
    /// Wait until cancelled.
    Hang,
    /// Report a file written outside the download root.
    Escape(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub url: String,
    pub format: FormatPreference,
    pub content_type: ContentType,
}

pub struct FakeExtractor {
    behavior: Behavior,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeExtractor {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding(title: &str) -> Self {
        Self::new(Behavior::Succeed {
            title: title.to_string(),
            id: None,
            body: b"media bytes".to_vec(),
        })
    }

    pub fn succeeding_with_id(title: &str, id: &str) -> Self {
        Self::new(Behavior::Succeed {
            title: title.to_string(),
            id: Some(id.to_string()),
            body: b"media bytes".to_vec(),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

async fn write(path: &Path, body: &[u8]) -> Result<()> {
    tokio::fs::write(path, body)
        .await
        .map_err(|e| ExtractError::Failed(format!("writing {}: {}", path.display(), e)))
}

#[async_trait]
impl MediaExtractor for FakeExtractor {
    async fn extract(&self, job: &ExtractionJob) -> Result<ExtractedMedia> {
        self.calls.lock().unwrap().push(Call {
            url: job.url.clone(),
            format: job.format,
            content_type: job.template.content_type(),
        });

        let extension = job.template.default_extension().to_string();
        match &self.behavior {
            Behavior::Succeed { title, id, body } => {
                let path = job.template.root().join(format!(
                    "{}_raw.{}",
                    job.template.content_type().namespace(),
                    extension
                ));
                write(&path, body).await?;
                Ok(ExtractedMedia {
                    path,
                    title: title.clone(),
                    id: id.clone(),
                    extension,
                })
            }
            Behavior::Fail(message) => Err(ExtractError::Failed(message.clone())),
            Behavior::Hang => {
                job.cancel.cancelled().await;
                Err(ExtractError::Cancelled)
            }
            Behavior::Escape(dir) => {
                let path = dir.join(format!("outside.{extension}"));
                write(&path, b"x").await?;
                Ok(ExtractedMedia {
                    path,
                    title: "outside".to_string(),
                    id: None,
                    extension,
                })
            }
        }
    }
}
