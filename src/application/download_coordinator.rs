use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::fs;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    api::{ExtractedMedia, ExtractionJob, MediaExtractor},
    domain::{
        validate, ContentType, DownloadRequest, DownloadResult, FetchError, OutputTemplate,
        ValidationError,
    },
};

/// Settings resolved once at startup and injected into the coordinator.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub download_dir: PathBuf,
    /// Upper bound on queueing plus extraction for one request.
    pub extraction_timeout: Duration,
    pub max_concurrent_fetches: usize,
    /// Reject unknown content types instead of treating them as video.
    pub strict_content_types: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            extraction_timeout: Duration::from_secs(180),
            max_concurrent_fetches: 4,
            strict_content_types: false,
        }
    }
}

#[derive(Clone)]
pub struct DownloadCoordinator {
    extractor: Arc<dyn MediaExtractor>,
    config: FetchConfig,
    workers: Arc<Semaphore>,
}

impl DownloadCoordinator {
    pub fn new(extractor: Arc<dyn MediaExtractor>, config: FetchConfig) -> Self {
        let workers = Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1)));
        Self {
            extractor,
            config,
            workers,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn resolve_content_type(&self, label: &str) -> Result<ContentType, FetchError> {
        match ContentType::from_label(label) {
            Some(content_type) => Ok(content_type),
            None if self.config.strict_content_types => {
                Err(ValidationError::UnsupportedContentType(label.to_string()).into())
            }
            None => Ok(ContentType::Video),
        }
    }

    /// Validate, extract and finalize one download.
    ///
    /// A failed extraction may leave a partial file behind; nothing here
    /// deletes files from the download directory. Names carry the media id
    /// when the extractor reports one, so only re-fetching the same post
    /// replaces an earlier file.
    pub async fn fetch(&self, request: DownloadRequest) -> Result<DownloadResult, FetchError> {
        let started = Instant::now();
        validate(&request.url, request.content_type)?;

        let root = fs::canonicalize(&self.config.download_dir)
            .await
            .map_err(|e| {
                FetchError::Storage(format!(
                    "download directory {}: {}",
                    self.config.download_dir.display(),
                    e
                ))
            })?;
        let template = OutputTemplate::new(root, request.content_type);
        let job = ExtractionJob {
            url: request.url.trim().to_string(),
            format: request.content_type.format_preference(),
            template: template.clone(),
            cancel: CancellationToken::new(),
        };

        info!(
            url = %job.url,
            content_type = request.content_type.namespace(),
            "fetching media"
        );

        let media = self.run_extraction(job).await?;
        let result = self.finalize(&template, media).await?;

        info!(
            path = %result.file_path.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "media ready"
        );
        Ok(result)
    }

    async fn run_extraction(&self, job: ExtractionJob) -> Result<ExtractedMedia, FetchError> {
        let cancel = job.cancel.clone();
        // Cancels the job if this future is dropped, e.g. the client hung up.
        let guard = cancel.clone().drop_guard();

        let work = async {
            let _permit = self
                .workers
                .acquire()
                .await
                .map_err(|_| FetchError::WorkerUnavailable)?;
            self.extractor.extract(&job).await.map_err(FetchError::from)
        };

        match timeout(self.config.extraction_timeout, work).await {
            Ok(result) => {
                let _ = guard.disarm();
                result
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.config.extraction_timeout.as_secs(),
                    "extraction timed out, cancelling"
                );
                cancel.cancel();
                Err(FetchError::TimedOut(self.config.extraction_timeout))
            }
        }
    }

    /// `template` must be rooted at the canonical download directory.
    async fn finalize(
        &self,
        template: &OutputTemplate,
        media: ExtractedMedia,
    ) -> Result<DownloadResult, FetchError> {
        let written = fs::canonicalize(&media.path).await.map_err(|e| {
            FetchError::ExtractionFailed(format!(
                "downloaded file {} not found: {}",
                media.path.display(),
                e
            ))
        })?;

        if written.parent() != Some(template.root()) {
            return Err(FetchError::Storage(format!(
                "{} is outside the download directory",
                written.display()
            )));
        }

        let metadata = fs::metadata(&written)
            .await
            .map_err(|e| FetchError::Storage(e.to_string()))?;
        if !metadata.is_file() {
            return Err(FetchError::Storage(format!(
                "{} is not a regular file",
                written.display()
            )));
        }

        let target = template.render(&media.title, media.id.as_deref(), &media.extension);
        if written != target {
            fs::rename(&written, &target).await.map_err(|e| {
                FetchError::Storage(format!("renaming {}: {}", written.display(), e))
            })?;
            debug!(from = %written.display(), to = %target.display(), "renamed download");
        }

        let media_extension = target
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(template.default_extension())
            .to_string();
        if media_extension != template.default_extension() {
            warn!(
                extension = %media_extension,
                expected = template.default_extension(),
                "extractor produced an unexpected container"
            );
        }

        Ok(DownloadResult {
            file_path: target,
            media_extension,
        })
    }
}
