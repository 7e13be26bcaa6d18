use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{
    api::YtDlpClient,
    application::DownloadCoordinator,
    config::Settings,
    http,
};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to create download directory {path}: {source}")]
    DownloadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Prepare storage, wire the coordinator and serve until Ctrl-C.
pub async fn run(settings: Settings) -> Result<(), ServerError> {
    let fetch_config = settings.fetch_config();
    prepare_download_dir(&fetch_config.download_dir).await?;

    let extractor = Arc::new(YtDlpClient::new(settings.extractor_config()));
    let coordinator = DownloadCoordinator::new(extractor, fetch_config);
    info!(
        download_dir = %coordinator.config().download_dir.display(),
        max_concurrent_fetches = coordinator.config().max_concurrent_fetches,
        "download coordinator ready"
    );

    let app = http::router(coordinator);
    let listener = TcpListener::bind(settings.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: settings.bind,
            source,
        })?;
    info!("listening on http://{}", settings.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

/// Create the download directory if needed. Existing directories are kept.
pub async fn prepare_download_dir(path: &Path) -> Result<(), ServerError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| ServerError::DownloadDir {
            path: path.to_path_buf(),
            source,
        })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
