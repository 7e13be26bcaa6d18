use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::FormRejection, Form, Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::{
    application::DownloadCoordinator,
    domain::{DownloadRequest, DownloadResult, FetchError, ValidationError},
    utils::{attachment_disposition, mime_for_path},
};

type SharedCoordinator = Arc<DownloadCoordinator>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct DownloadForm {
    #[serde(default)]
    url: Option<String>,
}

/// Routes are served both at the root and under `/api`.
pub fn router(coordinator: DownloadCoordinator) -> Router {
    let routes: Router<SharedCoordinator> = Router::new()
        .route("/health", get(health))
        .route("/download/{content_type}", post(download));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(coordinator))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "Server is running",
    })
}

async fn download(
    State(coordinator): State<SharedCoordinator>,
    Path(label): Path<String>,
    form: Result<Form<DownloadForm>, FormRejection>,
) -> Result<Response, HttpError> {
    // An undecodable body is indistinguishable from a missing field.
    let url = form
        .ok()
        .and_then(|Form(form)| form.url)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or(FetchError::BadRequest(ValidationError::MissingUrl))?;

    let content_type = coordinator.resolve_content_type(&label)?;
    let result = coordinator
        .fetch(DownloadRequest { url, content_type })
        .await?;

    Ok(stream_file(&result).await?)
}

async fn stream_file(result: &DownloadResult) -> Result<Response, FetchError> {
    let file = tokio::fs::File::open(&result.file_path)
        .await
        .map_err(|e| FetchError::Storage(format!("opening download: {}", e)))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| FetchError::Storage(format!("reading download metadata: {}", e)))?
        .len();

    let filename = result
        .file_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("download.{}", result.media_extension));
    let disposition = HeaderValue::from_str(&attachment_disposition(&filename))
        .map_err(|_| FetchError::Storage(format!("unusable file name {filename}")))?;

    let headers = [
        (
            CONTENT_TYPE,
            HeaderValue::from_static(mime_for_path(&result.file_path)),
        ),
        (CONTENT_LENGTH, HeaderValue::from(length)),
        (CONTENT_DISPOSITION, disposition),
    ];
    let body = Body::from_stream(ReaderStream::new(file));

    Ok((headers, body).into_response())
}

#[derive(Debug)]
pub struct HttpError(FetchError);

impl From<FetchError> for HttpError {
    fn from(err: FetchError) -> Self {
        Self(err)
    }
}

impl HttpError {
    fn status(&self) -> StatusCode {
        match self.0 {
            FetchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            FetchError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
            FetchError::ExtractionFailed(_)
            | FetchError::Storage(_)
            | FetchError::WorkerUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "download failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "download rejected");
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
