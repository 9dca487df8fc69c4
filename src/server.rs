//! HTTP service: the `/format` endpoint.
//!
//! - `POST /format` (also `POST /api/format`): multipart upload with a
//!   `file` field holding a `.docx`; answers with the reformatted document
//!   as an attachment
//! - `GET  /health`: server status
//!
//! Each request runs Validate → Extract → Infer → Render on its own; the
//! only shared state is the read-only config and the completion backend.
//! Validation failures answer 400 (or 405/413) before any downstream call.
//! Every downstream failure answers the same 500 body and the real cause
//! goes to the log only.

use crate::config::{FormatConfig, ServerConfig};
use crate::error::AutodoxError;
use crate::format::{format_with_backend, validate_upload_name, OUTPUT_FILENAME};
use crate::pipeline::infer::{resolve_backend, CompletionBackend};
use crate::pipeline::render::DOCX_MIME;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Name of the multipart field carrying the document.
pub const UPLOAD_FIELD: &str = "file";

/// `Content-Disposition` of every successful response.
pub const ATTACHMENT_DISPOSITION: &str = "attachment; filename=\"formatted_autodox.docx\"";

// ── Server state ──────────────────────────────────────────────────────────

/// Shared, read-only request context.
pub struct AppState {
    pub config: FormatConfig,
    pub backend: Arc<dyn CompletionBackend>,
    /// Body limit, echoed in 413 log lines.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        config: FormatConfig,
        backend: Arc<dyn CompletionBackend>,
        server: &ServerConfig,
    ) -> Self {
        Self {
            config,
            backend,
            max_upload_bytes: server.max_upload_bytes,
        }
    }
}

// ── Response types ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    backend: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        backend: state.backend.name().to_string(),
    })
}

async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response()
}

async fn format_upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    // ── Validate ─────────────────────────────────────────────────────────
    let upload = match multipart {
        Ok(m) => read_upload(m, state.max_upload_bytes).await,
        Err(rejection) => Err(AutodoxError::InvalidUpload {
            reason: rejection.body_text(),
        }),
    };
    let (name, bytes) = match upload {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };
    info!("Received '{}' ({} bytes)", name, bytes.len());

    // ── Extract → Infer → Render ─────────────────────────────────────────
    match format_with_backend(bytes, state.backend.as_ref(), &state.config).await {
        Ok(output) => {
            info!(
                "Formatted '{}': {} bytes in {}ms",
                name, output.stats.output_bytes, output.stats.total_duration_ms
            );
            docx_attachment(output.document)
        }
        Err(e) => error_response(&e),
    }
}

/// Pull the `file` field out of the multipart body.
///
/// Other fields are skipped. The first `file` field decides the outcome.
async fn read_upload(
    mut multipart: Multipart,
    limit: usize,
) -> Result<(String, Vec<u8>), AutodoxError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let name = validate_upload_name(field.file_name())?.to_string();
        let data = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        return Ok((name, data.to_vec()));
    }
    Err(AutodoxError::InvalidUpload {
        reason: format!("missing '{}' field", UPLOAD_FIELD),
    })
}

fn multipart_error(e: MultipartError, limit: usize) -> AutodoxError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AutodoxError::UploadTooLarge { limit }
    } else {
        AutodoxError::InvalidUpload {
            reason: e.body_text(),
        }
    }
}

fn docx_attachment(document: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(DOCX_MIME)),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static(ATTACHMENT_DISPOSITION),
            ),
        ],
        document,
    )
        .into_response()
}

/// Map an error to its plain-text HTTP response, logging the cause.
pub fn error_response(e: &AutodoxError) -> Response {
    match e {
        AutodoxError::InvalidUpload { reason } => {
            warn!("Rejected upload: {}", reason);
            (StatusCode::BAD_REQUEST, "Invalid file").into_response()
        }
        AutodoxError::UploadTooLarge { limit } => {
            warn!("Rejected upload over {} bytes", limit);
            (StatusCode::PAYLOAD_TOO_LARGE, "File too large").into_response()
        }
        _ => {
            error!(stage = e.stage(), "Request failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────────

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let limit = state.max_upload_bytes;
    let format_route: MethodRouter<Arc<AppState>> =
        post(format_upload).fallback(method_not_allowed);

    Router::new()
        .route("/health", get(health))
        .route("/format", format_route.clone())
        .route("/api/format", format_route)
        .layer(DefaultBodyLimit::max(limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolve the backend, bind, and serve until Ctrl-C.
pub async fn serve(server: ServerConfig, config: FormatConfig) -> Result<(), AutodoxError> {
    let backend = resolve_backend(&config)?;
    info!("autodox backend: {}", backend.name());
    let state = Arc::new(AppState::new(config, backend, &server));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&server.bind)
        .await
        .map_err(|e| AutodoxError::Internal(format!("failed to bind {}: {}", server.bind, e)))?;
    info!("autodox listening on {}", server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AutodoxError::Internal(format!("server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        return;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_errors_map_to_4xx() {
        let r = error_response(&AutodoxError::InvalidUpload {
            reason: "x".into(),
        });
        assert_eq!(r.status(), StatusCode::BAD_REQUEST);
        let r = error_response(&AutodoxError::UploadTooLarge { limit: 10 });
        assert_eq!(r.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn downstream_errors_map_to_500() {
        for e in [
            AutodoxError::NotADocx { magic: vec![] },
            AutodoxError::InvalidJson { detail: "eof".into() },
            AutodoxError::LlmApiError {
                attempts: 1,
                message: "429".into(),
            },
            AutodoxError::RenderFailed("zip".into()),
        ] {
            assert_eq!(
                error_response(&e).status(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }

    #[test]
    fn disposition_names_output_file() {
        assert!(ATTACHMENT_DISPOSITION.contains(OUTPUT_FILENAME));
    }

    #[test]
    fn attachment_headers() {
        let r = docx_attachment(vec![1, 2, 3]);
        assert_eq!(r.status(), StatusCode::OK);
        assert_eq!(r.headers()[header::CONTENT_TYPE], DOCX_MIME);
        assert_eq!(
            r.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"formatted_autodox.docx\""
        );
    }
}
