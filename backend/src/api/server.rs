//! HTTP Server for the rebate formatter.
//!
//! # API Endpoints
//!
//! | Method | Path                        | Description                        |
//! |--------|-----------------------------|------------------------------------|
//! | GET    | `/`                         | Upload page                        |
//! | GET    | `/static/style.css`         | Upload page stylesheet             |
//! | GET    | `/health`                   | Health check                       |
//! | POST   | `/api/process`              | Upload one or more CSV files       |
//! | GET    | `/api/download/{filename}`  | Download a processed CSV           |
//! | GET    | `/api/logs`                 | SSE stream for real-time logs      |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method},
    response::{sse::Event, Html, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::ProcessResponse;
use crate::config::AppConfig;
use crate::error::{ServerError, ServerResult};
use crate::storage::Storage;
use crate::transform::pipeline::{process_batch, ProcessOptions, Upload};

const INDEX_HTML: &str = include_str!("../../static/index.html");
const STYLE_CSS: &str = include_str!("../../static/style.css");

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub storage: Storage,
    pub options: ProcessOptions,
}

/// Build the router. Exposed separately from [`start_server`] for tests.
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(index))
        .route("/static/style.css", get(stylesheet))
        .route("/health", get(health))
        .route("/api/process", post(process_files))
        .route("/api/download/{filename}", get(download))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: &AppConfig) -> ServerResult<()> {
    let storage = Storage::new(&config.upload_dir, &config.output_dir)
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    let state = AppState {
        storage,
        options: ProcessOptions {
            order: config.group_order,
        },
    };
    let app = create_router(state, config.max_upload_bytes);

    let ip: std::net::IpAddr = config
        .host
        .parse()
        .map_err(|_| ServerError::Internal(format!("invalid host '{}'", config.host)))?;
    let addr = SocketAddr::new(ip, config.port);

    tracing::info!(%addr, "Rebate formatter listening");
    tracing::info!("   POST /api/process         - Upload CSV files");
    tracing::info!("   GET  /api/download/{{name}} - Download processed CSV");
    tracing::info!("   GET  /api/logs            - SSE log stream");
    tracing::info!(
        upload_dir = %config.upload_dir.display(),
        output_dir = %config.output_dir.display(),
        order = %config.group_order,
        "Storage ready"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE_CSS)
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "rebate-formatter",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "process": "POST /api/process",
            "download": "GET /api/download/{filename}",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint: every `files` (or `file`) part is one CSV.
async fn process_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Response> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "files" && name != "file" {
            continue;
        }

        let filename = field.file_name().map(|s| s.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
        uploads.push(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    if uploads.is_empty() {
        return Err(ServerError::BadRequest("No files uploaded.".to_string()));
    }

    let outcome = process_batch(&state.storage, state.options, uploads).await;
    let response = ProcessResponse::from(outcome);

    tracing::info!(
        files_processed = response.totals.files_processed,
        failed = response.failures.len(),
        total_headers = response.totals.total_headers,
        total_lumpsum = response.totals.total_lumpsum,
        total_output_rows = response.totals.total_output_rows,
        "Batch summary"
    );

    Ok((response.status(), Json(response)).into_response())
}

/// Serve a processed file as a CSV attachment.
async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ServerResult<Response> {
    let path = state.storage.resolve_download(&filename)?;
    let bytes = tokio::fs::read(&path).await?;
    let safe = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or(filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", safe),
            ),
        ],
        bytes,
    )
        .into_response())
}
