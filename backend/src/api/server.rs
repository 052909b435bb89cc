//! HTTP server for the interactive uploader.
//!
//! An upload runs the same pipeline as a batch run; the three workbooks are
//! kept in memory under a job id until they are downloaded.
//!
//! # API Endpoints
//!
//! | Method | Path                         | Description                      |
//! |--------|------------------------------|----------------------------------|
//! | GET    | `/health`                    | Health check                     |
//! | POST   | `/api/upload`                | Upload a promotion export        |
//! | GET    | `/api/jobs/{job_id}/{kind}`  | Download one generated workbook  |
//! | GET    | `/api/logs`                  | SSE stream for real-time logs    |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Sse},
    routing::{get, post},
    Router,
};
use chrono::Local;
use futures::stream::Stream;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio::sync::RwLock;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, pipeline_error_response, UploadResponse};
use crate::config::MAX_UPLOAD_SIZE;
use crate::error::{DatasetError, PipelineError, ServerError, ServerResult};
use crate::export::ExportKind;
use crate::transform::pipeline::{transform_bytes, TransformOptions};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Finished jobs kept before the oldest is dropped.
const MAX_JOBS: usize = 64;

type ApiError = (StatusCode, Json<Value>);

/// Serialized workbooks of one upload.
#[derive(Debug, Clone)]
pub struct Job {
    pub tag: String,
    pub files: HashMap<ExportKind, Vec<u8>>,
}

/// In-memory job store with oldest-first eviction.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: HashMap<String, Job>,
    order: VecDeque<String>,
}

impl JobStore {
    pub fn insert(&mut self, id: String, job: Job) {
        if self.order.len() >= MAX_JOBS {
            if let Some(oldest) = self.order.pop_front() {
                self.jobs.remove(&oldest);
            }
        }
        self.order.push_back(id.clone());
        self.jobs.insert(id, job);
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    pub options: TransformOptions,
    pub jobs: Arc<RwLock<JobStore>>,
}

impl AppState {
    pub fn new(options: TransformOptions) -> Self {
        Self {
            options,
            jobs: Arc::new(RwLock::new(JobStore::default())),
        }
    }
}

/// Routes, CORS and the upload size limit over shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/jobs/{job_id}/{kind}", get(download))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(port: u16, options: TransformOptions) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(AppState::new(options));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Promoload server running on http://localhost:{}", port);
    println!("   POST /api/upload              - Upload promotion export");
    println!("   GET  /api/jobs/{{id}}/{{kind}}    - Download a workbook");
    println!("   GET  /api/logs                - SSE log stream");
    println!("   GET  /health                  - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "promoload",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "download": "GET /api/jobs/{jobId}/{kind}",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // lagged receivers skip what they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint: multipart field `file`.
async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| reject(ServerError::BadRequest(format!("Multipart error: {}", e))))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| reject(ServerError::BadRequest(format!("Read error: {}", e))))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| reject(ServerError::BadRequest("No file provided".into())))?;

    log_info(format!(
        "📄 New upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    process_upload(&state, bytes).await.map(Json).map_err(|e| {
        log_error(e.to_string());
        reject(e)
    })
}

/// Transform an upload off the async runtime and store its workbooks.
pub async fn process_upload(state: &AppState, bytes: Vec<u8>) -> ServerResult<UploadResponse> {
    let options = state.options.clone();
    let tag = Local::now().format("%m.%d-%H%M%S").to_string();

    let (output, files) = tokio::task::spawn_blocking(move || -> Result<_, PipelineError> {
        let output = transform_bytes(&bytes, &options)?;
        let files = output.bundle.to_xlsx()?;
        Ok((output, files))
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))??;

    let job_id = Uuid::new_v4().to_string();
    let response = UploadResponse::new(&job_id, &tag, &output.info, &output.mapping, &output.bundle);

    let job = Job {
        tag,
        files: files.into_iter().collect(),
    };
    state.jobs.write().await.insert(job_id, job);

    Ok(response)
}

/// Download one workbook of a finished job.
async fn download(
    State(state): State<AppState>,
    Path((job_id, kind)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = ExportKind::from_slug(&kind)
        .ok_or_else(|| reject(ServerError::NotFound(format!("workbook kind '{}'", kind))))?;

    let jobs = state.jobs.read().await;
    let job = jobs
        .get(&job_id)
        .ok_or_else(|| reject(ServerError::NotFound(format!("job '{}'", job_id))))?;
    let bytes = job
        .files
        .get(&kind)
        .cloned()
        .ok_or_else(|| reject(ServerError::NotFound(format!("workbook '{}'", kind))))?;

    let disposition = format!("attachment; filename=\"{}\"", kind.file_name(&job.tag));
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// HTTP status for a server error
pub fn status_for(err: &ServerError) -> StatusCode {
    match err {
        ServerError::Pipeline(PipelineError::Resolve(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        ServerError::Pipeline(PipelineError::Dataset(DatasetError::Io(_))) => StatusCode::INTERNAL_SERVER_ERROR,
        ServerError::Pipeline(PipelineError::Dataset(_)) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(PipelineError::Export(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::NotFound(_) => StatusCode::NOT_FOUND,
        ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ServerError) -> ApiError {
    let body = match &err {
        ServerError::Pipeline(inner) => pipeline_error_response(inner),
        other => error_response(&other.to_string()),
    };
    (status_for(&err), Json(body))
}
