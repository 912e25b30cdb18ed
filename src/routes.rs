use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::{cors::{Any, CorsLayer}, services::ServeDir};
use uuid::Uuid;

use crate::{
    catalog::{caption_for_filename, image_for_caption, secure_filename, video_for_style, SAMPLE_SUMMARIES, sample_for_filename},
    config::ServerConfig,
    models::{AnimatedVideoResponse, CaptionResponse, GenerateImageRequest, GenerateVideoRequest, ImageResponse, StoredImage, VideoCaptionResponse, ANIMATION_STYLES, DEFAULT_ANIMATION_STYLE},
    upload::{validate, MediaKind},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<Vec<StoredImage>>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self { store: Arc::default(), config: Arc::new(config) }
    }

    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Failed to {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        } else {
            tracing::warn!("🚫 Rejected request: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);
    let uploads = ServeDir::new(&state.config.upload_dir);
    let body_limit = MediaKind::Video.max_bytes() as usize + 1024 * 1024;

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/generate-caption", post(generate_caption))
        .route("/api/generate-video-caption", post(generate_video_caption))
        .route("/api/generate-image", post(generate_image))
        .route("/api/generate-animated-video", post(generate_animated_video))
        .route("/api/images", get(list_images))
        .nest_service("/static", static_files)
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

pub async fn index() -> Html<&'static str> {
    Html("<!doctype html><html><head><title>Caption Studio</title></head><body><h1>Caption Studio</h1><p>Demo backend is running. See /api/images for saved results.</p></body></html>")
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

struct Upload {
    filename: String,
    data: Bytes,
}

/// Pulls the field for `kind` out of the form and validates it.
async fn read_upload(mut multipart: Multipart, kind: MediaKind) -> Result<Upload, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::BadRequest(e.body_text()))? {
        if field.name() != Some(kind.form_field()) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(AppError::BadRequest(format!("No {} selected", kind)));
        }
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| mime_guess::from_path(&filename).first_or_octet_stream().essence_str().to_string());
        let data = field.bytes().await.map_err(|e| AppError::BadRequest(e.body_text()))?;
        validate(kind, &content_type, data.len() as u64).map_err(|e| AppError::BadRequest(e.to_string()))?;
        return Ok(Upload { filename, data });
    }
    Err(AppError::BadRequest(format!("No {} provided", kind)))
}

/// Writes the upload under the upload dir; returns the public URL path.
async fn save_upload(state: &AppState, id: Uuid, upload: &Upload) -> Result<String, AppError> {
    let safe = match secure_filename(&upload.filename) {
        name if name.is_empty() => "upload".to_string(),
        name => name,
    };
    let stored_name = format!("{}-{}", id.simple(), safe);
    let dir = &state.config.upload_dir;
    tokio::fs::create_dir_all(dir).await.map_err(|e| AppError::Internal(format!("create upload dir: {}", e)))?;
    tokio::fs::write(dir.join(&stored_name), &upload.data)
        .await
        .map_err(|e| AppError::Internal(format!("save upload {}: {}", stored_name, e)))?;
    tracing::info!("📁 Saved upload {} ({} bytes)", stored_name, upload.data.len());
    Ok(format!("/uploads/{}", stored_name))
}

fn required_caption(caption: Option<String>) -> Result<String, AppError> {
    caption
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("No caption provided".into()))
}

pub async fn generate_caption(State(state): State<AppState>, multipart: Multipart) -> Result<Json<CaptionResponse>, AppError> {
    let upload = read_upload(multipart, MediaKind::Image).await?;
    let id = Uuid::new_v4();
    let image_url = save_upload(&state, id, &upload).await?;
    state.simulate_latency().await;

    let caption = caption_for_filename(&upload.filename).to_string();
    tracing::info!("📝 Generated caption for {}: {}", upload.filename, caption);

    state.store.write().push(StoredImage {
        id: id.to_string(),
        image_url: image_url.clone(),
        caption: caption.clone(),
        original_filename: Some(upload.filename),
        created_at: Utc::now(),
    });
    Ok(Json(CaptionResponse { caption, image_url: Some(image_url), id: Some(id.to_string()) }))
}

pub async fn generate_video_caption(State(state): State<AppState>, multipart: Multipart) -> Result<Json<VideoCaptionResponse>, AppError> {
    let upload = read_upload(multipart, MediaKind::Video).await?;
    let id = Uuid::new_v4();
    save_upload(&state, id, &upload).await?;
    state.simulate_latency().await;

    let sample = sample_for_filename(&upload.filename);
    let caption = caption_for_filename(&upload.filename).to_string();
    tracing::info!("🎬 Generated video caption for {}: {}", upload.filename, caption);

    Ok(Json(VideoCaptionResponse {
        caption,
        summary: SAMPLE_SUMMARIES[sample].to_string(),
        animated_video_url: Some(video_for_style(DEFAULT_ANIMATION_STYLE)),
        id: Some(id.to_string()),
    }))
}

pub async fn generate_image(
    State(state): State<AppState>,
    payload: Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Result<Json<ImageResponse>, AppError> {
    let caption = required_caption(payload.ok().and_then(|Json(body)| body.caption))?;
    tracing::info!("🖼️ Caption received: {}", caption);
    state.simulate_latency().await;

    let image_url = image_for_caption(&caption).to_string();
    let id = Uuid::new_v4().to_string();
    state.store.write().push(StoredImage {
        id: id.clone(),
        image_url: image_url.clone(),
        caption,
        original_filename: None,
        created_at: Utc::now(),
    });
    tracing::info!("✅ Generated image URL: {}", image_url);
    Ok(Json(ImageResponse { image_url, id: Some(id) }))
}

pub async fn generate_animated_video(
    State(state): State<AppState>,
    payload: Result<Json<GenerateVideoRequest>, JsonRejection>,
) -> Result<Json<AnimatedVideoResponse>, AppError> {
    let body = payload.map(|Json(b)| b).ok();
    let style = body.as_ref().and_then(|b| b.style.clone()).unwrap_or_else(|| DEFAULT_ANIMATION_STYLE.to_string());
    let caption = required_caption(body.and_then(|b| b.caption))?;
    if !ANIMATION_STYLES.contains(&style.as_str()) {
        return Err(AppError::BadRequest(format!("Unsupported animation style: {}", style)));
    }
    tracing::info!("🎞️ Animating '{}' in {} style", caption, style);
    state.simulate_latency().await;

    Ok(Json(AnimatedVideoResponse { video_url: video_for_style(&style), id: Some(Uuid::new_v4().to_string()) }))
}

pub async fn list_images(State(state): State<AppState>) -> Json<Vec<StoredImage>> {
    Json(state.store.read().clone())
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Starting demo backend");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}
