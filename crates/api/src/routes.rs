use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode, header},
    routing::{delete, get, post},
};
use extract::{ExtractionSession, ImageFile, SessionError, SessionSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::card::ProfileCard;
use crate::metrics::{Metrics, MetricsSnapshot};

pub struct AppState {
    pub session: Arc<ExtractionSession>,
    pub metrics: Arc<Metrics>,
    pub model: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model: String,
}

#[derive(Deserialize)]
struct SubmitUrlRequest {
    url: String,
}

type SessionResponse = Result<(StatusCode, Json<SessionSnapshot>), StatusCode>;

pub fn router(state: Arc<AppState>, max_image_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/session", get(get_session).delete(dismiss_session))
        .route("/session/card", get(get_card))
        .route("/session/url", post(submit_url))
        .route(
            "/session/image",
            post(upload_image).layer(DefaultBodyLimit::max(max_image_bytes)),
        )
        .route("/session/preview", delete(remove_preview))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.model.clone(),
    })
}

async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

async fn get_card(State(state): State<Arc<AppState>>) -> Result<Json<ProfileCard>, StatusCode> {
    let snapshot = state.session.snapshot();
    let record = snapshot.record.as_ref().ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ProfileCard::from_record(record)))
}

async fn submit_url(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitUrlRequest>,
) -> SessionResponse {
    state
        .session
        .submit_url(&req.url)
        .map_err(session_error_status)?;

    Ok((StatusCode::ACCEPTED, Json(state.session.snapshot())))
}

async fn upload_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> SessionResponse {
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| v.starts_with("image/"))
        .ok_or(StatusCode::UNSUPPORTED_MEDIA_TYPE)?;

    if body.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    state
        .session
        .choose_file(ImageFile::new(mime_type, body.to_vec()))
        .map_err(session_error_status)?;

    Ok((StatusCode::ACCEPTED, Json(state.session.snapshot())))
}

async fn remove_preview(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    state.session.remove_preview();
    Json(state.session.snapshot())
}

async fn dismiss_session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    state.session.dismiss();
    Json(state.session.snapshot())
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

fn session_error_status(err: SessionError) -> StatusCode {
    tracing::debug!(error = %err, "Extraction request refused");
    match err {
        SessionError::EmptyUrl => StatusCode::BAD_REQUEST,
        SessionError::Busy => StatusCode::CONFLICT,
    }
}
