//! Viewer and controller UI documents.
//!
//! The documents themselves are deployment assets under `ui.dir`; the
//! relay only serves them.

use std::path::Path;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::server::AppState;

pub const VIEWER_DOCUMENT: &str = "tv.html";
pub const CONTROLLER_DOCUMENT: &str = "phone.html";

/// `GET /`
pub async fn viewer_page(State(state): State<AppState>) -> Response {
    serve_document(&state.ui_dir, VIEWER_DOCUMENT).await
}

/// `GET /phone` and `GET /phone/{session_id}`; the code is read client-side.
pub async fn controller_page(State(state): State<AppState>) -> Response {
    serve_document(&state.ui_dir, CONTROLLER_DOCUMENT).await
}

async fn serve_document(dir: &Path, name: &str) -> Response {
    let path = dir.join(name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "UI document unavailable");
            (StatusCode::NOT_FOUND, "Document not found").into_response()
        }
    }
}
