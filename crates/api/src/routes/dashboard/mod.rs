//! Admin dashboard: session endpoints, stats, document CRUD, images and
//! QR codes. Everything except login needs an [`AdminSession`].
//!
//! [`AdminSession`]: crate::middleware::AdminSession

mod assets;
mod documents;
mod overview;
mod qr;
mod session;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    // Multipart framing adds a little on top of the file itself.
    let upload_limit = state.config().max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/dashboard", get(overview::page))
        .route("/dashboard/login", post(session::form_login))
        .route("/dashboard/api/login", post(session::login))
        .route("/dashboard/api/logout", post(session::logout))
        .route("/dashboard/api/stats", get(overview::stats))
        .route(
            "/dashboard/api/documents",
            get(documents::list).post(documents::create),
        )
        .route(
            "/dashboard/api/documents/{id}",
            get(documents::fetch).patch(documents::patch).delete(documents::delete),
        )
        .route("/dashboard/api/documents/{id}/publish", post(documents::publish))
        .route("/dashboard/api/documents/{id}/unpublish", post(documents::unpublish))
        .route("/dashboard/api/mutate", post(documents::mutate))
        .route("/dashboard/api/preview", post(documents::preview))
        .route("/dashboard/api/assets", get(assets::list))
        .route("/dashboard/api/assets/{id}", axum::routing::delete(assets::delete))
        .route(
            "/api/upload-image",
            post(assets::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/dashboard/api/qr", get(qr::list).post(qr::create))
        .route("/dashboard/api/qr/{id}/download", get(qr::download))
        .route("/q/{id}", get(qr::scan))
}
