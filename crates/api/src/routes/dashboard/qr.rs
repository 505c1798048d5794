use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use sobremesa_core::mutation::types::CreateMutation;
use sobremesa_core::mutation::Mutation;
use sobremesa_core::qr::{self, QrCodeRecord, QrFormat};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, PageError, PageResult};
use crate::middleware::AdminSession;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQrRequest {
    venue_id: String,
    #[serde(default)]
    label: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(req): Json<CreateQrRequest>,
) -> ApiResult<(StatusCode, Json<QrCodeRecord>)> {
    let venue = state.store().get(&req.venue_id).await?;
    if venue.as_ref().map(|v| v._type.as_str()) != Some("venue") {
        return Err(ApiError::BadRequest(format!("`{}` is not a venue", req.venue_id)));
    }

    let id = format!("qr-{}", Uuid::new_v4().simple());
    let mut document = json!({
        "_id": id,
        "_type": "qrCode",
        "venue": {"_type": "reference", "_ref": req.venue_id},
        "scans": 0,
        "downloads": 0,
    });
    if let Some(label) = req.label.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()) {
        document["label"] = json!(label);
    }
    state
        .committer()
        .commit(vec![Mutation::Create(CreateMutation { document })])
        .await?;

    let record = qr::get(state.client(), &id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("qr code `{id}` vanished after create")))?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list(State(state): State<AppState>, _session: AdminSession) -> ApiResult<Json<Vec<QrCodeRecord>>> {
    Ok(Json(qr::list(state.client()).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadParams {
    #[serde(default)]
    format: Option<QrFormat>,
}

/// Render the code as an attachment and count the download.
pub async fn download(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<String>,
    Query(params): Query<DownloadParams>,
) -> ApiResult<Response> {
    let record = qr::get(state.client(), &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("qr code `{id}` not found")))?;
    let format = params.format.unwrap_or(QrFormat::Png);
    let target = state.config().absolute_url(&record.scan_path());
    let bytes = qr::render(&target, format)?;

    state
        .committer()
        .commit(vec![Mutation::inc(id.clone(), json!({ "downloads": 1 }))])
        .await?;
    tracing::info!(qr = %id, ?format, "qr code downloaded");

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", record.file_name(format)),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Public scan endpoint: count the scan and send the visitor to the venue.
pub async fn scan(State(state): State<AppState>, Path(id): Path<String>) -> PageResult<Response> {
    let record = qr::get(state.client(), &id).await?.ok_or(PageError::NotFound)?;
    let target = record.venue_path().ok_or(PageError::NotFound)?;

    if let Err(err) = state
        .committer()
        .commit(vec![Mutation::inc(id.clone(), json!({ "scans": 1 }))])
        .await
    {
        tracing::warn!(qr = %id, error = %err, "qr scan not counted");
    }

    Ok((StatusCode::FOUND, [(header::LOCATION, target)]).into_response())
}
