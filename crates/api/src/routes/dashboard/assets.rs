use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use sobremesa_core::mutation::types::CreateMutation;
use sobremesa_core::mutation::Mutation;
use sobremesa_core::Perspective;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AdminSession;
use crate::state::AppState;

pub const ASSET_TYPE: &str = "sanity.imageAsset";
const ASSETS: &str = r#"*[_type == "sanity.imageAsset"] | order(_createdAt desc)"#;

/// File extension for an accepted image MIME type.
pub fn image_extension(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/avif" => Some("avif"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("image exceeds the upload limit".into())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Store the multipart `file` field under the assets directory and record
/// it as an image asset document.
pub async fn upload(
    State(state): State<AppState>,
    _session: AdminSession,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let config = state.config();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let mime = field.content_type().unwrap_or_default().to_ascii_lowercase();
        let extension = image_extension(&mime)
            .ok_or_else(|| ApiError::UnsupportedMediaType(format!("`{mime}` is not an accepted image type")))?;
        let original_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("empty file".into()));
        }
        if bytes.len() > config.max_upload_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "{} bytes exceeds the {} byte limit",
                bytes.len(),
                config.max_upload_bytes
            )));
        }

        let asset_id = Uuid::new_v4().simple().to_string();
        let file_name = format!("{asset_id}.{extension}");
        tokio::fs::create_dir_all(&config.assets_dir)
            .await
            .map_err(|e| ApiError::Internal(format!("cannot create assets dir: {e}")))?;
        tokio::fs::write(config.assets_dir.join(&file_name), &bytes)
            .await
            .map_err(|e| ApiError::Internal(format!("cannot write asset: {e}")))?;

        let document = json!({
            "_id": format!("image-{asset_id}"),
            "_type": ASSET_TYPE,
            "url": format!("/assets/{file_name}"),
            "path": file_name,
            "originalFilename": original_name,
            "mimeType": mime,
            "extension": extension,
            "size": bytes.len(),
        });
        let response = state
            .committer()
            .commit(vec![Mutation::Create(CreateMutation { document })])
            .await?;
        let created = response
            .results
            .into_iter()
            .next()
            .and_then(|r| r.document)
            .ok_or_else(|| ApiError::Internal("asset document was not created".into()))?;
        tracing::info!(file = %file_name, size = bytes.len(), "image uploaded");
        return Ok((StatusCode::CREATED, Json(json!({ "document": created }))));
    }
    Err(ApiError::BadRequest("multipart field `file` is required".into()))
}

pub async fn list(State(state): State<AppState>, _session: AdminSession) -> ApiResult<Json<Value>> {
    let assets = state
        .client()
        .query_value(ASSETS, &Value::Null, Perspective::Raw)
        .await?;
    Ok(Json(json!({ "assets": assets })))
}

/// Delete the asset document, then its file. A file that is already gone
/// is not an error.
pub async fn delete(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let doc = state
        .store()
        .get(&id)
        .await?
        .filter(|d| d._type == ASSET_TYPE)
        .ok_or_else(|| ApiError::NotFound(format!("asset `{id}` not found")))?;

    state.committer().commit(vec![Mutation::delete(id.clone())]).await?;

    let stored_name = doc
        .content
        .get("path")
        .and_then(Value::as_str)
        .filter(|f| !f.contains(['/', '\\']) && !f.starts_with('.'));
    if let Some(file) = stored_name {
        let path = state.config().assets_dir.join(file);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(asset = %id, "asset file already removed");
            }
            Err(e) => tracing::warn!(asset = %id, error = %e, "asset file could not be removed"),
        }
    }
    Ok(StatusCode::NO_CONTENT)
}
