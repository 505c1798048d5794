use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use sobremesa_core::mutation::types::CreateMutation;
use sobremesa_core::mutation::{Mutation, MutationResponse, PatchMutation, PatchOperations};
use sobremesa_core::portable_text::{self, Block, EditOp, Editor};
use sobremesa_core::Perspective;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AdminSession;
use crate::state::AppState;

const ALL_DOCUMENTS: &str = "*[defined(_id)] | order(_updatedAt desc)";
const DOCUMENTS_OF_TYPE: &str = "*[_type == $type] | order(_updatedAt desc)";

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "type")]
    doc_type: Option<String>,
}

/// Every document, drafts included, newest change first.
pub async fn list(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let documents = match params.doc_type.as_deref().filter(|t| !t.is_empty()) {
        Some(doc_type) => {
            state
                .client()
                .query_value(DOCUMENTS_OF_TYPE, &json!({ "type": doc_type }), Perspective::Raw)
                .await?
        }
        None => {
            state
                .client()
                .query_value(ALL_DOCUMENTS, &Value::Null, Perspective::Raw)
                .await?
        }
    };
    Ok(Json(json!({ "documents": documents })))
}

/// The single result document of a committed batch.
fn single_document(response: &MutationResponse) -> ApiResult<Value> {
    response
        .results
        .first()
        .and_then(|r| r.document.clone())
        .ok_or_else(|| ApiError::Internal("mutation produced no document".into()))
}

pub async fn create(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(document): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let response = state
        .committer()
        .commit(vec![Mutation::Create(CreateMutation { document })])
        .await?;
    Ok((StatusCode::CREATED, Json(single_document(&response)?)))
}

pub async fn fetch(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let doc = state
        .store()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("document `{id}` not found")))?;
    Ok(Json(doc.to_value()))
}

/// Patch operations plus an optional `ifRevisionID` guard.
#[derive(Debug, Deserialize)]
pub struct PatchRequest {
    #[serde(rename = "ifRevisionID")]
    if_revision_id: Option<String>,
    #[serde(flatten)]
    operations: PatchOperations,
}

pub async fn patch(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<String>,
    Json(req): Json<PatchRequest>,
) -> ApiResult<Json<Value>> {
    let response = state
        .committer()
        .commit(vec![Mutation::Patch(PatchMutation {
            id,
            if_revision_id: req.if_revision_id,
            operations: req.operations,
        })])
        .await?;
    Ok(Json(single_document(&response)?))
}

pub async fn delete(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let response = state.committer().commit(vec![Mutation::delete(id.clone())]).await?;
    if response.results.is_empty() {
        return Err(ApiError::NotFound(format!("document `{id}` not found")));
    }
    Ok(Json(json!({
        "transactionId": response.transaction_id,
        "deleted": id,
    })))
}

pub async fn publish(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mutation = Mutation::Patch(PatchMutation {
        id,
        if_revision_id: None,
        operations: PatchOperations {
            set: Some(json!({ "published": true })),
            set_if_missing: Some(json!({ "publishedAt": Utc::now().to_rfc3339() })),
            ..Default::default()
        },
    });
    let response = state.committer().commit(vec![mutation]).await?;
    Ok(Json(single_document(&response)?))
}

pub async fn unpublish(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mutation = Mutation::Patch(PatchMutation {
        id,
        if_revision_id: None,
        operations: PatchOperations {
            set: Some(json!({ "published": false })),
            unset: Some(vec!["publishedAt".to_string()]),
            ..Default::default()
        },
    });
    let response = state.committer().commit(vec![mutation]).await?;
    Ok(Json(single_document(&response)?))
}

#[derive(Debug, Deserialize)]
pub struct MutateRequest {
    mutations: Vec<Mutation>,
}

/// Raw mutation batch, applied in order.
pub async fn mutate(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(req): Json<MutateRequest>,
) -> ApiResult<Json<MutationResponse>> {
    if req.mutations.is_empty() {
        return Err(ApiError::BadRequest("no mutations given".into()));
    }
    Ok(Json(state.committer().commit(req.mutations).await?))
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    body: Vec<Block>,
    #[serde(default)]
    ops: Vec<EditOp>,
}

/// Replay `ops` over `body`, then render the result the way public pages
/// will. The edited blocks come back so the form can keep them.
pub async fn preview(_session: AdminSession, Json(req): Json<PreviewRequest>) -> ApiResult<Json<Value>> {
    let mut editor = Editor::new(req.body);
    for (step, op) in req.ops.iter().enumerate() {
        editor
            .apply(op)
            .map_err(|e| ApiError::BadRequest(format!("edit {step}: {e}")))?;
    }
    let body = editor.blocks();
    Ok(Json(json!({
        "blocks": body,
        "canUndo": editor.can_undo(),
        "canRedo": editor.can_redo(),
        "html": portable_text::to_html(body),
        "plainText": portable_text::to_plain_text(body),
        "wordCount": portable_text::word_count(body),
        "readingTimeMinutes": portable_text::reading_time_minutes(body),
    })))
}
