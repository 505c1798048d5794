use std::collections::HashMap;
use std::convert::Infallible;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use futures::stream::{self, Stream, StreamExt};
use serde_json::{json, Map, Value};
use sobremesa_core::events::ContentEvent;
use sobremesa_core::Perspective;
use tokio::sync::broadcast::error::RecvError;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AdminSession;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/data/query", get(query))
        .route("/v1/listen", get(listen))
}

/// `?query=...&$name=<json>&perspective=published|raw`. Parameter values
/// that are not valid JSON are taken as plain strings.
pub fn parse_query_params(raw: &HashMap<String, String>) -> ApiResult<(String, Value, Perspective)> {
    let query = raw
        .get("query")
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing `query` parameter".into()))?
        .clone();

    let perspective = match raw.get("perspective").map(String::as_str) {
        None | Some("published") => Perspective::Published,
        Some("raw") | Some("drafts") => Perspective::Raw,
        Some(other) => return Err(ApiError::BadRequest(format!("unknown perspective `{other}`"))),
    };

    let params: Map<String, Value> = raw
        .iter()
        .filter_map(|(key, value)| {
            let name = key.strip_prefix('$')?;
            let parsed = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.clone()));
            Some((name.to_string(), parsed))
        })
        .collect();

    Ok((query, Value::Object(params), perspective))
}

/// Narrow the requested perspective to what the caller may read. Drafts
/// need a session; anonymous published reads also skip unpublished and
/// internal documents.
pub fn scope_perspective(requested: Perspective, signed_in: bool) -> ApiResult<Perspective> {
    match (requested, signed_in) {
        (_, true) => Ok(requested),
        (Perspective::Raw, false) => Err(ApiError::Unauthorized),
        (_, false) => Ok(Perspective::Public),
    }
}

async fn query(
    State(state): State<AppState>,
    session: Option<AdminSession>,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let (query, params, requested) = parse_query_params(&raw)?;
    let perspective = scope_perspective(requested, session.is_some())?;
    let started = Instant::now();
    let result = state.client().query_value(&query, &params, perspective).await?;
    let ms = started.elapsed().as_millis() as u64;
    tracing::debug!(ms, "query served");
    Ok(Json(json!({ "ms": ms, "query": query, "result": result })))
}

fn sse_event(event: &ContentEvent) -> Event {
    let name = match event {
        ContentEvent::Welcome => "welcome",
        ContentEvent::Mutation(_) => "mutation",
        ContentEvent::Reconnect => "reconnect",
    };
    Event::default()
        .event(name)
        .data(serde_json::to_string(event).unwrap_or_default())
}

/// Server-sent stream of content events: `welcome` first, then one
/// `mutation` per changed document. A subscriber that falls behind gets
/// `reconnect` and the stream ends.
async fn listen(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.event_bus().subscribe();
    tracing::info!(subscribers = state.event_bus().subscriber_count(), "listener connected");

    let welcome = stream::once(async { Ok(sse_event(&ContentEvent::Welcome)) });
    let updates = stream::unfold(Some(receiver), |receiver| async move {
        let mut receiver = receiver?;
        match receiver.recv().await {
            Ok(event) => Some((Ok(sse_event(&event)), Some(receiver))),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "listener lagged, asking it to reconnect");
                Some((Ok(sse_event(&ContentEvent::Reconnect)), None))
            }
            Err(RecvError::Closed) => None,
        }
    });

    Sse::new(welcome.chain(updates)).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn params_are_json_or_strings() {
        let (query, params, perspective) = parse_query_params(&raw(&[
            ("query", "*[_type == $type][0...$n]"),
            ("$type", "\"venue\""),
            ("$n", "3"),
            ("$city", "madrid"),
        ]))
        .unwrap();
        assert_eq!(query, "*[_type == $type][0...$n]");
        assert_eq!(params, json!({"type": "venue", "n": 3, "city": "madrid"}));
        assert_eq!(perspective, Perspective::Published);
    }

    #[test]
    fn missing_query_or_bad_perspective_is_rejected() {
        assert!(matches!(parse_query_params(&raw(&[])), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            parse_query_params(&raw(&[("query", "*"), ("perspective", "future")])),
            Err(ApiError::BadRequest(_))
        ));
        let (_, _, p) = parse_query_params(&raw(&[("query", "*"), ("perspective", "raw")])).unwrap();
        assert_eq!(p, Perspective::Raw);
    }

    #[test]
    fn anonymous_callers_get_the_public_perspective() {
        assert!(matches!(
            scope_perspective(Perspective::Raw, false),
            Err(ApiError::Unauthorized)
        ));
        assert_eq!(scope_perspective(Perspective::Published, false).unwrap(), Perspective::Public);
        assert_eq!(scope_perspective(Perspective::Raw, true).unwrap(), Perspective::Raw);
        assert_eq!(scope_perspective(Perspective::Published, true).unwrap(), Perspective::Published);
    }
}
