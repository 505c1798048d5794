pub mod dashboard;
pub mod health;
pub mod pages;
pub mod query;

use axum::Router;
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.config().assets_dir);

    Router::new()
        .merge(health::routes())
        .merge(query::routes())
        .merge(dashboard::routes(&state))
        .merge(pages::routes())
        .nest_service("/assets", assets)
        .fallback(pages::not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use sobremesa_core::events::EventBus;
    use sobremesa_core::Store;
    use tower::ServiceExt;

    use crate::config::AppConfig;

    fn app() -> Router {
        build_router(AppState::new(Store::memory(), AppConfig::default(), EventBus::new(8)))
    }

    async fn get(path: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn empty_store_still_serves_the_shell() {
        let (status, body) = get("/robots.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Sitemap: http://localhost:3030/sitemap.xml"));

        let (status, _) = get("/v1/ping").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_city_is_not_found() {
        let (status, body) = get("/zaragoza").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("noindex"));
    }

    #[tokio::test]
    async fn dashboard_api_is_guarded() {
        let (status, _) = get("/dashboard/api/stats").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
