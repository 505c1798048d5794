//! Public HTML pages.

mod blog;
mod city;
mod editorial;
mod home;
mod search;
mod seo;

use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use sobremesa_core::content::EditorialKind;
use sobremesa_core::seo::PageMeta;

use crate::error::PageError;
use crate::render::{render_page, Page};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let mut router = Router::new()
        .route("/", get(home::home))
        .route("/blog", get(blog::index))
        .route("/blog/{slug}", get(blog::post))
        .route("/buscar", get(search::search_page))
        .route("/sitemap.xml", get(seo::sitemap))
        .route("/robots.txt", get(seo::robots))
        .route("/{city}", get(city::city))
        .route("/{city}/venue/{slug}", get(city::venue))
        .route("/{city}/reviews", get(city::reviews))
        .route("/{city}/reviews/review/{slug}", get(city::review));

    for kind in EditorialKind::ALL {
        router = router.route(&format!("/{}/{{slug}}", kind.segment()), editorial::handler(kind));
    }
    router
}

/// Fallback for unmatched paths.
pub async fn not_found() -> Response {
    PageError::NotFound.into_response()
}

fn page_html(state: &AppState, page: &Page) -> Html<String> {
    Html(render_page(page, &state.config().site_name))
}

fn meta(state: &AppState, title: &str, description: &str, path: &str) -> PageMeta {
    let config = state.config();
    PageMeta::new(title, description, &config.site_name, config.absolute_url(path))
}

/// Absolute URL for an image that may be stored as a site path.
fn image_url(state: &AppState, url: Option<&str>) -> Option<String> {
    url.map(|u| state.site().url(u))
}

/// Lenient integer query parameter: anything unparsable counts as absent.
fn int_param(value: Option<&str>) -> i64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}
