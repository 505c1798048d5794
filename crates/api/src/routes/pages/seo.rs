use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use sobremesa_core::queries::{self, SitemapEntry};

use crate::error::PageResult;
use crate::render::escape;
use crate::state::AppState;

pub fn sitemap_xml(base_url: &str, entries: &[SitemapEntry]) -> String {
    let urls: String = entries
        .iter()
        .map(|entry| {
            let lastmod = entry
                .updated_at
                .map(|d| format!("<lastmod>{}</lastmod>", d.format("%Y-%m-%d")))
                .unwrap_or_default();
            format!(
                "  <url><loc>{}</loc>{lastmod}<priority>{:.1}</priority></url>\n",
                escape(&sobremesa_core::content::urls::absolute(base_url, &entry.path)),
                entry.priority
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{urls}</urlset>\n"
    )
}

pub async fn sitemap(State(state): State<AppState>) -> PageResult<impl IntoResponse> {
    let entries = queries::sitemap_entries(state.client()).await?;
    tracing::debug!(urls = entries.len(), "sitemap generated");
    Ok((
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        sitemap_xml(&state.config().public_base_url, &entries),
    ))
}

pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    let body = format!(
        "User-agent: *\nAllow: /\nDisallow: /dashboard\nDisallow: /buscar\n\nSitemap: {}\n",
        state.config().absolute_url("/sitemap.xml")
    );
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}
